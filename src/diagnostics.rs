//! Diagnostics for settings sources that failed to load.
//!
//! Resolution never fails because of a bad source. Instead each failure is
//! handed to a [`DiagnosticSink`] injected into the provider, and the source
//! contributes no overrides.

use crate::error::SettingsError;
use std::sync::Mutex;

/// Receives every source failure swallowed during resolution.
pub trait DiagnosticSink: Send + Sync {
	fn report(&self, message: &str, failure: &SettingsError);
}

/// Default sink: forwards failures to `tracing`.
///
/// Absent files and sections are expected and logged at debug level; anything
/// else is a warning.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
	fn report(&self, message: &str, failure: &SettingsError) {
		if failure.is_not_found() {
			tracing::debug!(error = %failure, "{}", message);
		} else {
			tracing::warn!(error = %failure, cause = ?std::error::Error::source(failure), "{}", message);
		}
	}
}

/// A failure captured by [`CollectingSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
	pub message: String,

	/// Display text of the failure and its source chain.
	pub error: String,

	pub not_found: bool,
}

/// Sink that keeps every report in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
	reports: Mutex<Vec<Report>>,
}

impl CollectingSink {
	/// Snapshot of everything reported so far.
	pub fn reports(&self) -> Vec<Report> {
		self.reports
			.lock()
			.map(|reports| reports.clone())
			.unwrap_or_default()
	}

	pub fn is_empty(&self) -> bool {
		self.reports().is_empty()
	}
}

impl DiagnosticSink for CollectingSink {
	fn report(&self, message: &str, failure: &SettingsError) {
		let mut error = failure.to_string();
		let mut cause = std::error::Error::source(failure);
		while let Some(inner) = cause {
			error.push_str(": ");
			error.push_str(&inner.to_string());
			cause = inner.source();
		}

		if let Ok(mut reports) = self.reports.lock() {
			reports.push(Report {
				message: message.to_string(),
				error,
				not_found: failure.is_not_found(),
			});
		}
	}
}
