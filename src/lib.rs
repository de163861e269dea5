//! Layerset - layered settings resolution across user and project scopes.
//!
//! This library provides the core functionality for layerset, including:
//! - Locating per-user and per-project settings files
//! - Reading named sections out of XML settings documents
//! - Merging scope overrides over declared defaults in priority order
//! - Explicit editing of scope files
//!
//! A missing or corrupt settings file never fails resolution. Each failure is
//! reported to an injected [`diagnostics::DiagnosticSink`] and that scope
//! simply contributes no overrides.
//!
//! # Example
//!
//! ```no_run
//! use layerset_cli::config::{
//!     Property, ResolutionContext, ScopePaths, SettingsProvider, ValueKind,
//! };
//!
//! let provider = SettingsProvider::new(ScopePaths::default());
//! let properties = vec![Property::new("Indent", "4", ValueKind::Integer)];
//! let ctx = ResolutionContext::new("CodeMaid.Properties.Settings")
//!     .with_project_root("/work/my-solution");
//!
//! for value in provider.resolve_all(&properties, &ctx).unwrap() {
//!     println!("{} = {} (from {})", value.name, value.serialized, value.source);
//! }
//! ```

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod manifest;

pub use error::{ParseError, Result, SettingsError};
