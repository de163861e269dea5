use crate::config::parser::read_section_or_empty;
use crate::config::paths::ScopePaths;
use crate::config::types::{Layer, Mapping, Property, ResolutionContext, ResolvedValue, Scope};
use crate::diagnostics::{DiagnosticSink, TracingSink};
use crate::error::Result;
use std::sync::Arc;

/// Apply one source's override to a value.
///
/// If `source` defines `current.name`, the serialized value is replaced, the
/// value is marked as needing deserialization again and `scope` is recorded
/// as its origin. Otherwise `current` is returned unchanged.
pub fn apply_override(mut current: ResolvedValue, scope: Scope, source: &Mapping) -> ResolvedValue {
	if let Some(value) = source.get(&current.name) {
		current.serialized = value.clone();
		current.deserialized = false;
		current.source = scope;
	}
	current
}

/// Resolve one property by folding layers over its declared default.
///
/// Layers must be sorted lowest priority first.
pub fn resolve_property(property: &Property, layers: &[Layer]) -> ResolvedValue {
	layers
		.iter()
		.fold(ResolvedValue::from_default(property), |value, layer| {
			apply_override(value, layer.scope, &layer.values)
		})
}

/// Resolves property values across the host, user and project scopes.
///
/// Holds no state between calls, so one provider may be shared across threads.
#[derive(Clone)]
pub struct SettingsProvider {
	paths: ScopePaths,
	sink: Arc<dyn DiagnosticSink>,
	host_defaults: Option<Mapping>,
}

impl Default for SettingsProvider {
	fn default() -> Self {
		Self::new(ScopePaths::default())
	}
}

impl std::fmt::Debug for SettingsProvider {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SettingsProvider")
			.field("paths", &self.paths)
			.field("host_defaults", &self.host_defaults)
			.finish_non_exhaustive()
	}
}

impl SettingsProvider {
	pub fn new(paths: ScopePaths) -> Self {
		Self {
			paths,
			sink: Arc::new(TracingSink),
			host_defaults: None,
		}
	}

	/// Report swallowed source failures to `sink` instead of `tracing`.
	pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
		self.sink = sink;
		self
	}

	/// Layer the host's default value store between declared defaults and the user scope.
	pub fn with_host_defaults(mut self, defaults: Mapping) -> Self {
		self.host_defaults = Some(defaults);
		self
	}

	pub fn paths(&self) -> &ScopePaths {
		&self.paths
	}

	/// Read every override layer for `ctx`, lowest priority first.
	///
	/// Fails only when the context has no group name. Unreadable sources
	/// are reported to the sink and contribute an empty layer.
	pub fn layers(&self, ctx: &ResolutionContext) -> Result<Vec<Layer>> {
		let section = ctx.section_name()?;
		let mut layers = Vec::with_capacity(3);

		if let Some(defaults) = &self.host_defaults {
			layers.push(Layer {
				scope: Scope::Host,
				path: None,
				values: defaults.clone(),
			});
		}

		for scope in [Scope::User, Scope::Project] {
			let path = self.paths.path_for(scope, ctx.project_root.as_deref());
			let values = read_section_or_empty(path.as_deref(), Some(section), self.sink.as_ref());
			tracing::debug!(
				scope = %scope,
				path = ?path,
				overrides = values.len(),
				"Loaded settings layer"
			);
			layers.push(Layer {
				scope,
				path,
				values,
			});
		}

		layers.sort_by_key(|layer| layer.scope);
		Ok(layers)
	}

	/// Resolve every property for `ctx`.
	///
	/// Returns one value per property, in input order. Only a missing group
	/// name fails the call.
	pub fn resolve_all(
		&self,
		properties: &[Property],
		ctx: &ResolutionContext,
	) -> Result<Vec<ResolvedValue>> {
		let layers = self.layers(ctx)?;

		Ok(properties
			.iter()
			.map(|property| resolve_property(property, &layers))
			.collect())
	}

	/// Write-back hook for resolved values.
	///
	/// The provider is read-only: values are never persisted from here. Use
	/// [`crate::config::writer`] to edit a scope file explicitly.
	pub fn persist(&self, values: &[ResolvedValue], ctx: &ResolutionContext) -> Result<()> {
		tracing::debug!(
			count = values.len(),
			group = ?ctx.group_name,
			"Settings provider is read-only; skipping persist"
		);
		Ok(())
	}
}
