use std::path::PathBuf;

/// Library-level structured errors for layerset.
///
/// Use `thiserror` for structured errors that library consumers can match on.
/// The CLI binary wraps these with `anyhow` for rich context chains.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
	#[error("Resolution context has no group name")]
	InvalidContext,

	#[error("Settings file unavailable: {path}")]
	SourceUnavailable {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Section '{section}' not found in {path}")]
	SectionNotFound { path: PathBuf, section: String },

	#[error("Failed to parse settings file: {path}")]
	SourceCorrupt {
		path: PathBuf,
		#[source]
		source: ParseError,
	},

	#[error("Failed to read manifest: {path}")]
	ManifestRead {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to parse manifest: {path}")]
	ManifestParse {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	#[error("Property declared more than once: {name}")]
	DuplicateProperty { name: String },

	#[error("Value of '{name}' is not a valid {kind}: {value}")]
	InvalidValue {
		name: String,
		kind: &'static str,
		value: String,
	},

	#[error("Failed to write settings file: {path}")]
	WriteFailed {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Not a valid section name: {section}")]
	InvalidSectionName { section: String },

	#[error("Project scope requires a project root")]
	ProjectRootRequired,
}

impl SettingsError {
	/// Whether this error only means "nothing there", as opposed to a broken source.
	pub fn is_not_found(&self) -> bool {
		match self {
			SettingsError::SourceUnavailable { source, .. } => {
				source.kind() == std::io::ErrorKind::NotFound
			}
			SettingsError::SectionNotFound { .. } => true,
			_ => false,
		}
	}
}

/// Structural problems found while parsing a settings document.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
	#[error(transparent)]
	Xml(#[from] quick_xml::Error),

	#[error(transparent)]
	Attribute(#[from] quick_xml::events::attributes::AttrError),

	#[error(transparent)]
	Escape(#[from] quick_xml::escape::EscapeError),

	#[error("{0}")]
	Malformed(String),
}

/// Result type alias using SettingsError.
pub type Result<T> = std::result::Result<T, SettingsError>;
