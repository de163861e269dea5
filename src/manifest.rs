//! Property declarations loaded from a TOML manifest.

use crate::config::types::{Property, SerializeAs, SerializedValue, ValueKind};
use crate::error::{Result, SettingsError};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

/// Top-level manifest file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Manifest {
	/// Group (section) name used when none is given on the command line.
	#[serde(default)]
	pub group: Option<String>,

	/// Declared properties, in resolution output order.
	#[serde(default, rename = "property")]
	pub properties: Vec<PropertyDecl>,
}

/// One `[[property]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct PropertyDecl {
	pub name: String,

	/// Plain default value. For `xml` properties this is raw markup.
	#[serde(default)]
	pub default: String,

	#[serde(default)]
	pub kind: ValueKind,
}

impl PropertyDecl {
	pub fn to_property(&self) -> Property {
		let default = match self.kind {
			ValueKind::Xml => SerializedValue::raw(self.default.clone(), SerializeAs::Xml),
			_ => SerializedValue::from_plain(&self.default),
		};
		Property {
			name: self.name.clone(),
			default,
			kind: self.kind,
		}
	}
}

impl Manifest {
	/// Validate that property names are unique.
	pub fn validate(&self) -> Result<()> {
		let mut seen = HashSet::new();
		for decl in &self.properties {
			if !seen.insert(decl.name.as_str()) {
				return Err(SettingsError::DuplicateProperty {
					name: decl.name.clone(),
				});
			}
		}
		Ok(())
	}

	pub fn to_properties(&self) -> Vec<Property> {
		self.properties.iter().map(PropertyDecl::to_property).collect()
	}
}

/// Parse a manifest file from the given path.
pub fn parse_manifest_file(path: &Path) -> Result<Manifest> {
	let content = std::fs::read_to_string(path).map_err(|source| SettingsError::ManifestRead {
		path: path.to_path_buf(),
		source,
	})?;

	parse_manifest_str(&content, path)
}

/// Parse a manifest from a string (useful for testing).
pub fn parse_manifest_str(content: &str, path: &Path) -> Result<Manifest> {
	let manifest: Manifest =
		toml::from_str(content).map_err(|source| SettingsError::ManifestParse {
			path: path.to_path_buf(),
			source,
		})?;

	manifest.validate()?;

	Ok(manifest)
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::path::PathBuf;

	#[test]
	fn test_parse_empty_manifest() {
		let path = PathBuf::from("props.toml");
		let manifest = parse_manifest_str("", &path).unwrap();

		assert!(manifest.group.is_none());
		assert!(manifest.properties.is_empty());
	}

	#[test]
	fn test_parse_manifest() {
		let content = r#"
group = "CodeMaid.Properties.Settings"

[[property]]
name = "Indent"
default = "4"
kind = "integer"

[[property]]
name = "Banner"
default = "a < b"

[[property]]
name = "Patterns"
default = "<ArrayOfString />"
kind = "xml"
"#;
		let path = PathBuf::from("props.toml");
		let manifest = parse_manifest_str(content, &path).unwrap();

		assert_eq!(
			manifest.group,
			Some("CodeMaid.Properties.Settings".to_string())
		);

		let properties = manifest.to_properties();
		assert_eq!(properties.len(), 3);
		assert_eq!(properties[0].name, "Indent");
		assert_eq!(properties[0].kind, ValueKind::Integer);
		assert_eq!(properties[0].default.text, "4");

		assert_eq!(properties[1].kind, ValueKind::String);
		assert_eq!(properties[1].default.text, "a &lt; b");

		assert_eq!(properties[2].default.text, "<ArrayOfString />");
		assert_eq!(properties[2].default.format, SerializeAs::Xml);
	}

	#[test]
	fn test_duplicate_property_names() {
		let content = r#"
[[property]]
name = "Indent"

[[property]]
name = "Indent"
"#;
		let path = PathBuf::from("props.toml");
		match parse_manifest_str(content, &path).unwrap_err() {
			SettingsError::DuplicateProperty { name } => assert_eq!(name, "Indent"),
			other => panic!("Expected DuplicateProperty error, got {other:?}"),
		}
	}

	#[test]
	fn test_unknown_kind_is_parse_error() {
		let content = r#"
[[property]]
name = "Indent"
kind = "decimal"
"#;
		let path = PathBuf::from("props.toml");
		let result = parse_manifest_str(content, &path);
		assert!(matches!(result, Err(SettingsError::ManifestParse { .. })));
	}
}
