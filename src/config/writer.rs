//! Explicit editing of scope files.
//!
//! Resolution never writes. These functions are the only way overrides get
//! persisted, and they always rewrite the whole file in canonical form.

use crate::config::parser::{USER_SETTINGS_GROUP, read_document};
use crate::config::types::{SerializedValue, SourceDocument};
use crate::error::{Result, SettingsError};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::io;
use std::path::Path;

const ROOT: &str = "configuration";

/// Render a document as indented XML.
///
/// Only the `userSettings` group is written; elements skipped while parsing
/// are not preserved.
pub fn render_document(doc: &SourceDocument) -> io::Result<String> {
	let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);

	writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
	writer.write_event(Event::Start(BytesStart::new(ROOT)))?;
	writer.write_event(Event::Start(BytesStart::new(USER_SETTINGS_GROUP)))?;

	for section in doc.sections() {
		writer.write_event(Event::Start(BytesStart::new(section.name.as_str())))?;

		for entry in &section.entries {
			let setting = BytesStart::new("setting").with_attributes([
				("name", entry.name.as_str()),
				("serializeAs", entry.value.format.as_str()),
			]);
			writer.write_event(Event::Start(setting))?;

			if entry.value.text.is_empty() {
				writer.write_event(Event::Empty(BytesStart::new("value")))?;
			} else {
				// Serialized text is already escaped markup.
				writer.write_event(Event::Start(BytesStart::new("value")))?;
				writer.write_event(Event::Text(BytesText::from_escaped(
					entry.value.text.as_str(),
				)))?;
				writer.write_event(Event::End(BytesEnd::new("value")))?;
			}

			writer.write_event(Event::End(BytesEnd::new("setting")))?;
		}

		writer.write_event(Event::End(BytesEnd::new(section.name.as_str())))?;
	}

	writer.write_event(Event::End(BytesEnd::new(USER_SETTINGS_GROUP)))?;
	writer.write_event(Event::End(BytesEnd::new(ROOT)))?;

	let mut xml = String::from_utf8(writer.into_inner()).map_err(io::Error::other)?;
	xml.push('\n');
	Ok(xml)
}

/// Write a document to `path`, creating parent directories as needed.
pub fn save_document(path: &Path, doc: &SourceDocument) -> Result<()> {
	let write_failed = |source| SettingsError::WriteFailed {
		path: path.to_path_buf(),
		source,
	};

	let xml = render_document(doc).map_err(write_failed)?;
	if let Some(parent) = path.parent()
		&& !parent.as_os_str().is_empty()
	{
		std::fs::create_dir_all(parent).map_err(write_failed)?;
	}
	std::fs::write(path, xml).map_err(write_failed)?;

	tracing::debug!(path = %path.display(), "Wrote settings file");
	Ok(())
}

/// Load `path`, treating a missing file as an empty document.
///
/// A corrupt file is an error so that it is never overwritten.
pub fn load_or_default(path: &Path) -> Result<SourceDocument> {
	match read_document(path) {
		Ok(doc) => Ok(doc),
		Err(err) if err.is_not_found() => Ok(SourceDocument::default()),
		Err(err) => Err(err),
	}
}

/// Check that a section name can be written as an element name.
pub fn validate_section_name(section: &str) -> Result<()> {
	let mut chars = section.chars();
	let valid = match chars.next() {
		Some(first) if first.is_alphabetic() || first == '_' => {
			chars.all(|c| c.is_alphanumeric() || matches!(c, '.' | '_' | '-'))
		}
		_ => false,
	};

	if valid {
		Ok(())
	} else {
		Err(SettingsError::InvalidSectionName {
			section: section.to_string(),
		})
	}
}

/// Set one override in a scope file.
pub fn write_override(
	path: &Path,
	section: &str,
	name: &str,
	value: SerializedValue,
) -> Result<()> {
	validate_section_name(section)?;

	let mut doc = load_or_default(path)?;
	doc.section_mut(section).set(name, value);
	save_document(path, &doc)
}

/// Remove one override from a scope file.
///
/// Returns whether anything was removed. The file is left untouched when
/// there was nothing to remove.
pub fn remove_override(path: &Path, section: &str, name: &str) -> Result<bool> {
	let mut doc = load_or_default(path)?;

	let removed = doc
		.user_settings
		.as_mut()
		.and_then(|sections| sections.iter_mut().find(|s| s.name == section))
		.is_some_and(|s| s.remove(name));

	if removed {
		save_document(path, &doc)?;
	}
	Ok(removed)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::parser::{parse_document, read_section};
	use crate::config::types::SerializeAs;

	#[test]
	fn test_render_parses_back() {
		let mut doc = SourceDocument::default();
		doc.section_mut("CodeMaid.Properties.Settings")
			.set("Indent", SerializedValue::from_plain("8"));
		doc.section_mut("CodeMaid.Properties.Settings")
			.set("Banner", SerializedValue::from_plain("a < b"));
		doc.section_mut("CodeMaid.Properties.Settings").set(
			"Patterns",
			SerializedValue::raw("<ArrayOfString><string>*.cs</string></ArrayOfString>", SerializeAs::Xml),
		);
		doc.section_mut("CodeMaid.Properties.Settings")
			.set("Empty", SerializedValue::from_plain(""));

		let xml = render_document(&doc).unwrap();
		assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));
		assert!(xml.contains("<setting name=\"Indent\" serializeAs=\"String\">"));

		let parsed = parse_document(&xml).unwrap();
		assert_eq!(parsed, doc);
	}

	#[test]
	fn test_write_override_creates_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("nested/Layerset/Layerset.config");

		write_override(&path, "S", "Indent", SerializedValue::from_plain("2")).unwrap();

		let mapping = read_section(Some(&path), Some("S")).unwrap();
		assert_eq!(mapping["Indent"].text, "2");
	}

	#[test]
	fn test_write_override_keeps_other_entries() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("Layerset.config");

		write_override(&path, "S", "A", SerializedValue::from_plain("1")).unwrap();
		write_override(&path, "S", "B", SerializedValue::from_plain("2")).unwrap();
		write_override(&path, "T", "A", SerializedValue::from_plain("3")).unwrap();
		write_override(&path, "S", "A", SerializedValue::from_plain("4")).unwrap();

		let s = read_section(Some(&path), Some("S")).unwrap();
		assert_eq!(s.len(), 2);
		assert_eq!(s["A"].text, "4");
		assert_eq!(s["B"].text, "2");

		let t = read_section(Some(&path), Some("T")).unwrap();
		assert_eq!(t["A"].text, "3");
	}

	#[test]
	fn test_write_override_refuses_corrupt_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("Layerset.config");
		std::fs::write(&path, "<configuration>").unwrap();

		let err = write_override(&path, "S", "A", SerializedValue::from_plain("1")).unwrap_err();
		assert!(matches!(err, SettingsError::SourceCorrupt { .. }));
		assert_eq!(std::fs::read_to_string(&path).unwrap(), "<configuration>");
	}

	#[test]
	fn test_write_override_rejects_bad_section_name() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("Layerset.config");

		let err =
			write_override(&path, "My Settings", "A", SerializedValue::from_plain("1")).unwrap_err();
		assert!(matches!(err, SettingsError::InvalidSectionName { .. }));
		assert!(!path.exists());
	}

	#[test]
	fn test_validate_section_name() {
		assert!(validate_section_name("CodeMaid.Properties.Settings").is_ok());
		assert!(validate_section_name("_private-1").is_ok());
		assert!(validate_section_name("").is_err());
		assert!(validate_section_name("1abc").is_err());
		assert!(validate_section_name("a<b").is_err());
	}

	#[test]
	fn test_remove_override() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("Layerset.config");

		assert!(!remove_override(&path, "S", "A").unwrap());
		assert!(!path.exists());

		write_override(&path, "S", "A", SerializedValue::from_plain("1")).unwrap();
		write_override(&path, "S", "B", SerializedValue::from_plain("2")).unwrap();

		assert!(remove_override(&path, "S", "A").unwrap());
		assert!(!remove_override(&path, "S", "A").unwrap());
		assert!(!remove_override(&path, "Other", "B").unwrap());

		let s = read_section(Some(&path), Some("S")).unwrap();
		assert_eq!(s.len(), 1);
		assert!(s.contains_key("B"));
	}
}
