use crate::config::types::{
	Mapping, Section, SerializeAs, SerializedValue, SettingEntry, SourceDocument,
};
use crate::diagnostics::DiagnosticSink;
use crate::error::{ParseError, Result, SettingsError};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::path::Path;

/// Element holding the named sections.
pub const USER_SETTINGS_GROUP: &str = "userSettings";

const SETTING: &[u8] = b"setting";
const VALUE: &[u8] = b"value";

type ParseResult<T> = std::result::Result<T, ParseError>;

/// Parse a settings document from a string (useful for testing).
///
/// Only the `userSettings` group under the root element is kept. Other
/// elements are skipped.
pub fn parse_document(xml: &str) -> ParseResult<SourceDocument> {
	let mut reader = Reader::from_str(xml.trim_start_matches('\u{feff}'));
	reader.config_mut().trim_text(true);

	let mut doc = SourceDocument::default();
	let mut seen_root = false;

	loop {
		match reader.read_event()? {
			Event::Start(_) | Event::Empty(_) if seen_root => {
				return Err(malformed("document has more than one root element"));
			}
			Event::Start(_) => {
				seen_root = true;
				parse_root(&mut reader, &mut doc)?;
			}
			Event::Empty(_) => seen_root = true,
			Event::Eof => break,
			_ => {}
		}
	}

	if !seen_root {
		return Err(malformed("document has no root element"));
	}

	Ok(doc)
}

fn parse_root(reader: &mut Reader<&[u8]>, doc: &mut SourceDocument) -> ParseResult<()> {
	loop {
		match reader.read_event()? {
			Event::Start(e) if is_user_settings(&e) => {
				let sections = doc.user_settings.get_or_insert_with(Vec::new);
				parse_group(reader, sections)?;
			}
			Event::Empty(e) if is_user_settings(&e) => {
				if doc.user_settings.is_none() {
					doc.user_settings = Some(Vec::new());
				}
			}
			Event::Start(e) => {
				reader.read_to_end(e.name())?;
			}
			Event::End(_) => return Ok(()),
			Event::Eof => return Err(unexpected_eof()),
			_ => {}
		}
	}
}

fn parse_group(reader: &mut Reader<&[u8]>, sections: &mut Vec<Section>) -> ParseResult<()> {
	loop {
		match reader.read_event()? {
			Event::Start(e) => {
				let section = parse_section(reader, element_name(&e))?;
				sections.push(section);
			}
			Event::Empty(e) => sections.push(Section::new(element_name(&e))),
			Event::End(_) => return Ok(()),
			Event::Eof => return Err(unexpected_eof()),
			_ => {}
		}
	}
}

fn parse_section(reader: &mut Reader<&[u8]>, name: String) -> ParseResult<Section> {
	let mut section = Section::new(name);

	loop {
		match reader.read_event()? {
			Event::Start(e) if e.local_name().as_ref() == SETTING => {
				let (name, format) = setting_attributes(&e)?;
				let text = parse_value(reader, &name)?;
				let text = match format {
					SerializeAs::Xml => text.trim().to_string(),
					SerializeAs::String => text,
				};
				section.entries.push(SettingEntry {
					name,
					value: SerializedValue::raw(text, format),
				});
			}
			Event::Empty(e) if e.local_name().as_ref() == SETTING => {
				let (name, _) = setting_attributes(&e)?;
				return Err(missing_value(&name));
			}
			Event::Start(e) => {
				reader.read_to_end(e.name())?;
			}
			Event::End(_) => return Ok(section),
			Event::Eof => return Err(unexpected_eof()),
			_ => {}
		}
	}
}

/// Read the raw inner markup of a setting's `<value>` element.
fn parse_value(reader: &mut Reader<&[u8]>, setting: &str) -> ParseResult<String> {
	let mut value = None;

	loop {
		match reader.read_event()? {
			Event::Start(e) if e.local_name().as_ref() == VALUE => {
				// Consumes through the matching end tag.
				let text = reader.read_text(e.name())?;
				if value.is_none() {
					value = Some(text.into_owned());
				}
			}
			Event::Empty(e) if e.local_name().as_ref() == VALUE => {
				if value.is_none() {
					value = Some(String::new());
				}
			}
			Event::Start(e) => {
				reader.read_to_end(e.name())?;
			}
			Event::End(_) => break,
			Event::Eof => return Err(unexpected_eof()),
			_ => {}
		}
	}

	value.ok_or_else(|| missing_value(setting))
}

fn setting_attributes(e: &BytesStart) -> ParseResult<(String, SerializeAs)> {
	let mut name = None;
	let mut format = SerializeAs::default();

	for attr in e.attributes() {
		let attr = attr?;
		let raw = String::from_utf8_lossy(&attr.value);
		let value = quick_xml::escape::unescape(&raw)?;
		match attr.key.local_name().as_ref() {
			b"name" => name = Some(value.into_owned()),
			b"serializeAs" => format = SerializeAs::from_attr(&value),
			_ => {}
		}
	}

	match name {
		Some(name) if !name.is_empty() => Ok((name, format)),
		_ => Err(malformed("setting element has no name attribute")),
	}
}

fn is_user_settings(e: &BytesStart) -> bool {
	e.local_name().as_ref() == USER_SETTINGS_GROUP.as_bytes()
}

fn element_name(e: &BytesStart) -> String {
	String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

fn malformed(reason: &str) -> ParseError {
	ParseError::Malformed(reason.to_string())
}

fn unexpected_eof() -> ParseError {
	malformed("unexpected end of document")
}

fn missing_value(setting: &str) -> ParseError {
	ParseError::Malformed(format!("setting '{}' has no value element", setting))
}

/// Read and parse a settings file.
///
/// The file handle is released before parsing starts.
pub fn read_document(path: &Path) -> Result<SourceDocument> {
	let bytes = std::fs::read(path).map_err(|source| SettingsError::SourceUnavailable {
		path: path.to_path_buf(),
		source,
	})?;

	let corrupt = |source| SettingsError::SourceCorrupt {
		path: path.to_path_buf(),
		source,
	};
	let content = String::from_utf8(bytes).map_err(|_| corrupt(malformed("not valid UTF-8")))?;
	parse_document(&content).map_err(corrupt)
}

/// Read one section of a settings file as a flat mapping.
///
/// An absent or empty path or section name yields an empty mapping without
/// touching the filesystem.
pub fn read_section(path: Option<&Path>, section: Option<&str>) -> Result<Mapping> {
	let path = path.filter(|path| !path.as_os_str().is_empty());
	let section = section.filter(|section| !section.is_empty());
	let (Some(path), Some(section)) = (path, section) else {
		return Ok(Mapping::new());
	};

	let doc = read_document(path)?;

	if doc.user_settings.is_none() {
		return Err(SettingsError::SectionNotFound {
			path: path.to_path_buf(),
			section: USER_SETTINGS_GROUP.to_string(),
		});
	}

	doc.section(section)
		.map(Section::to_mapping)
		.ok_or_else(|| SettingsError::SectionNotFound {
			path: path.to_path_buf(),
			section: section.to_string(),
		})
}

/// Like [`read_section`], but reports failures to `sink` and returns an empty mapping.
pub fn read_section_or_empty(
	path: Option<&Path>,
	section: Option<&str>,
	sink: &dyn DiagnosticSink,
) -> Mapping {
	match read_section(path, section) {
		Ok(mapping) => mapping,
		Err(err) => {
			sink.report("Ignoring settings source", &err);
			Mapping::new()
		}
	}
}
