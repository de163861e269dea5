use crate::error::{Result, SettingsError};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

/// Flat view of one section: property name to serialized value.
pub type Mapping = HashMap<String, SerializedValue>;

/// Target kind a property's serialized value converts into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
	#[default]
	String,
	Bool,
	Integer,
	Float,
	Xml,
}

impl ValueKind {
	pub fn as_str(&self) -> &'static str {
		match self {
			ValueKind::String => "string",
			ValueKind::Bool => "bool",
			ValueKind::Integer => "integer",
			ValueKind::Float => "float",
			ValueKind::Xml => "xml",
		}
	}
}

/// How a setting's value is stored, from the `serializeAs` attribute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SerializeAs {
	#[default]
	String,
	Xml,
}

impl SerializeAs {
	/// Attribute value as written on disk.
	pub fn as_str(&self) -> &'static str {
		match self {
			SerializeAs::String => "String",
			SerializeAs::Xml => "Xml",
		}
	}

	/// Parse the `serializeAs` attribute. Unknown formats are read as plain strings.
	pub fn from_attr(value: &str) -> Self {
		if value.eq_ignore_ascii_case("xml") {
			SerializeAs::Xml
		} else {
			SerializeAs::String
		}
	}
}

/// A value as it appears inside `<value>`: raw inner markup, still escaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializedValue {
	pub text: String,
	pub format: SerializeAs,
}

impl SerializedValue {
	/// Wrap already-serialized markup.
	pub fn raw(text: impl Into<String>, format: SerializeAs) -> Self {
		Self {
			text: text.into(),
			format,
		}
	}

	/// Serialize a plain string, escaping XML special characters.
	pub fn from_plain(text: &str) -> Self {
		Self {
			text: quick_xml::escape::escape(text).into_owned(),
			format: SerializeAs::String,
		}
	}
}

impl fmt::Display for SerializedValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.text)
	}
}

/// A declared configuration item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
	/// Unique property name, matched against `setting/@name`.
	pub name: String,

	/// Value used when no scope defines the property.
	pub default: SerializedValue,

	/// Kind the serialized value converts into.
	pub kind: ValueKind,
}

impl Property {
	pub fn new(name: impl Into<String>, default: &str, kind: ValueKind) -> Self {
		Self {
			name: name.into(),
			default: SerializedValue::from_plain(default),
			kind,
		}
	}
}

/// A source tier. Later variants take precedence over earlier ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Scope {
	/// The property's own declared default.
	Default,
	/// The host environment's default value store.
	Host,
	/// Per-user file under the local data directory.
	User,
	/// Per-project file under the project root.
	Project,
}

impl Scope {
	pub fn as_str(&self) -> &'static str {
		match self {
			Scope::Default => "default",
			Scope::Host => "host",
			Scope::User => "user",
			Scope::Project => "project",
		}
	}
}

impl fmt::Display for Scope {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// One source's overrides, tagged with the scope they came from.
#[derive(Debug, Clone)]
pub struct Layer {
	pub scope: Scope,

	/// File the overrides were read from, if the scope is file-backed.
	pub path: Option<PathBuf>,

	pub values: Mapping,
}

/// Caller-supplied context for a resolution pass.
#[derive(Debug, Clone, Default)]
pub struct ResolutionContext {
	/// Names the section to read. Required.
	pub group_name: Option<String>,

	/// Root of the open project, if any.
	pub project_root: Option<PathBuf>,
}

impl ResolutionContext {
	pub fn new(group_name: impl Into<String>) -> Self {
		Self {
			group_name: Some(group_name.into()),
			project_root: None,
		}
	}

	pub fn with_project_root(mut self, root: impl Into<PathBuf>) -> Self {
		self.project_root = Some(root.into());
		self
	}

	/// The section name derived from the group name.
	///
	/// Fails with `InvalidContext` when the group name is absent or blank.
	pub fn section_name(&self) -> Result<&str> {
		self.group_name
			.as_deref()
			.map(str::trim)
			.filter(|name| !name.is_empty())
			.ok_or(SettingsError::InvalidContext)
	}
}

/// A single `<setting>` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingEntry {
	pub name: String,
	pub value: SerializedValue,
}

/// A named group of settings inside `userSettings`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Section {
	pub name: String,
	pub entries: Vec<SettingEntry>,
}

impl Section {
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			entries: Vec::new(),
		}
	}

	/// First entry with the given name.
	pub fn get(&self, name: &str) -> Option<&SerializedValue> {
		self.entries
			.iter()
			.find(|entry| entry.name == name)
			.map(|entry| &entry.value)
	}

	/// Replace the first entry with this name, or append a new one.
	pub fn set(&mut self, name: &str, value: SerializedValue) {
		match self.entries.iter_mut().find(|entry| entry.name == name) {
			Some(entry) => entry.value = value,
			None => self.entries.push(SettingEntry {
				name: name.to_string(),
				value,
			}),
		}
	}

	/// Remove every entry with this name. Returns whether anything was removed.
	pub fn remove(&mut self, name: &str) -> bool {
		let before = self.entries.len();
		self.entries.retain(|entry| entry.name != name);
		self.entries.len() != before
	}

	/// Flatten into a mapping. The first occurrence of a duplicated name wins.
	pub fn to_mapping(&self) -> Mapping {
		let mut mapping = Mapping::with_capacity(self.entries.len());
		for entry in &self.entries {
			mapping
				.entry(entry.name.clone())
				.or_insert_with(|| entry.value.clone());
		}
		mapping
	}
}

/// A parsed settings file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceDocument {
	/// Sections of the `userSettings` group, or `None` when the group is absent.
	pub user_settings: Option<Vec<Section>>,
}

impl SourceDocument {
	pub fn section(&self, name: &str) -> Option<&Section> {
		self.user_settings
			.as_ref()?
			.iter()
			.find(|section| section.name == name)
	}

	/// Get the named section, creating it (and the group) if needed.
	pub fn section_mut(&mut self, name: &str) -> &mut Section {
		let sections = self.user_settings.get_or_insert_with(Vec::new);
		let index = match sections.iter().position(|section| section.name == name) {
			Some(index) => index,
			None => {
				sections.push(Section::new(name));
				sections.len() - 1
			}
		};
		&mut sections[index]
	}

	pub fn sections(&self) -> &[Section] {
		self.user_settings.as_deref().unwrap_or_default()
	}
}

/// A value converted into its declared kind.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
	String(String),
	Bool(bool),
	Integer(i64),
	Float(f64),
	Xml(String),
}

impl fmt::Display for TypedValue {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			TypedValue::String(s) | TypedValue::Xml(s) => f.write_str(s),
			TypedValue::Bool(b) => write!(f, "{}", b),
			TypedValue::Integer(i) => write!(f, "{}", i),
			TypedValue::Float(x) => write!(f, "{}", x),
		}
	}
}

/// The effective value of one property after a resolution pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedValue {
	pub name: String,
	pub serialized: SerializedValue,

	/// False while `serialized` still needs converting into the target kind.
	pub deserialized: bool,

	/// Scope that supplied `serialized`.
	pub source: Scope,
}

impl ResolvedValue {
	/// Start from a property's declared default.
	pub fn from_default(property: &Property) -> Self {
		Self {
			name: property.name.clone(),
			serialized: property.default.clone(),
			deserialized: false,
			source: Scope::Default,
		}
	}

	/// Convert the serialized text into `kind` and mark the value deserialized.
	pub fn deserialize(&mut self, kind: ValueKind) -> Result<TypedValue> {
		let text = self.serialized.text.as_str();
		let invalid = || SettingsError::InvalidValue {
			name: self.name.clone(),
			kind: kind.as_str(),
			value: text.to_string(),
		};

		let value = match kind {
			ValueKind::Xml => TypedValue::Xml(text.to_string()),
			ValueKind::String => {
				let unescaped = quick_xml::escape::unescape(text).map_err(|_| invalid())?;
				TypedValue::String(unescaped.into_owned())
			}
			ValueKind::Bool => {
				let trimmed = text.trim();
				if trimmed.eq_ignore_ascii_case("true") {
					TypedValue::Bool(true)
				} else if trimmed.eq_ignore_ascii_case("false") {
					TypedValue::Bool(false)
				} else {
					return Err(invalid());
				}
			}
			ValueKind::Integer => {
				TypedValue::Integer(text.trim().parse().map_err(|_| invalid())?)
			}
			ValueKind::Float => TypedValue::Float(text.trim().parse().map_err(|_| invalid())?),
		};

		self.deserialized = true;
		Ok(value)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn resolved(text: &str) -> ResolvedValue {
		ResolvedValue {
			name: "Prop".to_string(),
			serialized: SerializedValue::raw(text, SerializeAs::String),
			deserialized: false,
			source: Scope::User,
		}
	}

	#[test]
	fn test_scope_priority_order() {
		assert!(Scope::Project > Scope::User);
		assert!(Scope::User > Scope::Host);
		assert!(Scope::Host > Scope::Default);
	}

	#[test]
	fn test_section_name_requires_group() {
		let ctx = ResolutionContext::default();
		assert!(matches!(
			ctx.section_name(),
			Err(SettingsError::InvalidContext)
		));

		let ctx = ResolutionContext::new("   ");
		assert!(matches!(
			ctx.section_name(),
			Err(SettingsError::InvalidContext)
		));

		let ctx = ResolutionContext::new("CodeMaid.Properties.Settings");
		assert_eq!(ctx.section_name().unwrap(), "CodeMaid.Properties.Settings");
	}

	#[test]
	fn test_section_first_duplicate_wins() {
		let mut section = Section::new("S");
		section.entries.push(SettingEntry {
			name: "A".to_string(),
			value: SerializedValue::from_plain("first"),
		});
		section.entries.push(SettingEntry {
			name: "A".to_string(),
			value: SerializedValue::from_plain("second"),
		});

		assert_eq!(section.get("A").unwrap().text, "first");
		assert_eq!(section.to_mapping()["A"].text, "first");

		section.set("A", SerializedValue::from_plain("third"));
		assert_eq!(section.get("A").unwrap().text, "third");

		assert!(section.remove("A"));
		assert!(section.entries.is_empty());
		assert!(!section.remove("A"));
	}

	#[test]
	fn test_section_mut_creates_group() {
		let mut doc = SourceDocument::default();
		assert!(doc.section("S").is_none());

		doc.section_mut("S")
			.set("A", SerializedValue::from_plain("1"));
		doc.section_mut("S")
			.set("B", SerializedValue::from_plain("2"));

		assert_eq!(doc.sections().len(), 1);
		assert_eq!(doc.section("S").unwrap().entries.len(), 2);
	}

	#[test]
	fn test_from_plain_escapes() {
		let value = SerializedValue::from_plain("a < b & c");
		assert_eq!(value.text, "a &lt; b &amp; c");
		assert_eq!(value.format, SerializeAs::String);
	}

	#[test]
	fn test_deserialize_kinds() {
		assert_eq!(
			resolved("a &lt; b").deserialize(ValueKind::String).unwrap(),
			TypedValue::String("a < b".to_string())
		);
		assert_eq!(
			resolved("a &lt; b").deserialize(ValueKind::Xml).unwrap(),
			TypedValue::Xml("a &lt; b".to_string())
		);
		assert_eq!(
			resolved("True").deserialize(ValueKind::Bool).unwrap(),
			TypedValue::Bool(true)
		);
		assert_eq!(
			resolved(" 42 ").deserialize(ValueKind::Integer).unwrap(),
			TypedValue::Integer(42)
		);
		assert_eq!(
			resolved("1.5").deserialize(ValueKind::Float).unwrap(),
			TypedValue::Float(1.5)
		);
	}

	#[test]
	fn test_deserialize_sets_flag() {
		let mut value = resolved("8");
		assert!(!value.deserialized);
		value.deserialize(ValueKind::Integer).unwrap();
		assert!(value.deserialized);
	}

	#[test]
	fn test_deserialize_invalid_leaves_flag() {
		let mut value = resolved("eight");
		let err = value.deserialize(ValueKind::Integer).unwrap_err();
		match err {
			SettingsError::InvalidValue { name, kind, value } => {
				assert_eq!(name, "Prop");
				assert_eq!(kind, "integer");
				assert_eq!(value, "eight");
			}
			other => panic!("Expected InvalidValue error, got {other:?}"),
		}
		assert!(!value.deserialized);
	}
}
