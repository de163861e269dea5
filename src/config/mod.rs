//! Settings resolution for layerset.
//!
//! This module handles:
//! - Scope file locations
//! - Settings document parsing and section lookup
//! - Layered resolution of property values
//! - Explicit editing of scope files

pub mod cascade;
pub mod parser;
pub mod paths;
pub mod types;
pub mod writer;

pub use cascade::{SettingsProvider, apply_override, resolve_property};
pub use parser::{parse_document, read_document, read_section, read_section_or_empty};
pub use paths::ScopePaths;
pub use types::{
	Layer, Mapping, Property, ResolutionContext, ResolvedValue, Scope, Section, SerializeAs,
	SerializedValue, SettingEntry, SourceDocument, TypedValue, ValueKind,
};
pub use writer::{remove_override, save_document, write_override};
