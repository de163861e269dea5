use crate::config::types::Scope;
use std::path::{Path, PathBuf};

/// Directory created under the local data directory for user settings.
pub const DEFAULT_APP_DIR: &str = "Layerset";

/// File name shared by the user and project scopes.
pub const DEFAULT_FILE_NAME: &str = "Layerset.config";

/// Computes where each scope's settings file lives.
#[derive(Debug, Clone)]
pub struct ScopePaths {
	/// Overrides the host's local data directory.
	pub data_dir: Option<PathBuf>,
	pub app_dir: String,
	pub file_name: String,
}

impl Default for ScopePaths {
	fn default() -> Self {
		Self {
			data_dir: None,
			app_dir: DEFAULT_APP_DIR.to_string(),
			file_name: DEFAULT_FILE_NAME.to_string(),
		}
	}
}

impl ScopePaths {
	pub fn new(app_dir: impl Into<String>, file_name: impl Into<String>) -> Self {
		Self {
			data_dir: None,
			app_dir: app_dir.into(),
			file_name: file_name.into(),
		}
	}

	pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
		self.data_dir = Some(data_dir.into());
		self
	}

	/// Get the path to the user's settings file.
	///
	/// Falls back to the home directory, then the current directory, when the
	/// platform reports no local data directory.
	pub fn user_config_path(&self) -> PathBuf {
		let base = self
			.data_dir
			.clone()
			.or_else(dirs::data_local_dir)
			.or_else(dirs::home_dir)
			.unwrap_or_else(|| PathBuf::from("."));
		base.join(&self.app_dir).join(&self.file_name)
	}

	/// Get the path to the project's settings file.
	///
	/// Returns `None` when no project root is given or it is empty.
	pub fn project_config_path(&self, project_root: Option<&Path>) -> Option<PathBuf> {
		project_root
			.filter(|root| !root.as_os_str().is_empty())
			.map(|root| root.join(&self.file_name))
	}

	/// Settings file backing `scope`, if the scope is file-backed.
	pub fn path_for(&self, scope: Scope, project_root: Option<&Path>) -> Option<PathBuf> {
		match scope {
			Scope::Default | Scope::Host => None,
			Scope::User => Some(self.user_config_path()),
			Scope::Project => self.project_config_path(project_root),
		}
	}
}
