use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use layerset_cli::SettingsError;
use layerset_cli::config::writer::validate_section_name;
use layerset_cli::config::{
	ResolutionContext, ScopePaths, SerializedValue, SettingsProvider, SourceDocument,
	read_document, remove_override, save_document, write_override,
};
use layerset_cli::manifest::parse_manifest_file;

#[derive(Parser)]
#[command(name = "layerset")]
#[command(
	author,
	version,
	about = "Layered settings resolution across user and project scope files"
)]
#[command(arg_required_else_help = true)]
struct Cli {
	/// Directory used in place of the local data directory for user settings
	#[arg(long, global = true, env = "LAYERSET_DATA_DIR", value_name = "DIR")]
	data_dir: Option<PathBuf>,

	/// Enable debug logging
	#[arg(short, long, global = true)]
	verbose: bool,

	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand)]
enum Commands {
	/// Resolve every property in a manifest and show where each value came from
	Resolve {
		/// TOML file declaring the properties
		#[arg(short, long, value_name = "FILE")]
		manifest: PathBuf,

		/// Settings group (section) name; defaults to the manifest's group
		#[arg(short, long)]
		group: Option<String>,

		/// Project root holding the project settings file
		#[arg(short, long, value_name = "DIR")]
		project: Option<PathBuf>,
	},
	/// Show the settings file location for each scope
	Paths {
		#[arg(short, long, value_name = "DIR")]
		project: Option<PathBuf>,
	},
	/// Check every scope's settings file for errors
	Validate {
		#[arg(short, long, value_name = "DIR")]
		project: Option<PathBuf>,
	},
	/// Set an override in a scope's settings file
	Set {
		#[arg(short, long)]
		group: String,

		#[arg(short, long, value_name = "DIR")]
		project: Option<PathBuf>,

		#[arg(short, long, value_enum, default_value_t = ScopeArg::User)]
		scope: ScopeArg,

		name: String,
		value: String,
	},
	/// Remove an override from a scope's settings file
	Unset {
		#[arg(short, long)]
		group: String,

		#[arg(short, long, value_name = "DIR")]
		project: Option<PathBuf>,

		#[arg(short, long, value_enum, default_value_t = ScopeArg::User)]
		scope: ScopeArg,

		name: String,
	},
	/// Create an empty project settings file
	Init {
		/// Project root; defaults to the current directory
		#[arg(short, long, value_name = "DIR")]
		project: Option<PathBuf>,

		/// Section to create in the new file
		#[arg(short, long)]
		group: Option<String>,

		/// Overwrite an existing settings file
		#[arg(long)]
		force: bool,
	},
}

#[derive(Clone, Copy, ValueEnum)]
enum ScopeArg {
	User,
	Project,
}

fn main() -> ExitCode {
	let cli = Cli::parse();
	init_logging(cli.verbose);

	match run(cli) {
		Ok(code) => code,
		Err(e) => {
			eprintln!("error: {e:?}");
			ExitCode::FAILURE
		}
	}
}

fn init_logging(verbose: bool) {
	let default_filter = if verbose {
		"layerset_cli=debug,layerset=debug"
	} else {
		"layerset_cli=warn,layerset=warn"
	};

	tracing_subscriber::registry()
		.with(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| default_filter.into()),
		)
		.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
		.init();
}

fn run(cli: Cli) -> Result<ExitCode> {
	let mut paths = ScopePaths::default();
	if let Some(data_dir) = cli.data_dir {
		paths = paths.with_data_dir(data_dir);
	}

	match cli.command {
		Commands::Resolve {
			manifest,
			group,
			project,
		} => handle_resolve(paths, &manifest, group, project),
		Commands::Paths { project } => handle_paths(&paths, project.as_deref()),
		Commands::Validate { project } => handle_validate(&paths, project.as_deref()),
		Commands::Set {
			group,
			project,
			scope,
			name,
			value,
		} => handle_set(&paths, scope, &group, project.as_deref(), &name, &value),
		Commands::Unset {
			group,
			project,
			scope,
			name,
		} => handle_unset(&paths, scope, &group, project.as_deref(), &name),
		Commands::Init {
			project,
			group,
			force,
		} => handle_init(&paths, project, group, force),
	}
}

fn handle_resolve(
	paths: ScopePaths,
	manifest_path: &Path,
	group: Option<String>,
	project: Option<PathBuf>,
) -> Result<ExitCode> {
	let manifest = parse_manifest_file(manifest_path)
		.with_context(|| format!("Failed to load manifest {}", manifest_path.display()))?;
	let properties = manifest.to_properties();

	let ctx = ResolutionContext {
		group_name: group.or(manifest.group),
		project_root: project,
	};

	let provider = SettingsProvider::new(paths);
	let mut values = provider
		.resolve_all(&properties, &ctx)
		.context("Failed to resolve settings")?;

	for (value, property) in values.iter_mut().zip(&properties) {
		match value.deserialize(property.kind) {
			Ok(typed) => println!("{} = {}  ({})", value.name, typed, value.source),
			Err(e) => {
				eprintln!("Warning: {}", e);
				println!("{} = {}  ({})", value.name, value.serialized, value.source);
			}
		}
	}

	Ok(ExitCode::SUCCESS)
}

fn handle_paths(paths: &ScopePaths, project: Option<&Path>) -> Result<ExitCode> {
	let user_path = paths.user_config_path();
	println!("User settings: {}", user_path.display());
	println!("  {}", existence(&user_path));

	match paths.project_config_path(project) {
		Some(project_path) => {
			println!("Project settings: {}", project_path.display());
			println!("  {}", existence(&project_path));
		}
		None => println!("Project settings: (no project root)"),
	}

	Ok(ExitCode::SUCCESS)
}

fn existence(path: &Path) -> &'static str {
	if path.exists() {
		"(exists)"
	} else {
		"(not found)"
	}
}

fn handle_validate(paths: &ScopePaths, project: Option<&Path>) -> Result<ExitCode> {
	let candidates = [
		Some(paths.user_config_path()),
		paths.project_config_path(project),
	];

	let mut checked = 0;
	let mut failed = false;

	for path in candidates.into_iter().flatten() {
		if !path.exists() {
			continue;
		}
		checked += 1;

		match read_document(&path) {
			Ok(doc) => println!(
				"  {} ({} sections)",
				path.display(),
				doc.sections().len()
			),
			Err(e) => {
				failed = true;
				eprintln!("Settings error: {:#}", anyhow::Error::from(e));
			}
		}
	}

	if checked == 0 {
		println!("No settings files found.");
	}

	Ok(if failed {
		ExitCode::FAILURE
	} else {
		ExitCode::SUCCESS
	})
}

fn scope_path(paths: &ScopePaths, scope: ScopeArg, project: Option<&Path>) -> Result<PathBuf> {
	match scope {
		ScopeArg::User => Ok(paths.user_config_path()),
		ScopeArg::Project => Ok(paths
			.project_config_path(project)
			.ok_or(SettingsError::ProjectRootRequired)?),
	}
}

fn section_name(group: &str) -> Result<String> {
	let ctx = ResolutionContext::new(group);
	Ok(ctx.section_name()?.to_string())
}

fn handle_set(
	paths: &ScopePaths,
	scope: ScopeArg,
	group: &str,
	project: Option<&Path>,
	name: &str,
	value: &str,
) -> Result<ExitCode> {
	let section = section_name(group)?;
	let path = scope_path(paths, scope, project)?;

	write_override(&path, &section, name, SerializedValue::from_plain(value))
		.with_context(|| format!("Failed to set {} in {}", name, path.display()))?;

	println!("Set {} in {}", name, path.display());
	Ok(ExitCode::SUCCESS)
}

fn handle_unset(
	paths: &ScopePaths,
	scope: ScopeArg,
	group: &str,
	project: Option<&Path>,
	name: &str,
) -> Result<ExitCode> {
	let section = section_name(group)?;
	let path = scope_path(paths, scope, project)?;

	let removed = remove_override(&path, &section, name)
		.with_context(|| format!("Failed to unset {} in {}", name, path.display()))?;

	if removed {
		println!("Removed {} from {}", name, path.display());
	} else {
		println!("{} is not set in {}", name, path.display());
	}
	Ok(ExitCode::SUCCESS)
}

fn handle_init(
	paths: &ScopePaths,
	project: Option<PathBuf>,
	group: Option<String>,
	force: bool,
) -> Result<ExitCode> {
	let root = match project {
		Some(root) => root,
		None => std::env::current_dir().context("Failed to get current directory")?,
	};
	let path = paths
		.project_config_path(Some(root.as_path()))
		.ok_or(SettingsError::ProjectRootRequired)?;

	if path.exists() && !force {
		anyhow::bail!(
			"{} already exists. Use --force to overwrite.",
			path.display()
		);
	}

	let mut doc = SourceDocument {
		user_settings: Some(Vec::new()),
	};
	if let Some(group) = group {
		let section = section_name(&group)?;
		validate_section_name(&section)?;
		doc.section_mut(&section);
	}

	save_document(&path, &doc).with_context(|| format!("Failed to write {}", path.display()))?;

	println!("Created {}", path.display());
	Ok(ExitCode::SUCCESS)
}
