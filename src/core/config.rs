//! Run configuration
//!
//! Built once per invocation from, in increasing precedence: built-in
//! defaults, an optional `affected.toml`, and command-line flags. The result
//! is immutable and passed by reference into the run.

use crate::core::error::{AffectedError, AffectedResult, ConfigError, ResultExt};
use crate::glob::{FileFilter, GlobSet, exclude_default, include_default};
use crate::graph::GroupRule;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Revision A when none is given
pub const DEFAULT_BASE: &str = "origin/master";
/// Revision B when none is given
pub const DEFAULT_HEAD: &str = "HEAD";

/// Serialization of the result
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
  Text,
  /// Pretty printed, two-space indentation
  #[default]
  Json,
  JsonMinified,
}

impl FromStr for OutputFormat {
  type Err = AffectedError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "text" => Ok(Self::Text),
      "json" => Ok(Self::Json),
      "json-minified" => Ok(Self::JsonMinified),
      _ => Err(AffectedError::UnsupportedFormat { format: s.to_string() }),
    }
  }
}

/// Contents of `affected.toml`. Every field is optional.
///
/// ```toml
/// base = "origin/main"
/// format = "text"
/// include = ["/**/*.proto"]
/// exclude = ["/**/testdata/**"]
///
/// [group]
/// pkg_prefix = "example.com/mono/services"
/// after = 1
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
  #[serde(default)]
  pub include: Vec<String>,
  #[serde(default)]
  pub exclude: Vec<String>,
  /// Replace the default include globs instead of appending to them
  #[serde(default)]
  pub override_include: bool,
  /// Replace the default exclude globs instead of appending to them
  #[serde(default)]
  pub override_exclude: bool,
  pub format: Option<String>,
  pub module: Option<String>,
  pub base: Option<String>,
  pub head: Option<String>,
  pub group: Option<GroupConfig>,
}

/// `[group]` table, used by the `group` subcommand
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupConfig {
  pub pkg_prefix: Option<String>,
  pub after: Option<usize>,
}

impl FileConfig {
  /// Find config file in search order: affected.toml, .affected.toml, .config/affected.toml
  pub fn find_config_path(path: &Path) -> Option<PathBuf> {
    let candidates = [
      path.join("affected.toml"),
      path.join(".affected.toml"),
      path.join(".config").join("affected.toml"),
    ];

    candidates.into_iter().find(|p| p.exists())
  }

  /// Load the config file under `path`, or defaults when there is none.
  pub fn load(path: &Path) -> AffectedResult<Self> {
    let Some(config_path) = Self::find_config_path(path) else {
      return Ok(Self::default());
    };

    let content = fs::read_to_string(&config_path)
      .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
    let config = toml_edit::de::from_str(&content).map_err(|e| ConfigError::Invalid {
      path: config_path.clone(),
      reason: e.to_string(),
    })?;

    tracing::debug!(path = %config_path.display(), "loaded config file");
    Ok(config)
  }
}

/// Values given on the command line; `None`/empty means not given.
#[derive(Debug, Clone, Default)]
pub struct CliOptions {
  pub base: Option<String>,
  pub head: Option<String>,
  pub format: Option<String>,
  pub module: Option<String>,
  pub include: Vec<String>,
  pub exclude: Vec<String>,
  pub override_include: bool,
  pub override_exclude: bool,
  pub discard: bool,
  /// Set when the `group` subcommand runs
  pub group: Option<GroupOptions>,
}

#[derive(Debug, Clone, Default)]
pub struct GroupOptions {
  pub pkg_prefix: Option<String>,
  pub after: Option<usize>,
}

/// Immutable configuration of one run.
#[derive(Debug, Clone)]
pub struct AffectedConfig {
  /// Directory the tool runs in; git and `go list` start here
  pub root: PathBuf,
  pub base: String,
  pub head: String,
  pub format: OutputFormat,
  /// Explicit module path; read from `go.mod` when absent
  pub module: Option<String>,
  pub filter: FileFilter,
  pub group: Option<GroupRule>,
  pub discard: bool,
}

impl AffectedConfig {
  /// Merge file and command-line values over the defaults.
  ///
  /// Validates the output format, then glob patterns, then the grouping
  /// rule, before anything touches git or the Go toolchain.
  pub fn resolve(root: &Path, file: FileConfig, cli: CliOptions) -> AffectedResult<Self> {
    let format_name = cli.format.or(file.format).unwrap_or_else(|| "json".to_string());
    let format = format_name.parse::<OutputFormat>()?;

    let include = merge_globs(
      include_default(),
      file.include,
      cli.include,
      cli.override_include || file.override_include,
    );
    let exclude = merge_globs(
      exclude_default(),
      file.exclude,
      cli.exclude,
      cli.override_exclude || file.override_exclude,
    );
    let filter = FileFilter::new(GlobSet::new(&include)?, GlobSet::new(&exclude)?);

    let group = match cli.group {
      Some(opts) => {
        let file_group = file.group.unwrap_or_default();
        let prefix = opts.pkg_prefix.or(file_group.pkg_prefix);
        let after = opts.after.or(file_group.after).unwrap_or(0);
        Some(GroupRule::from_options(prefix.as_deref(), after)?)
      }
      None => None,
    };

    let config = Self {
      root: root.to_path_buf(),
      base: cli.base.or(file.base).unwrap_or_else(|| DEFAULT_BASE.to_string()),
      head: cli.head.or(file.head).unwrap_or_else(|| DEFAULT_HEAD.to_string()),
      format,
      module: cli.module.or(file.module),
      filter,
      group,
      discard: cli.discard,
    };

    tracing::debug!(
      base = %config.base,
      head = %config.head,
      format = ?config.format,
      include = ?include,
      exclude = ?exclude,
      "resolved configuration"
    );
    Ok(config)
  }
}

/// Defaults followed by file then CLI patterns, or just the extras when overriding.
///
/// An override without any extra patterns keeps the defaults.
fn merge_globs(defaults: Vec<String>, file: Vec<String>, cli: Vec<String>, replace: bool) -> Vec<String> {
  let has_extras = !file.is_empty() || !cli.is_empty();
  let mut patterns = if replace && has_extras { Vec::new() } else { defaults };
  patterns.extend(file);
  patterns.extend(cli);
  patterns
}
