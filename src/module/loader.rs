//! Package resolution via the Go toolchain
//!
//! `go list -json <module>/...` prints one JSON object per package, back to
//! back. We decode that stream and keep only what the import graph needs.

use super::RawPackage;
use super::manifest::read_module_path;
use crate::core::error::{AffectedResult, ConfigError, ResolveError};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Resolves the packages of one or more modules.
pub trait PackageLoader {
  fn load(&self, modules: &[String]) -> AffectedResult<Vec<RawPackage>>;

  /// Path of the module being analyzed when none is given explicitly.
  fn current_module_path(&self) -> AffectedResult<String>;
}

/// The subset of `go list -json` output we read.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GoListPackage {
  import_path: String,
  #[serde(default)]
  dir: String,
  #[serde(default)]
  imports: Vec<String>,
}

/// Loader backed by `go list`, run from the repository root.
pub struct GoListLoader {
  work_dir: PathBuf,
}

impl GoListLoader {
  pub fn new(work_dir: &Path) -> Self {
    Self {
      work_dir: work_dir.to_path_buf(),
    }
  }

  fn go_cmd(&self) -> Command {
    let mut cmd = Command::new("go");
    cmd.current_dir(&self.work_dir);
    cmd
  }
}

impl PackageLoader for GoListLoader {
  fn load(&self, modules: &[String]) -> AffectedResult<Vec<RawPackage>> {
    if modules.is_empty() {
      return Ok(vec![]);
    }

    let patterns: Vec<String> = modules.iter().map(|m| format!("{}/...", m)).collect();
    let command = format!("go list -json {}", patterns.join(" "));
    tracing::debug!(%command, "loading packages");

    let output = self
      .go_cmd()
      .args(["list", "-json"])
      .args(&patterns)
      .output()
      .map_err(|source| ResolveError::Spawn {
        command: command.clone(),
        source,
      })?;

    if !output.status.success() {
      return Err(
        ResolveError::CommandFailed {
          command,
          stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }
        .into(),
      );
    }

    let packages = parse_go_list(&output.stdout).map_err(|reason| ResolveError::MalformedOutput {
      command: command.clone(),
      reason,
    })?;
    tracing::debug!(count = packages.len(), "loaded packages");
    Ok(packages)
  }

  fn current_module_path(&self) -> AffectedResult<String> {
    read_module_path(&self.work_dir)?.ok_or_else(|| {
      ConfigError::ModuleNotFound {
        root: self.work_dir.clone(),
      }
      .into()
    })
  }
}

/// Decode a stream of concatenated `go list -json` objects.
fn parse_go_list(stdout: &[u8]) -> Result<Vec<RawPackage>, String> {
  serde_json::Deserializer::from_slice(stdout)
    .into_iter::<GoListPackage>()
    .map(|item| {
      let pkg = item.map_err(|e| e.to_string())?;
      Ok(RawPackage {
        id: pkg.import_path,
        dir: canonical_dir(&pkg.dir),
        imports: pkg.imports,
      })
    })
    .collect()
}

/// Resolve symlinks so directories compare equal to paths reported by git.
fn canonical_dir(dir: &str) -> PathBuf {
  let path = PathBuf::from(dir);
  if dir.is_empty() {
    return path;
  }
  std::fs::canonicalize(&path).unwrap_or(path)
}
