//! System git backend
//!
//! Shells out to the `git` binary for every operation:
//! - `rev-parse --show-toplevel` to locate the work tree
//! - `diff --name-only a..b` for changed files
//! - `show rev:path` to read a file at a revision

use super::Vcs;
use crate::core::error::{AffectedResult, VcsError};
use crate::glob::FileFilter;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Git backend using system git (zero crate dependencies)
pub struct SystemGit {
  /// Working tree root, symlinks resolved
  work_tree: PathBuf,
}

impl SystemGit {
  /// Open the git repository containing `path`
  pub fn open(path: &Path) -> AffectedResult<Self> {
    let output = Command::new("git")
      .arg("-C")
      .arg(path)
      .args(["rev-parse", "--show-toplevel"])
      .output()
      .map_err(|source| VcsError::Spawn {
        command: "git rev-parse --show-toplevel".to_string(),
        source,
      })?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      if stderr.contains("not a git repository") {
        return Err(
          VcsError::RepoNotFound {
            path: path.to_path_buf(),
          }
          .into(),
        );
      }
      return Err(
        VcsError::CommandFailed {
          command: "git rev-parse --show-toplevel".to_string(),
          stderr: stderr.to_string(),
        }
        .into(),
      );
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let top = PathBuf::from(stdout.trim());
    let work_tree = std::fs::canonicalize(&top).unwrap_or(top);

    Ok(Self { work_tree })
  }

  /// Run git in the work tree; non-zero exit becomes [`VcsError::CommandFailed`].
  fn run(&self, args: &[&str]) -> AffectedResult<Output> {
    let command = format!("git {}", args.join(" "));
    let output = self
      .git_cmd()
      .args(args)
      .output()
      .map_err(|source| VcsError::Spawn {
        command: command.clone(),
        source,
      })?;

    if !output.status.success() {
      return Err(
        VcsError::CommandFailed {
          command,
          stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }
        .into(),
      );
    }

    Ok(output)
  }

  /// Create a git command with isolated environment
  ///
  /// - Sets working directory to the work tree
  /// - Clears environment variables
  /// - Whitelists only PATH and HOME
  /// - Disables path quoting so non-ASCII names come back verbatim
  fn git_cmd(&self) -> Command {
    let mut cmd = Command::new("git");

    cmd.arg("-C").arg(&self.work_tree);

    cmd.env_clear();
    if let Ok(path) = std::env::var("PATH") {
      cmd.env("PATH", path);
    }
    if let Ok(home) = std::env::var("HOME") {
      cmd.env("HOME", home);
    }

    cmd.arg("-c").arg("core.quotePath=false");

    cmd
  }
}

impl Vcs for SystemGit {
  fn work_tree(&self) -> &Path {
    &self.work_tree
  }

  fn modified_files(&self, a: &str, b: &str, filter: &FileFilter) -> AffectedResult<Vec<PathBuf>> {
    let range = format!("{}..{}", a, b);
    // -z: names come back verbatim and NUL-terminated, never C-quoted
    let output = self.run(&["diff", "--name-only", "-z", &range])?;

    let files: Vec<PathBuf> = String::from_utf8_lossy(&output.stdout)
      .split('\0')
      .filter(|name| !name.is_empty())
      .map(|name| self.work_tree.join(name))
      .collect();

    let filtered = filter.apply(&files);
    tracing::debug!(range = %range, changed = files.len(), kept = filtered.len(), "diffed revisions");
    Ok(filtered)
  }

  fn read_file_at_ref(&self, rev: &str, relative: &Path) -> AffectedResult<Vec<u8>> {
    let object = format!("{}:{}", rev, relative.to_string_lossy().replace('\\', "/"));

    let output = self
      .git_cmd()
      .args(["show", &object])
      .output()
      .map_err(|source| VcsError::Spawn {
        command: format!("git show {}", object),
        source,
      })?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      // File doesn't exist at this revision
      if stderr.contains("does not exist") || stderr.contains("exists on disk, but not in") {
        return Ok(vec![]);
      }
      return Err(
        VcsError::CommandFailed {
          command: format!("git show {}", object),
          stderr: stderr.to_string(),
        }
        .into(),
      );
    }

    Ok(output.stdout)
  }
}
