//! Test helpers for integration tests

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

pub const MODULE: &str = "example.com/mono";

/// A Go module in a git repository, with one commit on `main` and a `base` branch
pub struct TestWorkspace {
  _root: TempDir,
  pub path: PathBuf,
}

impl TestWorkspace {
  /// Create a module with a `lib` package and an `app` package importing it
  pub fn new() -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().to_path_buf();

    // Initialize git repo with main as default branch
    git(&path, &["init", "--initial-branch=main"])?;
    git(&path, &["config", "user.name", "Test User"])?;
    git(&path, &["config", "user.email", "test@example.com"])?;

    std::fs::write(path.join("go.mod"), format!("module {}\n\ngo 1.22\n", MODULE))?;

    let ws = Self { _root: root, path };
    ws.add_package("lib", &[])?;
    ws.add_package("app", &["lib"])?;
    ws.commit("Initial module setup")?;
    git(&ws.path, &["branch", "base"])?;

    Ok(ws)
  }

  /// Add a package directory with one source file importing `imports` (module-relative)
  pub fn add_package(&self, rel: &str, imports: &[&str]) -> Result<PathBuf> {
    let dir = self.path.join(rel);
    std::fs::create_dir_all(&dir)?;

    let name = rel.rsplit('/').next().unwrap_or(rel);
    let mut source = format!("package {}\n", name);
    if !imports.is_empty() {
      source.push_str("\nimport (\n");
      for import in imports {
        source.push_str(&format!("\t_ \"{}/{}\"\n", MODULE, import));
      }
      source.push_str(")\n");
    }
    std::fs::write(dir.join(format!("{}.go", name)), source)?;

    Ok(dir)
  }

  /// Write a file relative to the repository root
  pub fn write_file(&self, rel: &str, content: &str) -> Result<()> {
    let path = self.path.join(rel);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    Ok(())
  }

  /// Commit current changes
  pub fn commit(&self, message: &str) -> Result<String> {
    git(&self.path, &["add", "."])?;
    git(&self.path, &["commit", "-m", message])?;

    // Get the commit SHA
    let output = git(&self.path, &["rev-parse", "HEAD"])?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }
}

/// Run git command in a directory
pub fn git(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = Command::new("git")
    .current_dir(cwd)
    .args(args)
    .output()
    .context("Failed to run git command")?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    anyhow::bail!("Git command failed: git {}\n{}", args.join(" "), stderr);
  }

  Ok(output)
}

/// Run the affected binary; the caller inspects the exit status
pub fn run_affected(cwd: &Path, args: &[&str]) -> Result<Output> {
  let bin = env!("CARGO_BIN_EXE_affected");

  Command::new(bin)
    .current_dir(cwd)
    .args(args)
    .env_remove("RUST_LOG")
    .output()
    .context("Failed to run affected")
}

/// Run the affected binary and fail unless it succeeds
pub fn run_affected_ok(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = run_affected(cwd, args)?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    anyhow::bail!(
      "affected command failed: affected {}\nstdout: {}\nstderr: {}",
      args.join(" "),
      stdout,
      stderr
    );
  }

  Ok(output)
}

pub fn stdout(output: &Output) -> String {
  String::from_utf8_lossy(&output.stdout).to_string()
}

pub fn stderr(output: &Output) -> String {
  String::from_utf8_lossy(&output.stderr).to_string()
}
