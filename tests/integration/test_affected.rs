//! Integration tests for `affected` runs that resolve to no packages

use crate::helpers::{TestWorkspace, git, run_affected, run_affected_ok, stderr, stdout};
use anyhow::Result;

#[test]
fn test_no_changes_prints_empty_list() -> Result<()> {
  let ws = TestWorkspace::new()?;

  let output = run_affected_ok(&ws.path, &["-a", "base", "-b", "HEAD"])?;
  assert_eq!(stdout(&output), "[]\n");
  assert!(stderr(&output).is_empty(), "nothing logged by default: {}", stderr(&output));

  Ok(())
}

#[test]
fn test_non_source_change_is_ignored() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write_file("README.md", "# mono\n")?;
  ws.write_file("lib/notes.txt", "not a source file\n")?;
  ws.commit("Docs only")?;

  let output = run_affected_ok(&ws.path, &["-a", "base"])?;
  assert_eq!(stdout(&output), "[]\n");

  Ok(())
}

#[test]
fn test_test_file_change_is_excluded() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write_file("lib/lib_test.go", "package lib\n")?;
  ws.commit("Add a unit test")?;

  let output = run_affected_ok(&ws.path, &["-a", "base", "-f", "json-minified"])?;
  assert_eq!(stdout(&output), "[]\n");

  Ok(())
}

#[test]
fn test_lock_file_only_change_triggers_nothing() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write_file("go.sum", "example.org/dep v1.0.0 h1:abc=\n")?;
  ws.commit("Add go.sum")?;

  let output = run_affected_ok(&ws.path, &["-a", "base", "-f", "text"])?;
  assert_eq!(stdout(&output), "\n");

  Ok(())
}

#[test]
fn test_group_with_no_changes() -> Result<()> {
  let ws = TestWorkspace::new()?;

  let output = run_affected_ok(&ws.path, &["group", "--pkg-prefix", "example.com/mono", "--after", "1", "-a", "base"])?;
  assert_eq!(stdout(&output), "[]\n");

  Ok(())
}

#[test]
fn test_discard_writes_nothing() -> Result<()> {
  let ws = TestWorkspace::new()?;

  let output = run_affected_ok(&ws.path, &["-a", "base", "--discard"])?;
  assert!(output.stdout.is_empty());

  Ok(())
}

#[test]
fn test_explicit_module_without_go_mod() -> Result<()> {
  let ws = TestWorkspace::new()?;
  std::fs::remove_file(ws.path.join("go.mod"))?;
  ws.commit("Drop go.mod")?;
  git(&ws.path, &["branch", "-f", "base"])?;

  let failed = run_affected(&ws.path, &["-a", "base"])?;
  assert_eq!(failed.status.code(), Some(1));
  assert!(stderr(&failed).contains("Could not determine module path"));

  let output = run_affected_ok(&ws.path, &["-a", "base", "-m", "example.com/mono"])?;
  assert_eq!(stdout(&output), "[]\n");

  Ok(())
}

#[test]
fn test_config_file_sets_format() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write_file(".affected.toml", "format = \"text\"\nbase = \"base\"\n")?;

  let output = run_affected_ok(&ws.path, &[])?;
  assert_eq!(stdout(&output), "\n");

  // Flags win over the file
  let output = run_affected_ok(&ws.path, &["-f", "json"])?;
  assert_eq!(stdout(&output), "[]\n");

  Ok(())
}

#[test]
fn test_verbose_logs_to_stderr() -> Result<()> {
  let ws = TestWorkspace::new()?;

  let output = run_affected_ok(&ws.path, &["-a", "base", "-v"])?;
  assert_eq!(stdout(&output), "[]\n");
  assert!(stderr(&output).contains("DEBUG"), "expected debug logs, got: {}", stderr(&output));

  Ok(())
}

#[test]
fn test_unknown_revision_fails() -> Result<()> {
  let ws = TestWorkspace::new()?;

  let output = run_affected(&ws.path, &["-a", "no-such-revision"])?;
  assert_eq!(output.status.code(), Some(2));
  assert!(output.stdout.is_empty());
  assert!(stderr(&output).contains("git diff"));

  Ok(())
}
