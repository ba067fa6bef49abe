//! Integration tests for validation that happens before git or go run

use crate::helpers::{TestWorkspace, run_affected, stderr};
use anyhow::Result;

#[test]
fn test_unsupported_format_outside_repository() -> Result<()> {
  let dir = tempfile::tempdir()?;

  let output = run_affected(dir.path(), &["-f", "yaml"])?;
  assert_eq!(output.status.code(), Some(1));
  assert!(output.stdout.is_empty());
  assert!(stderr(&output).contains("Unsupported format 'yaml'"));
  assert!(stderr(&output).contains("help: Valid formats: text, json, json-minified"));

  Ok(())
}

#[test]
fn test_invalid_glob_fails() -> Result<()> {
  let ws = TestWorkspace::new()?;

  let output = run_affected(&ws.path, &["-a", "base", "-i", "/**/{a,b"])?;
  assert_eq!(output.status.code(), Some(1));
  assert!(output.stdout.is_empty());
  assert!(stderr(&output).contains("Invalid glob pattern '/**/{a,b'"));

  Ok(())
}

#[test]
fn test_format_is_checked_before_globs() -> Result<()> {
  let dir = tempfile::tempdir()?;

  let output = run_affected(dir.path(), &["-f", "xml", "-x", "[abc"])?;
  assert!(stderr(&output).contains("Unsupported format 'xml'"));

  Ok(())
}

#[test]
fn test_group_without_prefix_fails() -> Result<()> {
  let dir = tempfile::tempdir()?;

  let output = run_affected(dir.path(), &["group", "--after", "1"])?;
  assert_eq!(output.status.code(), Some(1));
  assert!(output.stdout.is_empty());
  assert!(stderr(&output).contains("No group function provided"));

  Ok(())
}

#[test]
fn test_unknown_config_key_fails() -> Result<()> {
  let dir = tempfile::tempdir()?;
  std::fs::write(dir.path().join("affected.toml"), "fromat = \"text\"\n")?;

  let output = run_affected(dir.path(), &[])?;
  assert_eq!(output.status.code(), Some(1));
  assert!(stderr(&output).contains("affected.toml"));

  Ok(())
}
