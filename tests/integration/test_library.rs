//! Tests for the library API the binary is built on

use crate::helpers::TestWorkspace;
use affected::core::error::AffectedError;
use affected::core::vcs::{SystemGit, Vcs};
use affected::glob::{FileFilter, Glob, GlobSet, exclude_default, include_default};
use affected::graph::PackageGraph;
use affected::graph::package_graph::{WalkControl, WalkDirection};
use affected::module::RawPackage;
use anyhow::Result;
use std::path::Path;

fn default_filter() -> Result<FileFilter> {
  Ok(FileFilter::new(
    GlobSet::new(&include_default())?,
    GlobSet::new(&exclude_default())?,
  ))
}

/// cmd imports api and db, api imports db
fn service_graph() -> PackageGraph {
  PackageGraph::build(&[
    RawPackage::new("example.com/mono/db", "/repo/db", &[]),
    RawPackage::new("example.com/mono/api", "/repo/api", &["example.com/mono/db"]),
    RawPackage::new(
      "example.com/mono/cmd",
      "/repo/cmd",
      &["example.com/mono/api", "example.com/mono/db"],
    ),
  ])
}

#[test]
fn test_import_path_is_shortest() -> Result<()> {
  let graph = service_graph();
  let cmd = graph.find_by_id("example.com/mono/cmd").unwrap();
  let db = graph.find_by_id("example.com/mono/db").unwrap();

  let path = graph.import_path(cmd, db).unwrap();
  let ids: Vec<_> = path.iter().map(|p| p.id.as_str()).collect();
  assert_eq!(ids, vec!["example.com/mono/cmd", "example.com/mono/db"]);

  assert!(graph.import_path(db, cmd).is_none());
  Ok(())
}

#[test]
fn test_walk_parents_by_direction_name() -> Result<()> {
  let graph = service_graph();
  let db = graph.find(|p| p.dir == Path::new("/repo/db")).unwrap();

  let mut seen = Vec::new();
  graph.walk(db, "parents".parse::<WalkDirection>()?, |_, pkg| {
    seen.push(pkg.id.clone());
    Ok(WalkControl::Continue)
  })?;

  // cmd is reached directly and again through api
  assert_eq!(
    seen,
    vec![
      "example.com/mono/db",
      "example.com/mono/api",
      "example.com/mono/cmd",
      "example.com/mono/cmd",
    ]
  );

  let err = "sideways".parse::<WalkDirection>().unwrap_err();
  assert!(matches!(err, AffectedError::InvalidWalkDirection { direction } if direction == "sideways"));
  Ok(())
}

#[test]
fn test_glob_matches_paths() -> Result<()> {
  let glob = Glob::compile("/**/*_test.go")?;
  assert_eq!(glob.as_str(), "/**/*_test.go");
  assert!(glob.is_match_path(Path::new("/repo/lib/lib_test.go")));
  assert!(!glob.is_match_path(Path::new("/repo/lib/lib.go")));

  let set = GlobSet::new(&include_default())?;
  assert_eq!(set.patterns().count(), 3);
  assert!(set.is_match_path(Path::new("/repo/go.sum")));
  Ok(())
}

#[test]
fn test_modified_directories_from_git() -> Result<()> {
  let ws = TestWorkspace::new()?;
  ws.write_file("lib/extra.go", "package lib\n")?;
  ws.write_file("lib/lib_test.go", "package lib\n")?;
  ws.write_file("app/app.go", "package app\n")?;
  ws.write_file("docs/README.md", "docs\n")?;
  ws.commit("Touch lib, app and docs")?;

  let git = SystemGit::open(&ws.path)?;
  let dirs = git.modified_directories("base", "HEAD", &default_filter()?)?;

  let names: Vec<_> = dirs
    .iter()
    .map(|d| d.file_name().unwrap().to_string_lossy().to_string())
    .collect();
  assert_eq!(names, vec!["app", "lib"]);
  Ok(())
}
