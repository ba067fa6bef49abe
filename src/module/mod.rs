//! Go module model: packages, manifests, and package resolution
//!
//! - **manifest**: `go.mod` parsing and requirement diffing
//! - **loader**: resolution backend (`go list`) producing [`RawPackage`]s

pub mod loader;
pub mod manifest;

pub use loader::{GoListLoader, PackageLoader};
pub use manifest::Manifest;

use serde::Serialize;
use std::path::PathBuf;

/// A package exactly as reported by the resolution backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPackage {
  /// Import path
  pub id: String,
  /// Absolute source directory
  pub dir: PathBuf,
  /// Import paths this package imports directly
  pub imports: Vec<String>,
}

impl RawPackage {
  pub fn new(id: impl Into<String>, dir: impl Into<PathBuf>, imports: &[&str]) -> Self {
    Self {
      id: id.into(),
      dir: dir.into(),
      imports: imports.iter().map(|s| s.to_string()).collect(),
    }
  }
}

/// A build unit in the import graph. Identity is the import path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Package {
  #[serde(rename = "package")]
  pub id: String,
  #[serde(rename = "directory")]
  pub dir: PathBuf,
}

impl From<&RawPackage> for Package {
  fn from(raw: &RawPackage) -> Self {
    Self {
      id: raw.id.clone(),
      dir: raw.dir.clone(),
    }
  }
}

/// Import chain from an affected package down to the changed package it depends on.
///
/// `[p0, ..., pn]`: `p0` is the affected package, `pn` the changed one, and each
/// `p(i)` imports `p(i+1)`. Never empty, never repeats a package.
pub type ImportPath = Vec<Package>;
