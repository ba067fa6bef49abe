//! Affected package analysis
//!
//! Given the changes between two revisions, determine:
//! - Which packages were changed directly (triggers)
//! - Which packages import a trigger, directly or transitively
//! - For every affected package, the import chain back to each trigger
//!
//! Algorithm:
//! 1. Changed files → directories → owning packages
//! 2. Changed `go.mod` → modules whose required version moved → their packages
//! 3. For each trigger, one reverse breadth-first search yields the shortest
//!    import chain from every package that reaches it
//! 4. Merge by import path, keeping discovery order

use super::PackageGraph;
use crate::core::error::{AffectedResult, ResultExt};
use crate::core::vcs::{Vcs, ensure_statable};
use crate::glob::FileFilter;
use crate::module::{ImportPath, Manifest, Package, PackageLoader};
use indexmap::{IndexMap, IndexSet};
use petgraph::graph::NodeIndex;
use serde::{Serialize, Serializer};
use std::path::{Path, PathBuf};

const MANIFEST_FILE: &str = "go.mod";
const LOCK_FILE: &str = "go.sum";

/// Why a package is affected: a changed package and the chain leading to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cause {
  /// The changed package
  #[serde(serialize_with = "serialize_id")]
  pub package: Package,
  /// `[affected, ..., package]`
  #[serde(rename = "imports")]
  pub import_path: ImportPath,
}

/// A package affected by at least one change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AffectedPackage {
  #[serde(serialize_with = "serialize_id")]
  pub package: Package,
  /// One cause per trigger reaching this package, in discovery order
  pub causes: Vec<Cause>,
}

fn serialize_id<S: Serializer>(package: &Package, serializer: S) -> Result<S::Ok, S::Error> {
  serializer.serialize_str(&package.id)
}

/// Changes that can trigger packages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
  /// Directories containing changed files, deduplicated
  pub directories: Vec<PathBuf>,
  /// Import paths of packages in modules whose required version changed
  pub module_packages: Vec<String>,
}

/// Inputs of one analysis run.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisRequest<'a> {
  /// Module whose packages form the graph
  pub module: &'a str,
  /// Revision A (before)
  pub base: &'a str,
  /// Revision B (after)
  pub head: &'a str,
  pub filter: &'a FileFilter,
}

/// Combines version control and package resolution into an affected set.
pub struct AffectedAnalyzer<'a> {
  vcs: &'a dyn Vcs,
  loader: &'a dyn PackageLoader,
}

impl<'a> AffectedAnalyzer<'a> {
  pub fn new(vcs: &'a dyn Vcs, loader: &'a dyn PackageLoader) -> Self {
    Self { vcs, loader }
  }

  /// Run the full analysis for `request`.
  ///
  /// Collaborator errors propagate unchanged. When no changed file can trigger
  /// a package (none at all, or only lock files) the result is empty and the
  /// package loader is not consulted.
  pub fn analyze(&self, request: &AnalysisRequest<'_>) -> AffectedResult<Vec<AffectedPackage>> {
    let files = self.vcs.modified_files(request.base, request.head, request.filter)?;
    tracing::debug!(base = request.base, head = request.head, files = files.len(), "modified files");

    if files.is_empty() {
      return Ok(vec![]);
    }

    let mut directories = IndexSet::new();
    let mut modules = IndexSet::new();

    for file in &files {
      ensure_statable(file)?;

      match file.file_name().and_then(|name| name.to_str()) {
        Some(MANIFEST_FILE) => modules.extend(self.changed_modules(request.base, request.head, file)?),
        Some(LOCK_FILE) => {}
        _ => {
          if let Some(dir) = file.parent() {
            directories.insert(dir.to_path_buf());
          }
        }
      }
    }

    if directories.is_empty() && modules.is_empty() {
      tracing::debug!("no changes can trigger a package");
      return Ok(vec![]);
    }

    let mut raw = self.loader.load(&[request.module.to_string()])?;
    let mut changes = ChangeSet {
      directories: directories.into_iter().collect(),
      module_packages: Vec::new(),
    };

    if !modules.is_empty() {
      let modules: Vec<String> = modules.into_iter().collect();
      let updated = self.loader.load(&modules)?;
      changes.module_packages = updated.iter().map(|pkg| pkg.id.clone()).collect();
      raw.extend(updated);
    }

    let graph = PackageGraph::build(&raw);
    tracing::debug!(packages = graph.len(), imports = graph.edge_count(), "built import graph");

    let triggers = resolve_triggers(&graph, &changes);
    Ok(compute(&graph, &triggers))
  }

  /// Modules required at a different version in `head` than in `base`.
  fn changed_modules(&self, base: &str, head: &str, manifest_path: &Path) -> AffectedResult<Vec<String>> {
    let relative = manifest_path
      .strip_prefix(self.vcs.work_tree())
      .unwrap_or(manifest_path);

    let before = self.read_manifest(base, relative, manifest_path)?;
    let after = self.read_manifest(head, relative, manifest_path)?;

    let changes = Manifest::version_changes(&before, &after);
    for change in &changes {
      tracing::debug!(
        module = %change.module,
        before = %change.before,
        after = %change.after,
        "module version changed"
      );
    }

    Ok(changes.into_iter().map(|c| c.module).collect())
  }

  fn read_manifest(&self, rev: &str, relative: &Path, display: &Path) -> AffectedResult<Manifest> {
    let data = self
      .vcs
      .read_file_at_ref(rev, relative)
      .with_context(|| format!("Failed to read {} at {}", relative.display(), rev))?;
    Manifest::parse(display, &data)
  }
}

/// Map a change set onto graph nodes.
///
/// Directories with no package and module packages outside the graph are
/// ignored. The result has no duplicates and keeps change order.
pub fn resolve_triggers(graph: &PackageGraph, changes: &ChangeSet) -> Vec<NodeIndex> {
  let mut triggers = IndexSet::new();

  for dir in &changes.directories {
    match graph.find_by_dir(dir) {
      Some(idx) => {
        tracing::debug!(package = %graph.package(idx).id, "changed package");
        triggers.insert(idx);
      }
      None => tracing::debug!(dir = %dir.display(), "no package for changed directory"),
    }
  }

  for id in &changes.module_packages {
    if let Some(idx) = graph.find_by_id(id) {
      tracing::debug!(package = %id, "changed module package");
      triggers.insert(idx);
    }
  }

  triggers.into_iter().collect()
}

/// Every package reaching a trigger, each with one cause per trigger it reaches.
///
/// A trigger always affects itself with the path `[trigger]`. Packages appear
/// once, in the order they were first discovered.
pub fn compute(graph: &PackageGraph, triggers: &[NodeIndex]) -> Vec<AffectedPackage> {
  let mut affected: IndexMap<String, AffectedPackage> = IndexMap::new();

  for &trigger in triggers {
    let changed = graph.package(trigger);

    for (idx, import_path) in graph.import_paths_to(trigger) {
      let package = graph.package(idx);
      affected
        .entry(package.id.clone())
        .or_insert_with(|| AffectedPackage {
          package: package.clone(),
          causes: Vec::new(),
        })
        .causes
        .push(Cause {
          package: changed.clone(),
          import_path,
        });
    }
  }

  affected.into_values().collect()
}
