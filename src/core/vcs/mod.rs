//! Version control collaborator
//!
//! The analyzer only needs three things from version control: which files
//! changed between two revisions, which directories those files live in, and
//! what a file looked like at a given revision.

pub mod system_git;

pub use system_git::SystemGit;

use crate::core::error::AffectedResult;
use crate::glob::FileFilter;
use indexmap::IndexSet;
use std::io;
use std::path::{Path, PathBuf};

pub trait Vcs {
  /// Absolute, symlink-resolved work tree root.
  fn work_tree(&self) -> &Path;

  /// Absolute paths of files changed between `a` and `b`, filtered by `filter`.
  fn modified_files(&self, a: &str, b: &str, filter: &FileFilter) -> AffectedResult<Vec<PathBuf>>;

  /// Contents of `relative` (to the work tree) at `rev`; empty when the file does not exist there.
  fn read_file_at_ref(&self, rev: &str, relative: &Path) -> AffectedResult<Vec<u8>>;

  /// Unique directories of [`Vcs::modified_files`], in first-seen order.
  ///
  /// Files deleted between the revisions still count; any other stat failure is an error.
  fn modified_directories(&self, a: &str, b: &str, filter: &FileFilter) -> AffectedResult<Vec<PathBuf>> {
    let mut dirs = IndexSet::new();

    for file in self.modified_files(a, b, filter)? {
      ensure_statable(&file)?;
      if let Some(dir) = file.parent() {
        dirs.insert(dir.to_path_buf());
      }
    }

    Ok(dirs.into_iter().collect())
  }
}

/// A changed path may legitimately be gone from the working tree; anything else is fatal.
pub fn ensure_statable(path: &Path) -> AffectedResult<()> {
  match std::fs::metadata(path) {
    Ok(_) => Ok(()),
    Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
    Err(e) => Err(e.into()),
  }
}
