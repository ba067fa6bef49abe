//! Detect Go packages affected by changes between two revisions, and why
//!
//! - **glob**: glob patterns that classify changed files
//! - **module**: packages, `go.mod` manifests, and the `go list` loader
//! - **graph**: the import graph, affected analysis, and grouping
//! - **core**: configuration, errors, and version control
//! - **commands**: the `affected` command behind the binary
//! - **ui**: logging setup

pub mod commands;
pub mod core;
pub mod glob;
pub mod graph;
pub mod module;
pub mod ui;
