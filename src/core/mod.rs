//! Core building blocks shared by every command
//!
//! - **config**: run configuration (defaults, `affected.toml`, CLI flags)
//! - **error**: error types with exit codes and contextual help messages
//! - **vcs**: version control abstraction (SystemGit)

pub mod config;
pub mod error;
pub mod vcs;
