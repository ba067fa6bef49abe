//! CLI commands for affected
//!
//! - **affected**: Find packages affected by changes, optionally grouped
//!
//! Commands accept `&AffectedConfig`, built once in `main`.

pub mod affected;

pub use affected::run_affected;
