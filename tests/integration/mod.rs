//! Binary-level integration tests for affected
//!
//! These drive the built binary in temporary git repositories. None of them
//! need the Go toolchain: they cover validation that fails before any VCS or
//! resolution call, and change sets that resolve to no packages.
//! `test_library` calls the graph, glob and git APIs directly.

mod helpers;
mod test_affected;
mod test_library;
mod test_validation;
