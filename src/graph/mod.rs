//! Import graph analysis
//!
//! Built on petgraph for direct control and minimal abstraction.
//! We own our domain types and queries.

pub mod affected;
pub mod group;
pub mod package_graph;

pub use affected::{AffectedAnalyzer, AffectedPackage, AnalysisRequest};
pub use group::{Group, GroupRule, group};
pub use package_graph::PackageGraph;
