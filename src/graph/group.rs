//! Grouping of affected packages for reporting
//!
//! A [`GroupRule`] names the group a package belongs to, or excludes it.
//! [`group`] applies a rule to an affected set, keeping discovery order.

use super::affected::{AffectedPackage, Cause};
use crate::core::error::{AffectedResult, ConfigError};
use indexmap::IndexMap;
use serde::Serialize;

/// How affected packages are assigned to groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupRule {
  /// Every package whose import path starts with the prefix, in one group named after it
  ByPrefix(String),
  /// `prefix/<segment>` where `segment` is the `index`-th (zero-based) path
  /// element after the prefix; packages with fewer elements are excluded
  ByPrefixSegment { prefix: String, index: usize },
}

impl GroupRule {
  /// Rule for `group --pkg-prefix <prefix> [--after <after>]`.
  ///
  /// `after` is one-based; `0` means plain prefix grouping.
  pub fn from_options(prefix: Option<&str>, after: usize) -> AffectedResult<Self> {
    let prefix = match prefix {
      Some(p) if !p.is_empty() => p.to_string(),
      _ => return Err(ConfigError::MissingGroupPrefix.into()),
    };

    Ok(match after {
      0 => GroupRule::ByPrefix(prefix),
      n => GroupRule::ByPrefixSegment { prefix, index: n - 1 },
    })
  }

  /// Group name for `id`, or `None` if the package is not grouped.
  pub fn group_name(&self, id: &str) -> Option<String> {
    match self {
      GroupRule::ByPrefix(prefix) => id.starts_with(prefix.as_str()).then(|| prefix.clone()),
      GroupRule::ByPrefixSegment { prefix, index } => {
        let rest = id.strip_prefix(prefix.as_str())?;
        // "example.com/pkgx" is not under "example.com/pkg"
        if !rest.is_empty() && !rest.starts_with('/') && !prefix.ends_with('/') {
          return None;
        }

        let segment = rest.split('/').filter(|s| !s.is_empty()).nth(*index)?;
        Some(format!("{}/{}", prefix.trim_end_matches('/'), segment))
      }
    }
  }
}

/// A named subset of the affected set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Group {
  #[serde(rename = "group")]
  pub name: String,
  pub packages: Vec<AffectedPackage>,
  /// Causes of every package in the group, in package order
  #[serde(skip)]
  pub causes: Vec<Cause>,
}

/// Partition `packages` by `rule`.
///
/// Packages the rule does not name are dropped. Groups are ordered by first
/// appearance; packages keep their relative order within a group.
pub fn group(rule: &GroupRule, packages: &[AffectedPackage]) -> Vec<Group> {
  let mut groups: IndexMap<String, Group> = IndexMap::new();

  for pkg in packages {
    let Some(name) = rule.group_name(&pkg.package.id) else {
      tracing::debug!(package = %pkg.package.id, "package not grouped");
      continue;
    };

    let group = groups.entry(name.clone()).or_insert_with(|| Group {
      name,
      packages: Vec::new(),
      causes: Vec::new(),
    });
    group.packages.push(pkg.clone());
    group.causes.extend(pkg.causes.iter().cloned());
  }

  groups.into_values().collect()
}
