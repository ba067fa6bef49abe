//! `go.mod` parsing and requirement diffing
//!
//! Only the directives that matter for impact analysis are modelled: the module
//! path and the `require` table. `replace`, `exclude`, `retract`, `toolchain`,
//! `godebug`, `tool` and `ignore` are recognised and skipped. Directives added
//! by newer Go releases are skipped with a warning.

use crate::core::error::{AffectedError, AffectedResult};
use indexmap::IndexMap;
use semver::Version;
use std::path::{Path, PathBuf};

/// Directives we accept but ignore.
const SKIPPED_DIRECTIVES: &[&str] = &["exclude", "replace", "retract", "toolchain", "godebug", "tool", "ignore"];

/// A single `require` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
  pub module: String,
  pub version: String,
  pub indirect: bool,
}

/// A module whose required version differs between two manifests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionChange {
  pub module: String,
  pub before: String,
  pub after: String,
}

/// Parsed `go.mod`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
  pub module: Option<String>,
  pub go_version: Option<String>,
  /// module path → requirement, in file order
  pub require: IndexMap<String, Requirement>,
}

impl Manifest {
  /// Parse manifest bytes. Empty input yields an empty manifest.
  ///
  /// # Errors
  /// [`AffectedError::ManifestParse`] on malformed `module`/`require` lines,
  /// unterminated blocks, or versions that are not valid Go semantic versions.
  pub fn parse(path: &Path, data: &[u8]) -> AffectedResult<Self> {
    let text = std::str::from_utf8(data).map_err(|e| parse_error(path, 0, format!("invalid UTF-8: {}", e)))?;

    let mut manifest = Manifest::default();
    let mut block: Option<(String, usize)> = None;

    for (idx, raw_line) in text.lines().enumerate() {
      let line_no = idx + 1;
      let (line, comment) = split_comment(raw_line);
      let line = line.trim();

      if block.is_some() {
        if line == ")" {
          block = None;
          continue;
        }
        if !line.is_empty() && block.as_ref().is_some_and(|(d, _)| d == "require") {
          manifest.add_requirement(path, line_no, line, comment)?;
        }
        continue;
      }

      if line.is_empty() {
        continue;
      }

      let (directive, rest) = match line.split_once(char::is_whitespace) {
        Some((d, r)) => (d, r.trim()),
        None => (line, ""),
      };

      match directive {
        "module" => {
          if rest.is_empty() {
            return Err(parse_error(path, line_no, "module directive without a path"));
          }
          manifest.module = Some(unquote(rest).to_string());
        }
        "go" => manifest.go_version = Some(rest.to_string()),
        "require" => {
          if rest == "(" {
            block = Some(("require".to_string(), line_no));
          } else {
            manifest.add_requirement(path, line_no, rest, comment)?;
          }
        }
        d if SKIPPED_DIRECTIVES.contains(&d) => {
          if rest == "(" {
            block = Some((d.to_string(), line_no));
          }
        }
        other => {
          tracing::warn!(path = %path.display(), line = line_no, directive = other, "skipping unknown go.mod directive");
          if rest == "(" {
            block = Some((other.to_string(), line_no));
          }
        }
      }
    }

    if let Some((directive, line_no)) = block {
      return Err(parse_error(path, line_no, format!("unterminated {} block", directive)));
    }

    Ok(manifest)
  }

  fn add_requirement(&mut self, path: &Path, line_no: usize, entry: &str, comment: Option<&str>) -> AffectedResult<()> {
    let mut fields = entry.split_whitespace();
    let (Some(module), Some(version), None) = (fields.next(), fields.next(), fields.next()) else {
      return Err(parse_error(path, line_no, format!("expected '<module> <version>', got '{}'", entry)));
    };

    if !is_valid_version(version) {
      return Err(parse_error(path, line_no, format!("invalid version '{}' for {}", version, module)));
    }

    let module = unquote(module).to_string();
    let indirect = comment.is_some_and(|c| c.trim() == "indirect");
    self.require.insert(
      module.clone(),
      Requirement {
        module,
        version: version.to_string(),
        indirect,
      },
    );
    Ok(())
  }

  /// Modules required in both manifests at different versions, sorted by module path.
  ///
  /// Newly added and removed modules are not version changes.
  pub fn version_changes(before: &Manifest, after: &Manifest) -> Vec<VersionChange> {
    let mut changes: Vec<VersionChange> = after
      .require
      .values()
      .filter_map(|req| {
        let old = before.require.get(&req.module)?;
        if same_version(&old.version, &req.version) {
          return None;
        }
        Some(VersionChange {
          module: req.module.clone(),
          before: old.version.clone(),
          after: req.version.clone(),
        })
      })
      .collect();

    changes.sort_by(|a, b| a.module.cmp(&b.module));
    changes
  }
}

/// Read the module path from `<root>/go.mod`, if there is one.
pub fn read_module_path(root: &Path) -> AffectedResult<Option<String>> {
  let path = root.join("go.mod");
  let data = match std::fs::read(&path) {
    Ok(data) => data,
    Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
    Err(e) => return Err(e.into()),
  };
  Ok(Manifest::parse(&path, &data)?.module)
}

fn parse_error(path: &Path, line: usize, reason: impl Into<String>) -> AffectedError {
  AffectedError::ManifestParse {
    path: PathBuf::from(path),
    line,
    reason: reason.into(),
  }
}

fn split_comment(line: &str) -> (&str, Option<&str>) {
  match line.find("//") {
    Some(pos) => (&line[..pos], Some(&line[pos + 2..])),
    None => (line, None),
  }
}

fn unquote(s: &str) -> &str {
  s.strip_prefix('"')
    .and_then(|s| s.strip_suffix('"'))
    .or_else(|| s.strip_prefix('`').and_then(|s| s.strip_suffix('`')))
    .unwrap_or(s)
}

/// Go versions are `v` + semver, e.g. `v1.2.3`, `v2.0.0+incompatible`,
/// or pseudo-versions like `v0.0.0-20200101000000-abcdef123456`.
fn parse_version(version: &str) -> Option<Version> {
  version.strip_prefix('v').and_then(|v| Version::parse(v).ok())
}

fn is_valid_version(version: &str) -> bool {
  parse_version(version).is_some()
}

fn same_version(a: &str, b: &str) -> bool {
  match (parse_version(a), parse_version(b)) {
    (Some(a), Some(b)) => a == b,
    _ => a == b,
  }
}
