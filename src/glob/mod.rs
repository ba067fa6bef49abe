//! Glob patterns for classifying changed files
//!
//! Patterns are compiled into anchored regular expressions:
//!
//! - `?` matches one character other than `/`
//! - `*` matches any run of characters other than `/`
//! - `**/` matches zero or more directory segments made of ordinary name characters
//! - a trailing `/**` matches everything below a directory
//! - `{a,b}` is alternation, `{{` is a literal brace
//! - `[...]` is passed through as a character class
//!
//! Everything else is matched literally.

use crate::core::error::{AffectedError, AffectedResult};
use regex::Regex;
use std::borrow::Cow;
use std::path::Path;

/// Any run of characters except the path separator.
const ANY_RUN: &str = "[^/]*";

/// One character except the path separator.
const ANY_CHAR: &str = "[^/]";

/// Zero or more whole directory segments (`**/`).
const ZERO_OR_MORE_DIRECTORIES: &str = r"(?:[.{}A-Za-z0-9_\- ]+/)*";

/// Default include globs: manifests and all Go sources
pub fn include_default() -> Vec<String> {
  vec!["/**/*.go".to_string(), "/**/go.mod".to_string(), "/**/go.sum".to_string()]
}

/// Default exclude globs: Go unit test sources
pub fn exclude_default() -> Vec<String> {
  vec!["/**/*_test.go".to_string()]
}

/// A compiled glob pattern.
#[derive(Debug, Clone)]
pub struct Glob {
  pattern: String,
  regex: Regex,
}

impl Glob {
  /// Compile a glob pattern.
  ///
  /// # Errors
  /// Returns [`AffectedError::InvalidPattern`] for unbalanced brace groups,
  /// unterminated character classes, or anything the regex engine rejects.
  pub fn compile(pattern: &str) -> AffectedResult<Self> {
    let source = translate(pattern)?;
    let regex = Regex::new(&source).map_err(|e| invalid(pattern, e.to_string()))?;

    Ok(Self {
      pattern: pattern.to_string(),
      regex,
    })
  }

  /// Does the whole subject match this glob?
  pub fn is_match(&self, subject: &str) -> bool {
    self.regex.is_match(subject)
  }

  /// Match a filesystem path (separators normalized to `/`)
  pub fn is_match_path(&self, path: &Path) -> bool {
    self.is_match(&path_subject(path))
  }

  /// The pattern as written
  pub fn as_str(&self) -> &str {
    &self.pattern
  }

  /// The regular expression the pattern compiled to
  #[cfg(test)]
  pub fn regex_source(&self) -> &str {
    self.regex.as_str()
  }
}

/// Compile `pattern` and match it against `subject` in one go.
#[cfg(test)]
pub fn is_match(pattern: &str, subject: &str) -> AffectedResult<bool> {
  Ok(Glob::compile(pattern)?.is_match(subject))
}

/// An ordered set of globs; a path matches the set when any glob matches.
#[derive(Debug, Clone, Default)]
pub struct GlobSet {
  globs: Vec<Glob>,
}

impl GlobSet {
  /// Compile every pattern, failing on the first invalid one.
  pub fn new<S: AsRef<str>>(patterns: &[S]) -> AffectedResult<Self> {
    let globs = patterns
      .iter()
      .map(|p| Glob::compile(p.as_ref()))
      .collect::<AffectedResult<Vec<_>>>()?;
    Ok(Self { globs })
  }

  pub fn is_empty(&self) -> bool {
    self.globs.is_empty()
  }

  pub fn patterns(&self) -> impl Iterator<Item = &str> {
    self.globs.iter().map(Glob::as_str)
  }

  pub fn is_match_path(&self, path: &Path) -> bool {
    let subject = path_subject(path);
    self.globs.iter().any(|g| g.is_match(&subject))
  }

  /// Keep the paths matched by at least one glob, preserving order.
  pub fn include<P: AsRef<Path> + Clone>(&self, paths: &[P]) -> Vec<P> {
    paths
      .iter()
      .filter(|p| self.is_match_path(p.as_ref()))
      .cloned()
      .collect()
  }

  /// Drop every path matched by at least one glob, preserving order of the rest.
  pub fn exclude<P: AsRef<Path> + Clone>(&self, paths: &[P]) -> Vec<P> {
    paths
      .iter()
      .filter(|p| !self.is_match_path(p.as_ref()))
      .cloned()
      .collect()
  }
}

/// Include/exclude globs applied to changed files.
#[derive(Debug, Clone, Default)]
pub struct FileFilter {
  pub include: GlobSet,
  pub exclude: GlobSet,
}

impl FileFilter {
  pub fn new(include: GlobSet, exclude: GlobSet) -> Self {
    Self { include, exclude }
  }

  /// Include first, then exclude. An empty set is skipped rather than matching nothing.
  pub fn apply<P: AsRef<Path> + Clone>(&self, paths: &[P]) -> Vec<P> {
    let included = if self.include.is_empty() {
      paths.to_vec()
    } else {
      self.include.include(paths)
    };

    if self.exclude.is_empty() {
      included
    } else {
      self.exclude.exclude(&included)
    }
  }
}

fn path_subject(path: &Path) -> Cow<'_, str> {
  let lossy = path.to_string_lossy();
  if cfg!(windows) && lossy.contains('\\') {
    Cow::Owned(lossy.replace('\\', "/"))
  } else {
    lossy
  }
}

fn invalid(pattern: &str, reason: impl Into<String>) -> AffectedError {
  AffectedError::InvalidPattern {
    pattern: pattern.to_string(),
    reason: reason.into(),
  }
}

/// Translate a glob into an anchored regex source string.
fn translate(pattern: &str) -> AffectedResult<String> {
  let chars: Vec<char> = pattern.chars().collect();
  let rest_starts_with = |at: usize, needle: &str| {
    let needle: Vec<char> = needle.chars().collect();
    chars.len() >= at + needle.len() && chars[at..at + needle.len()] == needle[..]
  };

  let mut out = String::with_capacity(pattern.len() * 2 + 2);
  out.push('^');

  let mut depth = 0usize;
  let mut i = 0;

  while i < chars.len() {
    let c = chars[i];
    match c {
      '/' => {
        out.push('/');
        if rest_starts_with(i, "/**/") {
          out.push_str(ZERO_OR_MORE_DIRECTORIES);
          i += 4;
          continue;
        }
        if i + 3 == chars.len() && rest_starts_with(i, "/**") {
          out.push_str(".*");
          i += 3;
          continue;
        }
      }
      '*' => {
        if rest_starts_with(i, "**/") {
          out.push_str(ZERO_OR_MORE_DIRECTORIES);
          i += 3;
          continue;
        }
        out.push_str(ANY_RUN);
      }
      '?' => out.push_str(ANY_CHAR),
      '{' => {
        if rest_starts_with(i, "{{") {
          out.push_str(r"\{");
          i += 2;
          continue;
        }
        depth += 1;
        out.push_str("(?:");
      }
      '}' => {
        if depth > 0 {
          depth -= 1;
          out.push(')');
        } else {
          out.push_str(r"\}");
        }
      }
      ',' => out.push(if depth > 0 { '|' } else { ',' }),
      '[' => {
        let end = chars[i + 1..]
          .iter()
          .position(|&ch| ch == ']')
          .map(|offset| i + 1 + offset)
          .ok_or_else(|| invalid(pattern, "unterminated character class"))?;
        out.push('[');
        for &ch in &chars[i + 1..end] {
          match ch {
            '\\' => out.push_str(r"\\"),
            '[' => out.push_str(r"\["),
            _ => out.push(ch),
          }
        }
        out.push(']');
        i = end + 1;
        continue;
      }
      _ => out.push_str(&regex::escape(c.encode_utf8(&mut [0u8; 4]))),
    }
    i += 1;
  }

  if depth > 0 {
    return Err(invalid(pattern, "unbalanced brace group"));
  }

  out.push('$');
  Ok(out)
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::path::PathBuf;

  fn paths(list: &[&str]) -> Vec<PathBuf> {
    list.iter().map(PathBuf::from).collect()
  }

  #[test]
  fn test_default_globs_match_sources_and_manifests() {
    let cases = [
      ("/**/*.go", "/root/pkg/foo.go", true),
      ("/**/*.go", "/root/foo.go", true),
      ("/**/*.go", "/root/README.md", false),
      ("/**/go.mod", "/root/go.mod", true),
      ("/**/go.sum", "/root/nested/dir/go.sum", true),
      ("/**/*_test.go", "/root/pkg/foo_test.go", true),
      ("/**/*_test.go", "/root/pkg/foo.go", false),
    ];

    for (pattern, subject, expected) in cases {
      assert_eq!(is_match(pattern, subject).unwrap(), expected, "{} vs {}", pattern, subject);
    }
  }

  #[test]
  fn test_double_star_segments_are_name_characters_only() {
    assert!(is_match("/**/*.go", "/a b/c-d/e.f/{x}/main.go").unwrap());
    assert!(!is_match("/**/*.go", "/weird+dir/main.go").unwrap());
  }

  #[test]
  fn test_trailing_double_star_matches_everything_below() {
    let glob = Glob::compile("/vendor/**").unwrap();
    assert!(glob.is_match("/vendor/a/b/c.go"));
    assert!(glob.is_match("/vendor/"));
    assert!(!glob.is_match("/src/vendor/a.go"));
  }

  #[test]
  fn test_leading_double_star_matches_relative_paths() {
    let glob = Glob::compile("**/*.go").unwrap();
    assert!(glob.is_match("foo.go"));
    assert!(glob.is_match("bar/bar.go"));
    assert!(!glob.is_match("bar/bar.md"));
  }

  #[test]
  fn test_single_star_and_question_mark_stop_at_separator() {
    assert!(is_match("/src/*.go", "/src/main.go").unwrap());
    assert!(!is_match("/src/*.go", "/src/nested/main.go").unwrap());
    assert!(is_match("/src/ma?n.go", "/src/main.go").unwrap());
    assert!(!is_match("/src?main.go", "/src/main.go").unwrap());
  }

  #[test]
  fn test_brace_alternation() {
    let glob = Glob::compile("/**/*.{go,proto}").unwrap();
    assert!(glob.is_match("/a/b.go"));
    assert!(glob.is_match("/a/b.proto"));
    assert!(!glob.is_match("/a/b.md"));
    assert!(is_match("/a,b", "/a,b").unwrap());
  }

  #[test]
  fn test_double_open_brace_is_literal() {
    let glob = Glob::compile("/tmpl/{{name}").unwrap();
    assert!(glob.is_match("/tmpl/{name}"));
  }

  #[test]
  fn test_character_classes() {
    let glob = Glob::compile("/src/file[0-9].go").unwrap();
    assert!(glob.is_match("/src/file1.go"));
    assert!(!glob.is_match("/src/filex.go"));
  }

  #[test]
  fn test_regex_metacharacters_are_literal() {
    assert!(is_match("/a+b/(c)|d$.go", "/a+b/(c)|d$.go").unwrap());
    assert!(!is_match("/a.go", "/abgo").unwrap());
    assert!(is_match("/x=y!.go", "/x=y!.go").unwrap());
  }

  #[test]
  fn test_anchored_at_both_ends() {
    assert!(!is_match("/**/*.go", "/root/foo.go.orig").unwrap());
    assert!(!is_match("/root/foo.go", "/prefix/root/foo.go").unwrap());
    assert!(Glob::compile("/a").unwrap().regex_source().starts_with('^'));
  }

  #[test]
  fn test_invalid_patterns() {
    for pattern in ["/{a,b", "/[abc", "/src/[]"] {
      match Glob::compile(pattern) {
        Err(AffectedError::InvalidPattern { pattern: p, .. }) => assert_eq!(p, pattern),
        other => panic!("expected InvalidPattern for {}, got {:?}", pattern, other),
      }
    }
  }

  #[test]
  fn test_include_default_absolute_paths() {
    let files = paths(&[
      "/root/go.mod",
      "/root/go.sum",
      "/root/foo.go",
      "/root/foo_test.go",
      "/root/bar/bar.go",
      "/root/bar/bar_test.go",
      "/root/README.md",
    ]);
    let set = GlobSet::new(&include_default()).unwrap();

    assert_eq!(
      set.include(&files),
      paths(&[
        "/root/go.mod",
        "/root/go.sum",
        "/root/foo.go",
        "/root/foo_test.go",
        "/root/bar/bar.go",
        "/root/bar/bar_test.go",
      ])
    );
  }

  #[test]
  fn test_exclude_default_absolute_paths() {
    let files = paths(&[
      "/root/foo.go",
      "/root/foo_test.go",
      "/root/bar/bar.go",
      "/root/bar/bar_test.go",
    ]);
    let set = GlobSet::new(&exclude_default()).unwrap();

    assert_eq!(set.exclude(&files), paths(&["/root/foo.go", "/root/bar/bar.go"]));
  }

  #[test]
  fn test_exclude_handles_adjacent_matches() {
    let files = paths(&["/r/a_test.go", "/r/b_test.go", "/r/c.go", "/r/d_test.go"]);
    let set = GlobSet::new(&exclude_default()).unwrap();
    assert_eq!(set.exclude(&files), paths(&["/r/c.go"]));
  }

  #[test]
  fn test_include_and_exclude_partition_the_input() {
    let files = paths(&[
      "/root/a.go",
      "/root/a_test.go",
      "/root/go.mod",
      "/root/docs/readme.md",
      "/root/x/y/z_test.go",
    ]);
    let set = GlobSet::new(&exclude_default()).unwrap();

    let mut union = set.include(&files);
    union.extend(set.exclude(&files));
    union.sort();

    let mut expected = files.clone();
    expected.sort();
    assert_eq!(union, expected);
  }

  #[test]
  fn test_file_filter_defaults() {
    let filter = FileFilter::new(
      GlobSet::new(&include_default()).unwrap(),
      GlobSet::new(&exclude_default()).unwrap(),
    );
    let files = paths(&[
      "/repo/go.mod",
      "/repo/README.md",
      "/repo/lib/lib.go",
      "/repo/lib/lib_test.go",
    ]);
    assert_eq!(filter.apply(&files), paths(&["/repo/go.mod", "/repo/lib/lib.go"]));
  }

  #[test]
  fn test_file_filter_without_globs_keeps_everything() {
    let files = paths(&["/repo/README.md", "/repo/a_test.go"]);
    assert_eq!(FileFilter::default().apply(&files), files);
  }

  #[test]
  fn test_empty_set_matches_nothing() {
    let set = GlobSet::new::<&str>(&[]).unwrap();
    assert!(set.is_empty());
    assert!(set.include(&paths(&["/a.go"])).is_empty());
  }
}
