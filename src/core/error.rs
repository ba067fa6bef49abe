//! Error types for affected with contextual messages and exit codes
//!
//! Every failure in the tool funnels into [`AffectedError`]. Collaborator
//! failures (git, the Go toolchain) keep the command and its stderr so they
//! can be surfaced verbatim. Nothing here is retried.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for affected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// User error (config, invalid flags, bad globs, bad manifest)
  User = 1,
  /// System error (git, go toolchain, I/O)
  System = 2,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for affected
#[derive(Debug)]
pub enum AffectedError {
  /// Configuration errors (config file, flag combinations)
  Config(ConfigError),

  /// Version control failures
  Vcs(VcsError),

  /// Package resolution failures
  Resolve(ResolveError),

  /// Malformed manifest at one of the compared revisions
  ManifestParse {
    path: PathBuf,
    line: usize,
    reason: String,
  },

  /// Glob pattern that cannot be compiled
  InvalidPattern { pattern: String, reason: String },

  /// Unknown graph walk direction
  InvalidWalkDirection { direction: String },

  /// Unknown output format selector
  UnsupportedFormat { format: String },

  /// I/O errors
  Io(io::Error),

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl AffectedError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    AffectedError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Add context to an existing error
  ///
  /// Structured variants are returned unchanged so callers can still match on them.
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      AffectedError::Message { message, context, help } => AffectedError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      AffectedError::Io(err) => AffectedError::Message {
        message: format!("I/O error: {}", err),
        context: Some(ctx_str),
        help: None,
      },
      _ => self,
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      AffectedError::Config(_) => ExitCode::User,
      AffectedError::Vcs(_) => ExitCode::System,
      AffectedError::Resolve(_) => ExitCode::System,
      AffectedError::ManifestParse { .. } => ExitCode::User,
      AffectedError::InvalidPattern { .. } => ExitCode::User,
      AffectedError::InvalidWalkDirection { .. } => ExitCode::User,
      AffectedError::UnsupportedFormat { .. } => ExitCode::User,
      AffectedError::Io(_) => ExitCode::System,
      AffectedError::Message { .. } => ExitCode::User,
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      AffectedError::Config(e) => e.help_message(),
      AffectedError::Vcs(e) => e.help_message(),
      AffectedError::Resolve(e) => e.help_message(),
      AffectedError::UnsupportedFormat { .. } => Some("Valid formats: text, json, json-minified".to_string()),
      AffectedError::InvalidPattern { .. } => {
        Some("Globs support ?, *, **/, {a,b} alternation and [...] character classes.".to_string())
      }
      AffectedError::Message { help, .. } => help.clone(),
      _ => None,
    }
  }
}

impl fmt::Display for AffectedError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      AffectedError::Config(e) => write!(f, "{}", e),
      AffectedError::Vcs(e) => write!(f, "{}", e),
      AffectedError::Resolve(e) => write!(f, "{}", e),
      AffectedError::ManifestParse { path, line, reason } => {
        write!(f, "Failed to parse manifest {}:{}: {}", path.display(), line, reason)
      }
      AffectedError::InvalidPattern { pattern, reason } => {
        write!(f, "Invalid glob pattern '{}': {}", pattern, reason)
      }
      AffectedError::InvalidWalkDirection { direction } => {
        write!(f, "Invalid walk direction '{}'", direction)
      }
      AffectedError::UnsupportedFormat { format } => write!(f, "Unsupported format '{}'", format),
      AffectedError::Io(e) => write!(f, "I/O error: {}", e),
      AffectedError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for AffectedError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      AffectedError::Io(e) => Some(e),
      _ => None,
    }
  }
}

impl From<io::Error> for AffectedError {
  fn from(err: io::Error) -> Self {
    AffectedError::Io(err)
  }
}

impl From<String> for AffectedError {
  fn from(msg: String) -> Self {
    AffectedError::message(msg)
  }
}

impl From<&str> for AffectedError {
  fn from(msg: &str) -> Self {
    AffectedError::message(msg)
  }
}

impl From<VcsError> for AffectedError {
  fn from(err: VcsError) -> Self {
    AffectedError::Vcs(err)
  }
}

impl From<ResolveError> for AffectedError {
  fn from(err: ResolveError) -> Self {
    AffectedError::Resolve(err)
  }
}

impl From<ConfigError> for AffectedError {
  fn from(err: ConfigError) -> Self {
    AffectedError::Config(err)
  }
}

impl From<toml_edit::de::Error> for AffectedError {
  fn from(err: toml_edit::de::Error) -> Self {
    AffectedError::message(format!("TOML deserialization error: {}", err))
  }
}

impl From<serde_json::Error> for AffectedError {
  fn from(err: serde_json::Error) -> Self {
    AffectedError::message(format!("JSON error: {}", err))
  }
}

impl From<std::string::FromUtf8Error> for AffectedError {
  fn from(err: std::string::FromUtf8Error) -> Self {
    AffectedError::message(format!("UTF-8 conversion error: {}", err))
  }
}

/// Configuration-related errors
#[derive(Debug)]
pub enum ConfigError {
  /// Config file exists but is invalid
  Invalid { path: PathBuf, reason: String },

  /// `group` requested without a package prefix
  MissingGroupPrefix,

  /// No module path given and none found in go.mod
  ModuleNotFound { root: PathBuf },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::MissingGroupPrefix => {
        Some("Pass --pkg-prefix (and optionally --after) or set [group] pkg_prefix in affected.toml.".to_string())
      }
      ConfigError::ModuleNotFound { .. } => Some("Run from a Go module root or pass --module.".to_string()),
      ConfigError::Invalid { .. } => None,
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::Invalid { path, reason } => {
        write!(f, "Invalid configuration in {}: {}", path.display(), reason)
      }
      ConfigError::MissingGroupPrefix => write!(f, "No group function provided"),
      ConfigError::ModuleNotFound { root } => {
        write!(f, "Could not determine module path: no module directive in {}/go.mod", root.display())
      }
    }
  }
}

/// Version control errors
#[derive(Debug)]
pub enum VcsError {
  /// Git command failed
  CommandFailed { command: String, stderr: String },

  /// Repository not found
  RepoNotFound { path: PathBuf },

  /// Git could not be spawned at all
  Spawn { command: String, source: io::Error },
}

impl VcsError {
  fn help_message(&self) -> Option<String> {
    match self {
      VcsError::CommandFailed { stderr, .. } if stderr.contains("unknown revision") => {
        Some("Check that both revisions exist locally (you may need to fetch the upstream ref).".to_string())
      }
      VcsError::RepoNotFound { path } => Some(format!("Run affected inside a git repository: {}", path.display())),
      VcsError::Spawn { .. } => Some("Make sure git is installed and on PATH.".to_string()),
      _ => None,
    }
  }
}

impl fmt::Display for VcsError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      VcsError::CommandFailed { command, stderr } => {
        write!(f, "Git command failed: {}\n{}", command, stderr)
      }
      VcsError::RepoNotFound { path } => write!(f, "Git repository not found at: {}", path.display()),
      VcsError::Spawn { command, source } => write!(f, "Failed to execute {}: {}", command, source),
    }
  }
}

/// Package resolution errors
#[derive(Debug)]
pub enum ResolveError {
  /// go command failed
  CommandFailed { command: String, stderr: String },

  /// go could not be spawned
  Spawn { command: String, source: io::Error },

  /// go list produced output we cannot decode
  MalformedOutput { command: String, reason: String },
}

impl ResolveError {
  fn help_message(&self) -> Option<String> {
    match self {
      ResolveError::Spawn { .. } => Some("Make sure the Go toolchain is installed and on PATH.".to_string()),
      _ => None,
    }
  }
}

impl fmt::Display for ResolveError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ResolveError::CommandFailed { command, stderr } => {
        write!(f, "Package resolution failed: {}\n{}", command, stderr)
      }
      ResolveError::Spawn { command, source } => write!(f, "Failed to execute {}: {}", command, source),
      ResolveError::MalformedOutput { command, reason } => {
        write!(f, "Malformed output from {}: {}", command, reason)
      }
    }
  }
}

/// Result type alias for affected
pub type AffectedResult<T> = Result<T, AffectedError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> AffectedResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> AffectedResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<AffectedError>,
{
  fn context(self, ctx: impl Into<String>) -> AffectedResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> AffectedResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Print an error to stderr with help text
pub fn print_error(error: &AffectedError) {
  eprintln!("error: {}", error);

  if let Some(help) = error.help_message() {
    eprintln!("help: {}", help);
  }
}
