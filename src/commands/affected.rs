//! `affected` - Show which packages are affected by changes
//!
//! This command analyzes file changes (via git) and determines:
//! - Which packages directly contain changed files
//! - Which packages transitively import those changed packages
//! - Why: the import chain from each affected package to each change
//!
//! With the `group` subcommand the result is partitioned by a grouping rule
//! before it is written.

use crate::core::config::{AffectedConfig, OutputFormat};
use crate::core::error::{AffectedResult, ResultExt};
use crate::core::vcs::{SystemGit, Vcs};
use crate::graph::{AffectedAnalyzer, AffectedPackage, AnalysisRequest, Group, group};
use crate::module::{GoListLoader, PackageLoader};
use serde::Serialize;
use std::io::{self, Write};

/// What gets serialized: the flat affected set or its groups
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Report {
  Packages(Vec<AffectedPackage>),
  Groups(Vec<Group>),
}

/// Run the affected command
pub fn run_affected(config: &AffectedConfig) -> AffectedResult<()> {
  let vcs = SystemGit::open(&config.root)?;
  let loader = GoListLoader::new(&config.root);

  let module = match &config.module {
    Some(module) => module.clone(),
    None => loader.current_module_path()?,
  };
  tracing::debug!(%module, work_tree = %vcs.work_tree().display(), "analyzing module");

  let request = AnalysisRequest {
    module: &module,
    base: &config.base,
    head: &config.head,
    filter: &config.filter,
  };
  let packages = AffectedAnalyzer::new(&vcs, &loader).analyze(&request)?;
  tracing::debug!(affected = packages.len(), "analysis complete");

  let report = match &config.group {
    Some(rule) => Report::Groups(group(rule, &packages)),
    None => Report::Packages(packages),
  };

  // Render everything first so a failure never leaves partial output behind
  let rendered = render(&report, config.format)?;

  if config.discard {
    write_output(&mut io::sink(), &rendered)
  } else {
    write_output(&mut io::stdout().lock(), &rendered)
  }
}

fn write_output(out: &mut impl Write, rendered: &str) -> AffectedResult<()> {
  out.write_all(rendered.as_bytes()).context("Failed to write output")?;
  out.flush().context("Failed to write output")?;
  Ok(())
}

fn render(report: &Report, format: OutputFormat) -> AffectedResult<String> {
  let mut out = match format {
    OutputFormat::Json => serde_json::to_string_pretty(report)?,
    OutputFormat::JsonMinified => serde_json::to_string(report)?,
    OutputFormat::Text => match report {
      Report::Packages(packages) => render_packages(packages),
      Report::Groups(groups) => render_groups(groups),
    },
  };
  out.push('\n');
  Ok(out)
}

/// Text blocks for each package, its causes, and each cause's import chain.
fn render_packages(packages: &[AffectedPackage]) -> String {
  let mut out = String::new();

  for pkg in packages {
    out.push_str(&format!("- Package:  {}\n", pkg.package.id));
    for cause in &pkg.causes {
      out.push_str(&format!(" - Caused By: {}\n", cause.package.id));
      for (depth, hop) in cause.import_path.iter().enumerate() {
        out.push_str(&format!("  {} {}\n", ">".repeat(depth), hop.id));
      }
    }
  }

  out
}

fn render_groups(groups: &[Group]) -> String {
  let mut out = String::new();

  for (n, group) in groups.iter().enumerate() {
    if n > 0 {
      out.push('\n');
    }

    let title = format!("Group: {}", group.name);
    let underline = "-".repeat(title.len());
    out.push_str(&format!("{}\n{}\n", title, underline));
    out.push_str(&render_packages(&group.packages));
  }

  out
}
