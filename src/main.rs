use affected::core::config::{AffectedConfig, CliOptions, FileConfig, GroupOptions};
use affected::core::error::{AffectedError, AffectedResult, ResultExt, print_error};
use affected::{commands, ui};
use clap::{Args, Parser, Subcommand};

/// Detect packages affected by changes to other packages, via their imports and version control
#[derive(Parser)]
#[command(name = "affected")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(styles = get_styles())]
#[command(after_help = "Example: affected -f json -a origin/master -b HEAD > affected.json")]
struct Cli {
  #[command(flatten)]
  global: GlobalArgs,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Args)]
struct GlobalArgs {
  /// Revision A [default: origin/master]
  #[arg(short = 'a', long = "a", value_name = "REV", global = true)]
  base: Option<String>,

  /// Revision B [default: HEAD]
  #[arg(short = 'b', long = "b", value_name = "REV", global = true)]
  head: Option<String>,

  /// Output format: text, json, json-minified [default: json]
  #[arg(short, long, value_name = "FMT", global = true)]
  format: Option<String>,

  /// Module path [default: module directive of ./go.mod]
  #[arg(short, long, value_name = "PATH", global = true)]
  module: Option<String>,

  /// Extra include glob (repeatable)
  #[arg(short, long, value_name = "GLOB", global = true)]
  include: Vec<String>,

  /// Extra exclude glob (repeatable)
  #[arg(short = 'x', long, value_name = "GLOB", global = true)]
  exclude: Vec<String>,

  /// Replace the default include globs instead of appending to them
  #[arg(long, global = true)]
  override_include_globs: bool,

  /// Replace the default exclude globs instead of appending to them
  #[arg(long, global = true)]
  override_exclude_globs: bool,

  /// Discard output
  #[arg(short, long, global = true)]
  discard: bool,

  /// Debug logging on stderr
  #[arg(short, long, global = true)]
  verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
  /// Group affected packages by a package prefix
  #[command(after_help = "Example: affected group --pkg-prefix foo.com/pkg --after 1 -f json > affected.json")]
  Group {
    /// Group by package prefix
    #[arg(long, value_name = "PREFIX")]
    pkg_prefix: Option<String>,
    /// Group by the Nth path element after the prefix (one-based; 0 groups by prefix only)
    #[arg(long, value_name = "N")]
    after: Option<usize>,
  },
}

impl Cli {
  fn into_options(self) -> CliOptions {
    let GlobalArgs {
      base,
      head,
      format,
      module,
      include,
      exclude,
      override_include_globs,
      override_exclude_globs,
      discard,
      verbose: _,
    } = self.global;

    CliOptions {
      base,
      head,
      format,
      module,
      include,
      exclude,
      override_include: override_include_globs,
      override_exclude: override_exclude_globs,
      discard,
      group: self
        .command
        .map(|Commands::Group { pkg_prefix, after }| GroupOptions { pkg_prefix, after }),
    }
  }
}

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .valid(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

fn main() {
  let cli = Cli::parse();
  ui::init_logger(cli.global.verbose);

  if let Err(err) = run(cli) {
    handle_error(err);
  }
}

fn run(cli: Cli) -> AffectedResult<()> {
  let root = std::env::current_dir().context("Failed to get current directory")?;
  let file = FileConfig::load(&root)?;
  let config = AffectedConfig::resolve(&root, file, cli.into_options())?;
  commands::run_affected(&config)
}

fn handle_error(err: AffectedError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}
