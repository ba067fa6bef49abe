//! Logging setup using the `tracing` ecosystem.
//!
//! Logs always go to stderr so stdout only ever carries the serialized result.
//! The level is chosen in this order:
//! 1. `RUST_LOG` environment variable
//! 2. `--verbose`: debug for this crate
//! 3. Default: warnings only

use std::io::IsTerminal;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber. Call once, before anything logs.
pub fn init_logger(verbose: bool) {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(verbose));

  let fmt_layer = fmt::layer()
    .with_writer(std::io::stderr)
    .with_target(false)
    .with_level(true)
    .with_ansi(std::io::stderr().is_terminal())
    .compact();

  // A subscriber may already be installed (tests); keep the first one
  let _ = tracing_subscriber::registry().with(filter).with(fmt_layer).try_init();
}

fn default_filter(verbose: bool) -> EnvFilter {
  if verbose {
    EnvFilter::new("affected=debug")
  } else {
    EnvFilter::new("affected=warn")
  }
}
