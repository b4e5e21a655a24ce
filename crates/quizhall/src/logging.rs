//! Logging system setup.
//!
//! Structured logging through `tracing` with a level taken from the
//! config file (or forced to debug by `--debug`); `RUST_LOG` overrides
//! everything.

use anyhow::Result;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{Args, LoggingSettings};

/// Initialize the global tracing subscriber.
///
/// Safe to call more than once: only the first call installs the global
/// subscriber, later calls are no-ops.
pub fn setup_logging(args: &Args, settings: Option<&LoggingSettings>) -> Result<()> {
    let level = if args.debug {
        "debug"
    } else {
        settings.map(|s| s.level.as_str()).unwrap_or("info")
    };
    let json_format = settings.map(|s| s.json_format).unwrap_or(false);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(false))
            .try_init()
            .ok();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false))
            .try_init()
            .ok();
    }

    Ok(())
}
