//! Command-line argument parsing.

use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the Quizhall server.
///
/// Arguments override the corresponding configuration file settings.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Configuration file path
    ///
    /// Path to the TOML configuration file. If the file doesn't exist,
    /// a default configuration will be created there.
    #[arg(short, long, default_value = "quizhall.toml")]
    pub config: PathBuf,

    /// Server listen address
    ///
    /// Override the listen address from the configuration file.
    /// Format: "IP:PORT" (e.g., "127.0.0.1:5000" or "0.0.0.0:5000")
    #[arg(short, long)]
    pub listen: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    pub debug: bool,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            config: PathBuf::from("quizhall.toml"),
            listen: None,
            debug: false,
        }
    }
}
