//! # CLI Structure and Argument Parsing
//!
//! ```bash
//! # Find the first live mirror from the config file and print the redirect URL
//! mirrorhop resolve --query "?utm_source=mail&id=7"
//!
//! # Override the candidate list on the command line
//! mirrorhop resolve https://a.example/f/index.html https://b.example/f/index.html
//!
//! # Diagnose one mirror
//! mirrorhop probe https://a.example/f/index.html --format json
//! ```

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::output::OutputFormat;

/// Main CLI structure for the `mirrorhop` command.
#[derive(Parser, Clone, Debug)]
#[command(name = "mirrorhop")]
#[command(version)]
#[command(about = "mirrorhop - Find the first live mirror and redirect to it", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug logging
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Suppress progress and informational messages (only show errors)
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable all ANSI colors in output (also respects `NO_COLOR` env)
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    /// Path to configuration file (overrides autodiscovery). Also via `MIRRORHOP_CONFIG`.
    #[arg(long, global = true, value_name = "FILE", env = "MIRRORHOP_CONFIG")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Output format of the selected command.
    #[must_use]
    pub const fn format(&self) -> OutputFormat {
        match &self.command {
            Commands::Resolve(args) => args.format,
            Commands::Probe(args) => args.format,
        }
    }

    /// Probe timeout given on the command line, if any.
    #[must_use]
    pub const fn timeout_ms(&self) -> Option<u64> {
        match &self.command {
            Commands::Resolve(args) => args.timeout_ms,
            Commands::Probe(args) => args.timeout_ms,
        }
    }
}

/// Available subcommands.
#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Probe candidates in order and print the redirect URL of the first live one
    Resolve(ResolveArgs),

    /// Probe a single candidate and show the verdict
    Probe(ProbeArgs),
}

/// Arguments for `mirrorhop resolve`.
#[derive(Args, Clone, Debug)]
pub struct ResolveArgs {
    /// Candidate URLs in priority order (replaces the configured list)
    #[arg(value_name = "CANDIDATE")]
    pub candidates: Vec<String>,

    /// Query string forwarded verbatim to the selected candidate (e.g. "?id=7")
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    pub query: String,

    /// Per-candidate probe timeout in milliseconds
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Do not save the query string to the data directory
    #[arg(long)]
    pub no_persist: bool,

    /// Skip the pause between selection and redirect
    #[arg(long)]
    pub no_delay: bool,
}

/// Arguments for `mirrorhop probe`.
#[derive(Args, Clone, Debug)]
pub struct ProbeArgs {
    /// Candidate URL to probe
    #[arg(value_name = "URL")]
    pub url: String,

    /// Probe timeout in milliseconds
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Output format
    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}
