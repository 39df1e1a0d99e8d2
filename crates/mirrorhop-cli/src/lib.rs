//! mirrorhop CLI library.
//!
//! The binary is a thin wrapper around [`run`]; errors map to exit codes
//! through [`error`].

use anyhow::Result;
use clap::Parser;
use mirrorhop_core::Config;

mod cli;
mod commands;
pub mod error;
mod navigator;
mod output;
mod reporter;
mod utils;

use cli::{Cli, Commands};
use error::CliError;

/// Parse arguments, load configuration and run the selected command.
///
/// # Errors
///
/// Any command failure; use [`error::exit_code_from_error`] for the exit code.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    utils::logging::initialize_logging(&cli)?;

    let config =
        Config::load_with(cli.config.as_deref(), cli.timeout_ms()).map_err(CliError::from)?;

    match cli.command {
        Commands::Resolve(args) => commands::resolve::execute(args, config, cli.quiet).await,
        Commands::Probe(args) => commands::probe::execute(args, config).await,
    }
}
