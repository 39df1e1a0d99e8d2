//! `mirrorhop resolve`: full failover run.

use anyhow::Result;
use mirrorhop_core::{Candidate, Config, Coordinator, Prober, RedirectSession, RunOutcome};
use serde::Serialize;
use std::time::Duration;
use tracing::warn;

use crate::cli::ResolveArgs;
use crate::error::CliError;
use crate::navigator::StdoutNavigator;
use crate::output::OutputFormat;
use crate::reporter::ConsoleReporter;
use crate::utils::store::FileQueryStore;

#[derive(Serialize)]
struct ResolveReport<'a> {
    #[serde(flatten)]
    outcome: &'a RunOutcome,
    redirect_url: Option<String>,
}

/// Execute the resolve command.
///
/// Positional candidates replace the configured list; `--timeout-ms` has
/// already been folded into `config`. On success the redirect URL is printed
/// to stdout (text) or included in the JSON document.
///
/// # Errors
///
/// Usage errors for an invalid configuration or an empty candidate list,
/// and [`CliError::unavailable`] when every candidate is offline.
pub async fn execute(args: ResolveArgs, mut config: Config, quiet: bool) -> Result<()> {
    if !args.candidates.is_empty() {
        config.candidates = args.candidates.iter().map(Candidate::new).collect();
    }

    let prober = Prober::from_config(&config).map_err(CliError::from)?;
    let coordinator = Coordinator::with_reporter(prober, ConsoleReporter::new(args.format, quiet));
    let delay = if args.no_delay {
        Duration::ZERO
    } else {
        config.navigation_delay()
    };
    let session = RedirectSession::new(coordinator, StdoutNavigator::new(args.format))
        .with_navigation_delay(delay);

    let store = if args.no_persist {
        None
    } else {
        match FileQueryStore::new() {
            Ok(store) => Some(store),
            Err(e) => {
                warn!(error = %e, "Query persistence disabled");
                None
            },
        }
    };

    let outcome = match store {
        Some(store) => {
            session
                .with_query_store(store)
                .start(&config.candidates, &args.query)
                .await
        },
        None => session.start(&config.candidates, &args.query).await,
    }
    .map_err(CliError::from)?;

    if args.format == OutputFormat::Json {
        let report = ResolveReport {
            outcome: &outcome,
            redirect_url: outcome.redirect_url(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    match outcome {
        RunOutcome::Selected { .. } => Ok(()),
        RunOutcome::Exhausted { attempted } => Err(CliError::unavailable(format!(
            "All {attempted} candidates are offline"
        ))
        .into()),
    }
}
