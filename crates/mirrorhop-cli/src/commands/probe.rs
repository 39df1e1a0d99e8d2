//! `mirrorhop probe`: single-candidate diagnostic.

use anyhow::Result;
use colored::Colorize;
use mirrorhop_core::{Candidate, Config, DecisionReason, ProbeOutcome, Prober, Verdict};
use serde::Serialize;

use crate::cli::ProbeArgs;
use crate::error::CliError;
use crate::output::OutputFormat;

#[derive(Serialize)]
struct ProbeReport<'a> {
    candidate: &'a Candidate,
    verdict: Verdict,
    #[serde(flatten)]
    reason: DecisionReason,
    elapsed_ms: u64,
}

impl<'a> ProbeReport<'a> {
    fn new(candidate: &'a Candidate, outcome: &ProbeOutcome) -> Self {
        Self {
            candidate,
            verdict: outcome.verdict,
            reason: outcome.reason,
            elapsed_ms: u64::try_from(outcome.elapsed.as_millis()).unwrap_or(u64::MAX),
        }
    }

    fn render_text(&self) -> String {
        let label = match self.verdict {
            Verdict::Live => "LIVE".green().bold(),
            Verdict::NotLive => "OFFLINE".red().bold(),
        };
        format!(
            "{label} {} ({}, {} ms)",
            self.candidate,
            self.reason.describe(),
            self.elapsed_ms
        )
    }
}

/// Execute the probe command.
///
/// # Errors
///
/// A usage error for a malformed URL, [`CliError::timeout`] when no asset
/// answered in time and [`CliError::unavailable`] when every asset failed.
pub async fn execute(args: ProbeArgs, config: Config) -> Result<()> {
    let candidate = Candidate::new(args.url);
    candidate.parse().map_err(CliError::from)?;

    let prober = Prober::from_config(&config).map_err(CliError::from)?;
    let outcome = prober.check(&candidate).await.map_err(CliError::from)?;
    let report = ProbeReport::new(&candidate, &outcome);

    match args.format {
        OutputFormat::Text => println!("{}", report.render_text()),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    match outcome.reason {
        DecisionReason::FirstSuccess(_) => Ok(()),
        DecisionReason::TimedOut => Err(CliError::timeout(format!(
            "{candidate} did not answer within {} ms",
            config.timeout_ms
        ))
        .into()),
        DecisionReason::AllFailed => Err(CliError::unavailable(format!(
            "{candidate} is offline: {}",
            outcome.reason.describe()
        ))
        .into()),
    }
}
