//! Status reporting on stderr.

use colored::Colorize;
use mirrorhop_core::{RedirectEvent, StatusReporter};

use crate::output::OutputFormat;

/// Prints run progress to stderr.
///
/// Text mode prints the banner line for each event, with the rejection
/// reason appended. JSON mode prints each event as one JSON line.
#[derive(Debug, Clone, Copy)]
pub struct ConsoleReporter {
    format: OutputFormat,
    quiet: bool,
}

impl ConsoleReporter {
    /// Create a reporter.
    #[must_use]
    pub const fn new(format: OutputFormat, quiet: bool) -> Self {
        Self { format, quiet }
    }

    fn render_text(event: &RedirectEvent) -> String {
        let message = event.status_message();
        match event {
            RedirectEvent::Started { .. } => message.bold().to_string(),
            RedirectEvent::Testing { candidate, .. } => {
                format!("{message} {}", candidate.as_str().dimmed())
            },
            RedirectEvent::Rejected { reason, .. } => {
                format!("{} ({})", message.yellow(), reason.describe())
            },
            RedirectEvent::Selected { .. } => message.green().to_string(),
            RedirectEvent::Exhausted { .. } => message.red().bold().to_string(),
        }
    }
}

impl StatusReporter for ConsoleReporter {
    fn report(&self, event: &RedirectEvent) {
        if self.quiet {
            return;
        }
        match self.format {
            OutputFormat::Text => eprintln!("{}", Self::render_text(event)),
            OutputFormat::Json => {
                if let Ok(line) = serde_json::to_string(event) {
                    eprintln!("{line}");
                }
            },
        }
    }
}
