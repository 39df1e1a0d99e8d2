//! Output format selection.

use clap::ValueEnum;
use serde::Serialize;

/// Output format for command results.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text with progress on stderr.
    #[default]
    Text,
    /// A single JSON document on stdout, events as JSON lines on stderr.
    Json,
}

impl OutputFormat {
    /// Check if this format is machine-readable.
    #[must_use]
    pub const fn is_machine_readable(self) -> bool {
        matches!(self, Self::Json)
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}
