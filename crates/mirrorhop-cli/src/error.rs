//! CLI error handling with semantic exit codes.
//!
//! Failures are categorized so shell scripts and health checks can tell an
//! offline mirror set apart from a broken config or a flaky network.
//!
//! # Exit Code Categories
//!
//! | Code | Category | Description |
//! |------|----------|-------------|
//! | 0 | Success | A live candidate was found |
//! | 1 | `Internal` | Unexpected/internal error |
//! | 2 | `Usage` | Invalid arguments or configuration |
//! | 3 | `Unavailable` | Every candidate is offline |
//! | 5 | `Network` | Network failure outside of probing |
//! | 6 | `Timeout` | `probe` gave up waiting for the candidate |
//!
//! # Usage
//!
//! ```bash
//! mirrorhop resolve --query "?id=7"
//! case $? in
//!     0) echo "redirect ready" ;;
//!     3) echo "all mirrors down" ;;
//!     *) echo "other error" ;;
//! esac
//! ```

use std::fmt;

/// Semantic error category determining the exit code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorCategory {
    /// Unexpected or internal error (exit code 1).
    Internal = 1,

    /// Invalid arguments or configuration (exit code 2).
    ///
    /// Covers bad flags, unreadable config files, an empty candidate list,
    /// and a malformed candidate passed to `probe`.
    Usage = 2,

    /// No live candidate (exit code 3).
    ///
    /// The run completed normally and every candidate was rejected.
    Unavailable = 3,

    /// Network failure (exit code 5).
    Network = 5,

    /// Operation timed out (exit code 6).
    ///
    /// `probe` uses this when no asset answered within the timeout, so a
    /// slow mirror can be told apart from one that refuses every asset.
    Timeout = 6,
}

impl ErrorCategory {
    /// Get the exit code for this category.
    #[must_use]
    pub const fn exit_code(self) -> u8 {
        self as u8
    }

    /// Get a short description of this error category.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Internal => "internal error",
            Self::Usage => "usage error",
            Self::Unavailable => "unavailable",
            Self::Network => "network error",
            Self::Timeout => "timeout",
        }
    }

    /// Infer the error category from an error message.
    ///
    /// Fallback for errors that were never explicitly categorized.
    #[must_use]
    pub fn infer_from_message(msg: &str) -> Self {
        let msg_lower = msg.to_lowercase();

        // Before Network so "connection timed out" lands here
        if msg_lower.contains("timeout") || msg_lower.contains("timed out") {
            return Self::Timeout;
        }

        if msg_lower.contains("network")
            || msg_lower.contains("connection")
            || msg_lower.contains("dns")
            || msg_lower.contains("unreachable")
        {
            return Self::Network;
        }

        if msg_lower.contains("offline") || msg_lower.contains("unavailable") {
            return Self::Unavailable;
        }

        if msg_lower.contains("invalid argument")
            || msg_lower.contains("invalid value")
            || msg_lower.contains("config")
            || msg_lower.contains("no candidates")
        {
            return Self::Usage;
        }

        Self::Internal
    }

    /// Category for a core library error.
    #[must_use]
    pub const fn from_core(err: &mirrorhop_core::Error) -> Self {
        use mirrorhop_core::Error;
        match err {
            Error::Config(_) | Error::NoCandidatesConfigured | Error::InvalidCandidate { .. } => {
                Self::Usage
            },
            Error::Network(_) => Self::Network,
            Error::Io(_) | Error::Other(_) => Self::Internal,
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// A CLI error with a semantic category for exit code mapping.
///
/// ```rust,ignore
/// use mirrorhop_cli::error::CliError;
///
/// let err = CliError::unavailable("All 3 candidates are offline");
/// assert_eq!(err.exit_code(), 3);
/// ```
#[derive(Debug)]
pub struct CliError {
    /// The semantic category of this error.
    pub category: ErrorCategory,
    /// The underlying error with full context.
    pub source: anyhow::Error,
}

impl CliError {
    /// Create a new CLI error with explicit category.
    pub fn new(category: ErrorCategory, source: impl Into<anyhow::Error>) -> Self {
        Self {
            category,
            source: source.into(),
        }
    }

    /// Create an unavailable error from a message.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Unavailable, anyhow::anyhow!(message.into()))
    }

    /// Create a timeout error from a message.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Timeout, anyhow::anyhow!(message.into()))
    }

    /// Get the exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.category.exit_code()
    }
}

impl From<mirrorhop_core::Error> for CliError {
    fn from(err: mirrorhop_core::Error) -> Self {
        Self::new(ErrorCategory::from_core(&err), err)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}

/// Determine the exit code from an `anyhow::Error`.
///
/// Prefers an explicit [`CliError`], then a core error, then the message.
#[must_use]
pub fn exit_code_from_error(err: &anyhow::Error) -> u8 {
    if let Some(cli_err) = err.downcast_ref::<CliError>() {
        return cli_err.exit_code();
    }
    if let Some(core_err) = err.downcast_ref::<mirrorhop_core::Error>() {
        return ErrorCategory::from_core(core_err).exit_code();
    }
    ErrorCategory::infer_from_message(&err.to_string()).exit_code()
}
