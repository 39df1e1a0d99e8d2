//! Error types and handling for mirrorhop-core operations.
//!
//! Per-candidate failures (offline mirrors, timeouts, unreachable hosts) are
//! not errors at all: the prober folds them into a [`Verdict`]. What remains
//! here are the conditions a caller has to react to differently:
//!
//! - **Invalid candidates**: a configured mirror URL that cannot be parsed.
//!   Fatal for that candidate only; the coordinator logs it and moves on.
//! - **Empty candidate lists**: fail fast before any probing happens.
//! - **Configuration errors**: unreadable or invalid config files.
//! - **I/O and network errors**: client construction and collaborator failures.
//!
//! ## Categories
//!
//! ```rust
//! use mirrorhop_core::Error;
//!
//! let err = Error::invalid_candidate("mirror-a", "relative URL without a base");
//! assert_eq!(err.category(), "invalid_candidate");
//! assert_eq!(Error::NoCandidatesConfigured.category(), "no_candidates");
//! ```
//!
//! [`Verdict`]: crate::Verdict

use thiserror::Error;

/// The main error type for mirrorhop-core operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation failed.
    ///
    /// Raised by collaborators that touch the filesystem, such as a
    /// query store persisting the last query string.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Network operation failed outside of a probe.
    ///
    /// Probe loads never surface this; it covers building the HTTP client.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A candidate mirror URL is malformed.
    ///
    /// The URL did not parse, is not `http`/`https`, or has no host. This is
    /// reported separately from "offline" so callers can tell a typo in the
    /// mirror list apart from a mirror that is down.
    #[error("Invalid candidate '{candidate}': {reason}")]
    InvalidCandidate {
        /// The candidate string as configured.
        candidate: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The candidate list is empty.
    ///
    /// Raised before any probing begins.
    #[error("No candidates configured")]
    NoCandidatesConfigured,

    /// Configuration is invalid or inaccessible.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error for uncategorized failures.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Build an [`Error::InvalidCandidate`].
    pub fn invalid_candidate(candidate: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidCandidate {
            candidate: candidate.into(),
            reason: reason.into(),
        }
    }

    /// Get the error category as a string identifier for logging.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::Network(_) => "network",
            Self::InvalidCandidate { .. } => "invalid_candidate",
            Self::NoCandidatesConfigured => "no_candidates",
            Self::Config(_) => "config",
            Self::Other(_) => "other",
        }
    }
}

/// Convenience type alias for Results with mirrorhop-core errors.
pub type Result<T> = std::result::Result<T, Error>;
