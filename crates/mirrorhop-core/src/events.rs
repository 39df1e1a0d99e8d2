//! Progress and result events emitted during a failover run.
//!
//! The coordinator never touches a UI. It emits [`RedirectEvent`]s to an
//! injected [`StatusReporter`], which decides how (or whether) to show them.

use crate::candidate::Candidate;
use crate::probe::DecisionReason;
use serde::Serialize;

/// Why a candidate was passed over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RejectReason {
    /// The probe ran and decided not-live.
    Offline {
        /// The deciding signal.
        #[serde(flatten)]
        reason: DecisionReason,
    },
    /// The candidate URL could not be used at all.
    InvalidCandidate {
        /// Parser or validation message.
        message: String,
    },
    /// The prober returned an unexpected error.
    ProbeFailed {
        /// Error message.
        message: String,
    },
}

impl RejectReason {
    /// Short human-readable description.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Offline { reason } => format!("offline ({})", reason.describe()),
            Self::InvalidCandidate { message } => format!("invalid candidate ({message})"),
            Self::ProbeFailed { message } => format!("probe failed ({message})"),
        }
    }
}

/// Event stream consumed by status reporters and navigators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RedirectEvent {
    /// A run started over `total` candidates.
    Started {
        /// Number of candidates in the list.
        total: usize,
    },
    /// Candidate `index` (zero-based) is being probed.
    Testing {
        /// Zero-based position in the list.
        index: usize,
        /// List length.
        total: usize,
        /// The candidate under test.
        candidate: Candidate,
    },
    /// Candidate `index` was passed over.
    Rejected {
        /// Zero-based position in the list.
        index: usize,
        /// The rejected candidate.
        candidate: Candidate,
        /// Why it was rejected.
        reason: RejectReason,
    },
    /// A live candidate was selected.
    Selected {
        /// Zero-based position in the list.
        index: usize,
        /// The winning candidate.
        candidate: Candidate,
        /// Candidate with the query string appended verbatim.
        redirect_url: String,
    },
    /// Every candidate was tried and none was live.
    Exhausted {
        /// Number of candidates probed.
        attempted: usize,
    },
}

impl RedirectEvent {
    /// Banner text for end users.
    #[must_use]
    pub fn status_message(&self) -> String {
        match self {
            Self::Started { .. } => "Checking available servers...".to_string(),
            Self::Testing { index, total, .. } => {
                format!("Testing server {} of {total}...", index + 1)
            },
            Self::Rejected { index, .. } => format!("Server {} unavailable", index + 1),
            Self::Selected { .. } => "Redirecting...".to_string(),
            Self::Exhausted { .. } => "Servers temporarily unavailable".to_string(),
        }
    }

    /// Whether this event ends a run.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Selected { .. } | Self::Exhausted { .. })
    }
}

/// Receives run events.
pub trait StatusReporter: Send + Sync {
    /// Handle one event.
    fn report(&self, event: &RedirectEvent);
}

/// Reporter that discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl StatusReporter for NullReporter {
    fn report(&self, _event: &RedirectEvent) {}
}

impl<F> StatusReporter for F
where
    F: Fn(&RedirectEvent) + Send + Sync,
{
    fn report(&self, event: &RedirectEvent) {
        self(event);
    }
}
