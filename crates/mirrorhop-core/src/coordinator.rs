//! Sequential fallback across candidate mirrors.
//!
//! The coordinator walks the candidate list in priority order, probing one
//! candidate at a time and stopping at the first live verdict:
//!
//! ```text
//! Idle -> Probing(0) -> Probing(1) -> ... -> Selected(i) | Exhausted
//! ```
//!
//! Candidates are never probed in parallel and never retried within a run,
//! so the worst case wait is `candidates × timeout`. Invalid candidates and
//! probe failures are logged and skipped; they only advance the cursor.

use crate::candidate::Candidate;
use crate::events::{NullReporter, RedirectEvent, RejectReason, StatusReporter};
use crate::probe::LivenessProbe;
use crate::{Error, Result};
use serde::Serialize;
use tracing::{info, instrument, warn};

/// Cursor and outcome of one failover run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Not started.
    Idle,
    /// Probing the candidate at this index.
    Probing(usize),
    /// The candidate at this index was found live.
    Selected(usize),
    /// No candidate was live.
    Exhausted,
}

impl SessionState {
    /// Leave `Idle` and start probing at the head of the list.
    #[must_use]
    pub const fn begin(self) -> Self {
        match self {
            Self::Idle => Self::Probing(0),
            other => other,
        }
    }

    /// Apply a verdict for the candidate currently being probed.
    ///
    /// Terminal states absorb every verdict.
    #[must_use]
    pub const fn on_verdict(self, live: bool, total: usize) -> Self {
        match self {
            Self::Probing(index) if live => Self::Selected(index),
            Self::Probing(index) if index + 1 < total => Self::Probing(index + 1),
            Self::Probing(_) => Self::Exhausted,
            other => other,
        }
    }

    /// Whether the run has finished.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Selected(_) | Self::Exhausted)
    }
}

/// Terminal result of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunOutcome {
    /// A live candidate was found.
    Selected {
        /// Zero-based position in the list.
        index: usize,
        /// The winning candidate.
        candidate: Candidate,
        /// Query string forwarded verbatim.
        query: String,
    },
    /// No candidate was live.
    Exhausted {
        /// Number of candidates probed.
        attempted: usize,
    },
}

impl RunOutcome {
    /// The redirect URL for a selected candidate.
    #[must_use]
    pub fn redirect_url(&self) -> Option<String> {
        match self {
            Self::Selected {
                candidate, query, ..
            } => Some(candidate.redirect_url(query)),
            Self::Exhausted { .. } => None,
        }
    }

    /// The selected candidate, if any.
    #[must_use]
    pub const fn selected(&self) -> Option<&Candidate> {
        match self {
            Self::Selected { candidate, .. } => Some(candidate),
            Self::Exhausted { .. } => None,
        }
    }
}

/// Drives a prober across an ordered candidate list.
#[derive(Debug)]
pub struct Coordinator<P, R = NullReporter> {
    prober: P,
    reporter: R,
}

impl<P: LivenessProbe> Coordinator<P> {
    /// Create a coordinator that reports nothing.
    pub const fn new(prober: P) -> Self {
        Self {
            prober,
            reporter: NullReporter,
        }
    }
}

impl<P: LivenessProbe, R: StatusReporter> Coordinator<P, R> {
    /// Create a coordinator with an event sink.
    pub const fn with_reporter(prober: P, reporter: R) -> Self {
        Self { prober, reporter }
    }

    /// The underlying prober.
    pub const fn prober(&self) -> &P {
        &self.prober
    }

    /// Find the first live candidate.
    ///
    /// `query` is opaque: it is carried into the outcome untouched.
    ///
    /// # Errors
    ///
    /// Only [`Error::NoCandidatesConfigured`], before any probing. Every
    /// per-candidate failure is absorbed into list advancement.
    #[instrument(skip_all, fields(total = candidates.len()))]
    pub async fn find_available(&self, candidates: &[Candidate], query: &str) -> Result<RunOutcome> {
        if candidates.is_empty() {
            return Err(Error::NoCandidatesConfigured);
        }

        let total = candidates.len();
        self.reporter.report(&RedirectEvent::Started { total });

        let mut state = SessionState::Idle.begin();
        while let SessionState::Probing(index) = state {
            let candidate = &candidates[index];
            info!(index, candidate = %candidate, "Testing candidate {} of {total}", index + 1);
            self.reporter.report(&RedirectEvent::Testing {
                index,
                total,
                candidate: candidate.clone(),
            });

            let rejection = match self.prober.probe(candidate).await {
                Ok(outcome) if outcome.is_live() => None,
                Ok(outcome) => {
                    info!(candidate = %candidate, reason = %outcome.reason.describe(), "Candidate offline");
                    Some(RejectReason::Offline {
                        reason: outcome.reason,
                    })
                },
                Err(Error::InvalidCandidate { reason, .. }) => {
                    warn!(candidate = %candidate, reason = %reason, "Skipping invalid candidate");
                    Some(RejectReason::InvalidCandidate { message: reason })
                },
                Err(e) => {
                    warn!(candidate = %candidate, category = e.category(), error = %e, "Probe failed");
                    Some(RejectReason::ProbeFailed {
                        message: e.to_string(),
                    })
                },
            };

            if let Some(reason) = &rejection {
                self.reporter.report(&RedirectEvent::Rejected {
                    index,
                    candidate: candidate.clone(),
                    reason: reason.clone(),
                });
            }

            state = state.on_verdict(rejection.is_none(), total);
        }

        let outcome = match state {
            SessionState::Selected(index) => {
                let candidate = candidates[index].clone();
                info!(index, candidate = %candidate, "Selected live candidate");
                self.reporter.report(&RedirectEvent::Selected {
                    index,
                    candidate: candidate.clone(),
                    redirect_url: candidate.redirect_url(query),
                });
                RunOutcome::Selected {
                    index,
                    candidate,
                    query: query.to_string(),
                }
            },
            _ => {
                warn!(attempted = total, "All candidates are offline");
                self.reporter
                    .report(&RedirectEvent::Exhausted { attempted: total });
                RunOutcome::Exhausted { attempted: total }
            },
        };

        Ok(outcome)
    }
}
