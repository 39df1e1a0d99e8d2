//! # mirrorhop-core
//!
//! Core functionality for mirrorhop - client-side style failover across an
//! ordered list of mirror deployments.
//!
//! A redirect funnel is often published on several domains. Some of those
//! domains get blocked, expire, or are taken over by parking pages that answer
//! `200 OK` for every path. This crate finds the first candidate that still
//! serves the real deployment and produces the redirect target for it.
//!
//! ## Architecture
//!
//! - **Candidates**: Mirror URLs and the probe assets that fingerprint a deployment
//! - **Probing**: Concurrent asset loads per candidate, first success wins, bounded by a timeout
//! - **Coordination**: Strictly sequential fallback across candidates with status events
//! - **Session**: Query persistence, navigation delay, and the final redirect
//! - **Error Handling**: Structured error types with categorization and recovery hints
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mirrorhop_core::{Config, Coordinator, Prober, Result, RunOutcome};
//!
//! # async fn demo() -> Result<()> {
//! let config = Config::load()?;
//! let coordinator = Coordinator::new(Prober::from_config(&config)?);
//!
//! match coordinator.find_available(&config.candidates, "?id=7").await? {
//!     RunOutcome::Selected { candidate, .. } => println!("live: {candidate}"),
//!     RunOutcome::Exhausted { attempted } => println!("{attempted} mirrors offline"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Timing
//!
//! - **Per candidate**: at most one probe timeout (default 5s)
//! - **Worst case**: `candidates × timeout`, since candidates are never probed in parallel
//! - **Late signals**: ignored once a candidate's verdict is decided

/// Candidate URLs and probe asset definitions
pub mod candidate;
/// Configuration loading and validation
pub mod config;
/// Sequential fallback across candidates
pub mod coordinator;
/// Error types and result aliases
pub mod error;
/// Run events and status reporting
pub mod events;
/// First-writer-wins decision primitive
pub mod latch;
/// Per-candidate liveness probing
pub mod probe;
/// Redirect session with persistence and navigation
pub mod session;

pub use candidate::{AssetKind, Candidate, ProbeAsset, ProbeTarget};
pub use config::Config;
pub use coordinator::{Coordinator, RunOutcome, SessionState};
pub use error::{Error, Result};
pub use events::{NullReporter, RedirectEvent, RejectReason, StatusReporter};
pub use latch::DecideOnce;
pub use probe::{
    AssetLoader, DecisionReason, HttpAssetLoader, LivenessProbe, LoadSignal, ProbeOutcome,
    Prober, Verdict,
};
pub use session::{Navigator, NoopQueryStore, QueryStore, RedirectSession};
