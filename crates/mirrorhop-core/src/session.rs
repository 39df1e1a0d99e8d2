//! End-to-end redirect session.
//!
//! Wires the [`Coordinator`] to the collaborators that sit outside the core:
//! a [`QueryStore`] that keeps a backup of the incoming query string, and a
//! [`Navigator`] that performs the final redirect. The session:
//!
//! 1. saves a non-empty query string (failures are logged, not fatal),
//! 2. runs the coordinator,
//! 3. on selection, waits the navigation delay and hands the redirect URL
//!    (candidate + query, verbatim) to the navigator.

use crate::candidate::Candidate;
use crate::coordinator::{Coordinator, RunOutcome};
use crate::events::StatusReporter;
use crate::probe::LivenessProbe;
use crate::Result;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Performs the final redirect.
#[async_trait]
pub trait Navigator: Send + Sync {
    /// Send the client to `url`.
    async fn navigate(&self, url: &str) -> Result<()>;
}

/// Keeps a backup copy of the incoming query string.
pub trait QueryStore: Send + Sync {
    /// Persist `query`. Only called with non-empty strings.
    fn save(&self, query: &str) -> Result<()>;
}

/// Query store that keeps nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopQueryStore;

impl QueryStore for NoopQueryStore {
    fn save(&self, _query: &str) -> Result<()> {
        Ok(())
    }
}

/// A coordinator run plus persistence and navigation.
#[derive(Debug)]
pub struct RedirectSession<P, R, N, Q = NoopQueryStore> {
    coordinator: Coordinator<P, R>,
    navigator: N,
    store: Q,
    navigation_delay: Duration,
}

impl<P, R, N> RedirectSession<P, R, N>
where
    P: LivenessProbe,
    R: StatusReporter,
    N: Navigator,
{
    /// Create a session with no query store and no navigation delay.
    pub const fn new(coordinator: Coordinator<P, R>, navigator: N) -> Self {
        Self {
            coordinator,
            navigator,
            store: NoopQueryStore,
            navigation_delay: Duration::ZERO,
        }
    }
}

impl<P, R, N, Q> RedirectSession<P, R, N, Q>
where
    P: LivenessProbe,
    R: StatusReporter,
    N: Navigator,
    Q: QueryStore,
{
    /// Replace the query store.
    #[must_use]
    pub fn with_query_store<S: QueryStore>(self, store: S) -> RedirectSession<P, R, N, S> {
        RedirectSession {
            coordinator: self.coordinator,
            navigator: self.navigator,
            store,
            navigation_delay: self.navigation_delay,
        }
    }

    /// Pause between selection and navigation.
    #[must_use]
    pub const fn with_navigation_delay(mut self, delay: Duration) -> Self {
        self.navigation_delay = delay;
        self
    }

    /// Run the session to completion.
    ///
    /// # Errors
    ///
    /// [`crate::Error::NoCandidatesConfigured`] for an empty list, or
    /// whatever the navigator reports.
    pub async fn start(&self, candidates: &[Candidate], query: &str) -> Result<RunOutcome> {
        if query.is_empty() {
            debug!("No query string to persist");
        } else if let Err(e) = self.store.save(query) {
            warn!(category = e.category(), error = %e, "Failed to persist query string");
        }

        let outcome = self.coordinator.find_available(candidates, query).await?;

        if let Some(url) = outcome.redirect_url() {
            if !self.navigation_delay.is_zero() {
                tokio::time::sleep(self.navigation_delay).await;
            }
            info!(url = %url, "Redirecting");
            self.navigator.navigate(&url).await?;
        }

        Ok(outcome)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::candidate::AssetKind;
    use crate::probe::{DecisionReason, ProbeOutcome};
    use crate::Error;
    use std::sync::{Arc, Mutex};

    struct FixedProbe {
        live: Option<&'static str>,
    }

    #[async_trait]
    impl LivenessProbe for FixedProbe {
        async fn probe(&self, candidate: &Candidate) -> Result<ProbeOutcome> {
            let reason = if Some(candidate.as_str()) == self.live {
                DecisionReason::FirstSuccess(AssetKind::Script)
            } else {
                DecisionReason::AllFailed
            };
            Ok(ProbeOutcome::new(reason, Duration::ZERO))
        }
    }

    #[derive(Default, Clone)]
    struct RecordingNavigator(Arc<Mutex<Vec<String>>>);

    #[async_trait]
    impl Navigator for RecordingNavigator {
        async fn navigate(&self, url: &str) -> Result<()> {
            self.0.lock().unwrap().push(url.to_string());
            Ok(())
        }
    }

    #[derive(Default, Clone)]
    struct RecordingStore(Arc<Mutex<Vec<String>>>);

    impl QueryStore for RecordingStore {
        fn save(&self, query: &str) -> Result<()> {
            self.0.lock().unwrap().push(query.to_string());
            Ok(())
        }
    }

    struct BrokenStore;

    impl QueryStore for BrokenStore {
        fn save(&self, _query: &str) -> Result<()> {
            Err(Error::Io(std::io::Error::other("disk full")))
        }
    }

    const A: &str = "https://a.example/f/index.html";
    const B: &str = "https://b.example/f/index.html";

    fn list() -> Vec<Candidate> {
        vec![Candidate::new(A), Candidate::new(B)]
    }

    #[tokio::test]
    async fn test_navigates_to_selected_candidate_with_query() {
        let navigator = RecordingNavigator::default();
        let store = RecordingStore::default();
        let session = RedirectSession::new(
            Coordinator::new(FixedProbe { live: Some(B) }),
            navigator.clone(),
        )
        .with_query_store(store.clone());

        let outcome = session.start(&list(), "?utm_source=x&id=7").await.unwrap();

        assert_eq!(outcome.selected(), Some(&Candidate::new(B)));
        assert_eq!(
            *navigator.0.lock().unwrap(),
            vec![format!("{B}?utm_source=x&id=7")]
        );
        assert_eq!(*store.0.lock().unwrap(), vec!["?utm_source=x&id=7"]);
    }

    #[tokio::test]
    async fn test_exhaustion_does_not_navigate() {
        let navigator = RecordingNavigator::default();
        let session =
            RedirectSession::new(Coordinator::new(FixedProbe { live: None }), navigator.clone());

        let outcome = session.start(&list(), "").await.unwrap();

        assert_eq!(outcome, RunOutcome::Exhausted { attempted: 2 });
        assert!(navigator.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_query_is_not_persisted() {
        let store = RecordingStore::default();
        let session = RedirectSession::new(
            Coordinator::new(FixedProbe { live: Some(A) }),
            RecordingNavigator::default(),
        )
        .with_query_store(store.clone());

        session.start(&list(), "").await.unwrap();

        assert!(store.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_does_not_block_redirect() {
        let navigator = RecordingNavigator::default();
        let session = RedirectSession::new(
            Coordinator::new(FixedProbe { live: Some(A) }),
            navigator.clone(),
        )
        .with_query_store(BrokenStore);

        session.start(&list(), "?id=1").await.unwrap();

        assert_eq!(navigator.0.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_candidate_list_is_an_error() {
        let session = RedirectSession::new(
            Coordinator::new(FixedProbe { live: None }),
            RecordingNavigator::default(),
        );

        let err = session.start(&[], "?id=1").await.unwrap_err();
        assert!(matches!(err, Error::NoCandidatesConfigured));
    }

    #[tokio::test(start_paused = true)]
    async fn test_navigation_waits_for_delay() {
        let navigator = RecordingNavigator::default();
        let session = RedirectSession::new(
            Coordinator::new(FixedProbe { live: Some(A) }),
            navigator.clone(),
        )
        .with_navigation_delay(Duration::from_millis(500));

        let started = tokio::time::Instant::now();
        session.start(&list(), "").await.unwrap();

        assert!(started.elapsed() >= Duration::from_millis(500));
        assert_eq!(navigator.0.lock().unwrap().len(), 1);
    }
}
