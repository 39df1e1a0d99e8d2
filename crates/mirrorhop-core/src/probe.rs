//! Liveness probing for a single candidate mirror.
//!
//! A probe fires one load per configured [`ProbeAsset`] at the candidate's
//! origin, all concurrently, and settles on the first definitive signal:
//!
//! 1. **Any success** - the first asset that loads makes the candidate live.
//!    This is a race, not a majority vote.
//! 2. **All failed** - once every load has reported failure the candidate is
//!    not live, without waiting for the timer.
//! 3. **Timeout** - if neither happens within the probe timeout the candidate
//!    is not live and the attempt is abandoned.
//!
//! Whichever fires first wins through a [`DecideOnce`] latch; later signals
//! are ignored and the remaining loads are cancelled.
//!
//! Loads go through the [`AssetLoader`] trait. [`HttpAssetLoader`] issues
//! real HTTP requests; tests substitute scripted loaders to control the
//! interleaving of signals.

use crate::candidate::{AssetKind, Candidate, ProbeAsset, ProbeTarget};
use crate::config::Config;
use crate::latch::DecideOnce;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, info, instrument};

/// Default per-candidate probe timeout.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_millis(5000);

/// Outcome of one liveness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// The candidate serves the real funnel assets.
    Live,
    /// The candidate is offline, parked, or too slow.
    NotLive,
}

impl Verdict {
    /// Whether this verdict selects the candidate.
    #[must_use]
    pub const fn is_live(self) -> bool {
        matches!(self, Self::Live)
    }
}

/// Which signal settled a probe.
///
/// Only [`DecisionReason::FirstSuccess`] yields [`Verdict::Live`]. The two
/// not-live reasons behave identically for the coordinator and exist for
/// diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "asset", rename_all = "snake_case")]
pub enum DecisionReason {
    /// An asset of this kind loaded successfully.
    FirstSuccess(AssetKind),
    /// Every asset load failed before the timeout.
    AllFailed,
    /// No decision was reached within the probe timeout.
    TimedOut,
}

impl DecisionReason {
    /// The verdict implied by this reason.
    #[must_use]
    pub const fn verdict(self) -> Verdict {
        match self {
            Self::FirstSuccess(_) => Verdict::Live,
            Self::AllFailed | Self::TimedOut => Verdict::NotLive,
        }
    }

    /// Short human-readable description.
    #[must_use]
    pub fn describe(self) -> String {
        match self {
            Self::FirstSuccess(kind) => format!("{kind} asset loaded"),
            Self::AllFailed => "all asset loads failed".to_string(),
            Self::TimedOut => "timed out".to_string(),
        }
    }
}

/// Result of probing one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeOutcome {
    /// Live or not.
    pub verdict: Verdict,
    /// The signal that decided it.
    pub reason: DecisionReason,
    /// Time from probe start to decision.
    pub elapsed: Duration,
}

impl ProbeOutcome {
    /// Build an outcome from the deciding signal.
    #[must_use]
    pub const fn new(reason: DecisionReason, elapsed: Duration) -> Self {
        Self {
            verdict: reason.verdict(),
            reason,
            elapsed,
        }
    }

    /// Shorthand for `self.verdict.is_live()`.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        self.verdict.is_live()
    }
}

/// Signal reported by a single asset load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSignal {
    /// The asset loaded.
    Success,
    /// The asset failed to load.
    Failure,
}

/// Loads one probe target and reports whether it succeeded.
///
/// Implementations must not panic on network failures; every failure mode
/// maps to [`LoadSignal::Failure`].
#[async_trait]
pub trait AssetLoader: Send + Sync + 'static {
    /// Load `target` and report the outcome.
    async fn load(&self, target: &ProbeTarget) -> LoadSignal;
}

/// Anything that can judge a candidate live or not.
///
/// The coordinator depends on this trait rather than on [`Prober`] so the
/// fallback logic can be exercised without a network.
#[async_trait]
pub trait LivenessProbe: Send + Sync {
    /// Probe `candidate`.
    ///
    /// Never fails for network reasons; the only error is
    /// [`Error::InvalidCandidate`].
    async fn probe(&self, candidate: &Candidate) -> Result<ProbeOutcome>;
}

/// HTTP-backed asset loader.
///
/// Each asset kind is requested with its own `Accept` header. A load counts
/// as successful on a 2xx status and, in strict mode, a `Content-Type` that
/// matches the asset kind (a missing header is tolerated). Strict mode is what
/// rejects parked domains that answer every path with an HTML page.
#[derive(Debug, Clone)]
pub struct HttpAssetLoader {
    client: Client,
    strict_content_type: bool,
}

impl HttpAssetLoader {
    /// Build a loader with its own HTTP client.
    pub fn new(timeout: Duration, user_agent: &str, strict_content_type: bool) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(Error::Network)?;

        Ok(Self::with_client(client, strict_content_type))
    }

    /// Build a loader around an existing client.
    #[must_use]
    pub const fn with_client(client: Client, strict_content_type: bool) -> Self {
        Self {
            client,
            strict_content_type,
        }
    }
}

#[async_trait]
impl AssetLoader for HttpAssetLoader {
    async fn load(&self, target: &ProbeTarget) -> LoadSignal {
        let response = match self
            .client
            .get(target.url.clone())
            .header(ACCEPT, target.kind.accept_header())
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                debug!(kind = %target.kind, url = %target.url, error = %e, "Asset request failed");
                return LoadSignal::Failure;
            },
        };

        let status = response.status();
        if !status.is_success() {
            debug!(kind = %target.kind, url = %target.url, status = %status, "Asset not served");
            return LoadSignal::Failure;
        }

        if self.strict_content_type {
            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok());

            if let Some(content_type) = content_type {
                if !target.kind.accepts_content_type(content_type) {
                    debug!(
                        kind = %target.kind,
                        url = %target.url,
                        content_type = %content_type,
                        "Asset served with wrong content type"
                    );
                    return LoadSignal::Failure;
                }
            }
        }

        LoadSignal::Success
    }
}

/// Multi-signal liveness prober.
#[derive(Debug)]
pub struct Prober<L: AssetLoader = HttpAssetLoader> {
    loader: Arc<L>,
    assets: Vec<ProbeAsset>,
    timeout: Duration,
}

impl Prober<HttpAssetLoader> {
    /// Build an HTTP prober from configuration.
    ///
    /// The HTTP client gets twice the probe timeout so a hung mirror is
    /// decided by the probe timer as [`DecisionReason::TimedOut`], never by
    /// client-side request failures racing it.
    pub fn from_config(config: &Config) -> Result<Self> {
        let timeout = config.timeout();
        let loader = HttpAssetLoader::new(
            timeout.saturating_mul(2),
            config.user_agent(),
            config.strict_content_type,
        )?;
        Self::new(loader, config.assets.clone(), timeout)
    }
}

impl<L: AssetLoader> Prober<L> {
    /// Create a prober.
    ///
    /// Fails if `assets` is empty or `timeout` is zero.
    pub fn new(loader: L, assets: Vec<ProbeAsset>, timeout: Duration) -> Result<Self> {
        if assets.is_empty() {
            return Err(Error::Config("At least one probe asset is required".into()));
        }
        if timeout.is_zero() {
            return Err(Error::Config("Probe timeout must be positive".into()));
        }

        Ok(Self {
            loader: Arc::new(loader),
            assets,
            timeout,
        })
    }

    /// The per-candidate timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The assets loaded on every probe.
    #[must_use]
    pub fn assets(&self) -> &[ProbeAsset] {
        &self.assets
    }

    /// Build this attempt's targets with a fresh cache-busting token.
    fn targets(&self, candidate: &Candidate) -> Result<Vec<ProbeTarget>> {
        let origin = candidate.origin()?;
        let token = chrono::Utc::now().timestamp_millis();
        self.assets
            .iter()
            .map(|asset| ProbeTarget::build(&origin, asset, token))
            .collect()
    }

    /// Probe `candidate` and settle on the first definitive signal.
    #[instrument(skip_all, fields(candidate = %candidate))]
    pub async fn check(&self, candidate: &Candidate) -> Result<ProbeOutcome> {
        let targets = self.targets(candidate)?;
        let started = Instant::now();

        let (latch, decision) = DecideOnce::new();
        let latch = Arc::new(latch);
        let pending = Arc::new(AtomicUsize::new(targets.len()));
        let mut tasks = JoinSet::new();

        for target in targets {
            let loader = Arc::clone(&self.loader);
            let latch = Arc::clone(&latch);
            let pending = Arc::clone(&pending);

            tasks.spawn(async move {
                match loader.load(&target).await {
                    LoadSignal::Success => {
                        if latch.decide(DecisionReason::FirstSuccess(target.kind)) {
                            debug!(kind = %target.kind, url = %target.url, "Asset loaded");
                        }
                    },
                    LoadSignal::Failure => {
                        if pending.fetch_sub(1, Ordering::AcqRel) == 1 {
                            latch.decide(DecisionReason::AllFailed);
                        }
                    },
                }
            });
        }

        let timeout = self.timeout;
        let timer_latch = Arc::clone(&latch);
        tasks.spawn(async move {
            tokio::time::sleep(timeout).await;
            timer_latch.decide(DecisionReason::TimedOut);
        });

        let reason = decision.await.unwrap_or(DecisionReason::TimedOut);
        tasks.abort_all();

        let outcome = ProbeOutcome::new(reason, started.elapsed());
        info!(
            verdict = ?outcome.verdict,
            reason = %reason.describe(),
            elapsed_ms = u64::try_from(outcome.elapsed.as_millis()).unwrap_or(u64::MAX),
            "Probe decided"
        );
        Ok(outcome)
    }
}

#[async_trait]
impl<L: AssetLoader> LivenessProbe for Prober<L> {
    async fn probe(&self, candidate: &Candidate) -> Result<ProbeOutcome> {
        self.check(candidate).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SCRIPT: &str = "/funnel/js/pixel.js";
    const IMAGE: &str = "/funnel/images/hero.webp";
    const STYLESHEET: &str = "/funnel/css/site.css";

    fn assets() -> Vec<ProbeAsset> {
        vec![
            ProbeAsset::new(AssetKind::Script, SCRIPT),
            ProbeAsset::new(AssetKind::Image, IMAGE),
            ProbeAsset::new(AssetKind::Stylesheet, STYLESHEET),
        ]
    }

    fn http_prober(timeout: Duration, strict: bool) -> Prober {
        let loader = HttpAssetLoader::new(timeout, "mirrorhop-test", strict).unwrap();
        Prober::new(loader, assets(), timeout).unwrap()
    }

    async fn mount(server: &MockServer, asset_path: &str, template: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path(asset_path))
            .respond_with(template)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_single_image_success_is_live() {
        let server = MockServer::start().await;
        mount(&server, SCRIPT, ResponseTemplate::new(404)).await;
        mount(
            &server,
            IMAGE,
            ResponseTemplate::new(200).insert_header("content-type", "image/webp"),
        )
        .await;
        mount(&server, STYLESHEET, ResponseTemplate::new(404)).await;

        let candidate = Candidate::new(format!("{}/funnel/index.html", server.uri()));
        let outcome = http_prober(Duration::from_secs(5), true)
            .check(&candidate)
            .await
            .unwrap();

        assert_eq!(outcome.verdict, Verdict::Live);
        assert_eq!(outcome.reason, DecisionReason::FirstSuccess(AssetKind::Image));
    }

    #[tokio::test]
    async fn test_all_missing_assets_fail_before_timeout() {
        let server = MockServer::start().await;
        mount(&server, SCRIPT, ResponseTemplate::new(404)).await;
        mount(&server, IMAGE, ResponseTemplate::new(404)).await;
        mount(&server, STYLESHEET, ResponseTemplate::new(500)).await;

        let candidate = Candidate::new(server.uri());
        let outcome = http_prober(Duration::from_secs(5), true)
            .check(&candidate)
            .await
            .unwrap();

        assert_eq!(outcome.verdict, Verdict::NotLive);
        assert_eq!(outcome.reason, DecisionReason::AllFailed);
        assert!(
            outcome.elapsed < Duration::from_secs(5),
            "all-failed should not wait for the timeout"
        );
    }

    #[tokio::test]
    async fn test_parked_page_is_not_live_in_strict_mode() {
        let server = MockServer::start().await;

        // Parked domains answer every path with the same HTML page
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html; charset=utf-8")
                    .set_body_string("<html><body>This domain is for sale</body></html>"),
            )
            .mount(&server)
            .await;

        let candidate = Candidate::new(server.uri());

        let strict = http_prober(Duration::from_secs(5), true)
            .check(&candidate)
            .await
            .unwrap();
        assert_eq!(strict.reason, DecisionReason::AllFailed);

        let lenient = http_prober(Duration::from_secs(5), false)
            .check(&candidate)
            .await
            .unwrap();
        assert!(lenient.is_live());
    }

    #[tokio::test]
    async fn test_missing_content_type_is_accepted_in_strict_mode() {
        let server = MockServer::start().await;
        mount(&server, SCRIPT, ResponseTemplate::new(404)).await;
        mount(&server, IMAGE, ResponseTemplate::new(404)).await;
        mount(&server, STYLESHEET, ResponseTemplate::new(200)).await;

        let candidate = Candidate::new(server.uri());
        let outcome = http_prober(Duration::from_secs(5), true)
            .check(&candidate)
            .await
            .unwrap();

        assert_eq!(
            outcome.reason,
            DecisionReason::FirstSuccess(AssetKind::Stylesheet)
        );
        assert!(outcome.is_live());
    }

    #[tokio::test]
    async fn test_configured_prober_reports_hung_mirror_as_timed_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let config = Config {
            timeout_ms: 300,
            assets: assets(),
            ..Config::default()
        };
        let outcome = Prober::from_config(&config)
            .unwrap()
            .check(&Candidate::new(server.uri()))
            .await
            .unwrap();

        assert_eq!(outcome.reason, DecisionReason::TimedOut);
    }

    #[tokio::test]
    async fn test_slow_mirror_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let timeout = Duration::from_millis(300);
        let candidate = Candidate::new(server.uri());
        let outcome = Prober::new(
            HttpAssetLoader::new(Duration::from_secs(10), "mirrorhop-test", true).unwrap(),
            assets(),
            timeout,
        )
        .unwrap()
        .check(&candidate)
        .await
        .unwrap();

        assert_eq!(outcome.reason, DecisionReason::TimedOut);
        assert!(outcome.elapsed >= timeout);
        assert!(outcome.elapsed < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_requests_carry_cache_busting_token() {
        let server = MockServer::start().await;
        mount(&server, SCRIPT, ResponseTemplate::new(404)).await;
        mount(&server, IMAGE, ResponseTemplate::new(404)).await;
        mount(&server, STYLESHEET, ResponseTemplate::new(404)).await;

        let candidate = Candidate::new(server.uri());
        http_prober(Duration::from_secs(5), true)
            .check(&candidate)
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 3);
        for request in requests {
            let has_token = request
                .url
                .query_pairs()
                .any(|(k, v)| k == ProbeTarget::CACHE_BUST_PARAM && v.parse::<i64>().is_ok());
            assert!(has_token, "missing cache-busting token on {}", request.url);
        }
    }

    #[tokio::test]
    async fn test_unreachable_host_is_not_live() {
        // Port 9 (discard) is not listening on test machines
        let candidate = Candidate::new("http://127.0.0.1:9/");
        let outcome = http_prober(Duration::from_secs(2), true)
            .check(&candidate)
            .await
            .unwrap();

        assert_eq!(outcome.verdict, Verdict::NotLive);
    }

    #[tokio::test]
    async fn test_invalid_candidate_is_an_error() {
        let err = http_prober(Duration::from_secs(1), true)
            .check(&Candidate::new("not a url"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InvalidCandidate { .. }));
    }

    #[test]
    fn test_prober_rejects_empty_assets() {
        let loader = HttpAssetLoader::new(Duration::from_secs(1), "t", true).unwrap();
        let err = Prober::new(loader, Vec::new(), Duration::from_secs(1)).unwrap_err();
        assert_eq!(err.category(), "config");
    }

    #[test]
    fn test_prober_rejects_zero_timeout() {
        let loader = HttpAssetLoader::new(Duration::from_secs(1), "t", true).unwrap();
        assert!(Prober::new(loader, assets(), Duration::ZERO).is_err());
    }

    // Scripted loaders: deterministic signal interleavings on paused time

    #[derive(Clone, Copy)]
    enum Script {
        After(u64, LoadSignal),
        Never,
    }

    struct ScriptedLoader {
        scripts: HashMap<AssetKind, Script>,
        completed: Arc<AtomicUsize>,
    }

    impl ScriptedLoader {
        fn new(script: Script, image: Script, stylesheet: Script) -> Self {
            Self {
                scripts: HashMap::from([
                    (AssetKind::Script, script),
                    (AssetKind::Image, image),
                    (AssetKind::Stylesheet, stylesheet),
                ]),
                completed: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait]
    impl AssetLoader for ScriptedLoader {
        async fn load(&self, target: &ProbeTarget) -> LoadSignal {
            match self.scripts[&target.kind] {
                Script::After(ms, signal) => {
                    tokio::time::sleep(Duration::from_millis(ms)).await;
                    self.completed.fetch_add(1, Ordering::SeqCst);
                    signal
                },
                Script::Never => std::future::pending().await,
            }
        }
    }

    async fn run_scripted(loader: ScriptedLoader, timeout_ms: u64) -> ProbeOutcome {
        Prober::new(loader, assets(), Duration::from_millis(timeout_ms))
            .unwrap()
            .check(&Candidate::new("https://mirror.example.com/"))
            .await
            .unwrap()
    }

    use LoadSignal::{Failure, Success};

    #[tokio::test(start_paused = true)]
    async fn test_first_success_wins_over_earlier_failures() {
        let loader = ScriptedLoader::new(
            Script::After(100, Failure),
            Script::After(300, Success),
            Script::After(200, Failure),
        );
        let outcome = run_scripted(loader, 5000).await;

        assert_eq!(outcome.reason, DecisionReason::FirstSuccess(AssetKind::Image));
        assert!(outcome.elapsed >= Duration::from_millis(300));
        assert!(outcome.elapsed < Duration::from_millis(350));
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_is_not_overwritten_by_later_failures() {
        let loader = ScriptedLoader::new(
            Script::After(50, Success),
            Script::After(60, Failure),
            Script::After(70, Failure),
        );
        let outcome = run_scripted(loader, 5000).await;

        assert_eq!(outcome.reason, DecisionReason::FirstSuccess(AssetKind::Script));
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_failed_resolves_at_last_failure() {
        let loader = ScriptedLoader::new(
            Script::After(100, Failure),
            Script::After(1000, Failure),
            Script::After(400, Failure),
        );
        let outcome = run_scripted(loader, 5000).await;

        assert_eq!(outcome.reason, DecisionReason::AllFailed);
        assert!(outcome.elapsed >= Duration::from_millis(1000));
        assert!(outcome.elapsed < Duration::from_millis(1050));
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_success_after_timeout_is_ignored() {
        let loader = ScriptedLoader::new(
            Script::After(100, Failure),
            Script::After(6000, Success),
            Script::Never,
        );
        let outcome = run_scripted(loader, 5000).await;

        assert_eq!(outcome.verdict, Verdict::NotLive);
        assert_eq!(outcome.reason, DecisionReason::TimedOut);
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_probe_resolves_at_timeout() {
        let loader = ScriptedLoader::new(Script::Never, Script::Never, Script::Never);
        let outcome = run_scripted(loader, 5000).await;

        assert_eq!(outcome.reason, DecisionReason::TimedOut);
        assert!(outcome.elapsed >= Duration::from_millis(5000));
        assert!(outcome.elapsed < Duration::from_millis(5050));
    }

    #[tokio::test(start_paused = true)]
    async fn test_outstanding_loads_are_cancelled_after_decision() {
        let loader = ScriptedLoader::new(
            Script::After(10, Success),
            Script::After(1000, Failure),
            Script::After(2000, Success),
        );
        let completed = Arc::clone(&loader.completed);
        let outcome = run_scripted(loader, 5000).await;
        assert!(outcome.is_live());

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(
            completed.load(Ordering::SeqCst),
            1,
            "sibling loads should be aborted once decided"
        );
    }

    #[test]
    fn test_reason_maps_to_verdict() {
        assert_eq!(
            DecisionReason::FirstSuccess(AssetKind::Stylesheet).verdict(),
            Verdict::Live
        );
        assert_eq!(DecisionReason::AllFailed.verdict(), Verdict::NotLive);
        assert_eq!(DecisionReason::TimedOut.verdict(), Verdict::NotLive);
    }

    #[test]
    fn test_reason_serializes_with_asset() {
        let json =
            serde_json::to_value(DecisionReason::FirstSuccess(AssetKind::Image)).unwrap();
        assert_eq!(json["reason"], "first_success");
        assert_eq!(json["asset"], "image");

        let json = serde_json::to_value(DecisionReason::TimedOut).unwrap();
        assert_eq!(json["reason"], "timed_out");
    }
}
