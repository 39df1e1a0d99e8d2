//! Configuration for mirror failover runs.
//!
//! Configuration is stored in TOML and holds everything that is specific to
//! a deployment: the candidate mirrors in priority order, the assets that
//! fingerprint the real funnel, and the timing knobs.
//!
//! ## Resolution Order
//!
//! 1. An explicit path passed to [`Config::load_from`]
//! 2. The `MIRRORHOP_CONFIG` environment variable
//! 3. The platform config directory (`<config_dir>/config.toml`)
//! 4. Built-in defaults (no candidates)
//!
//! `MIRRORHOP_TIMEOUT_MS` overrides the probe timeout after loading, and a
//! timeout passed to [`Config::load_with`] overrides both.
//!
//! ## Example Configuration File
//!
//! ```toml
//! candidates = [
//!     "https://mirror-a.example/funnel/index.html",
//!     "https://mirror-b.example/funnel/index.html",
//! ]
//! timeout_ms = 5000
//! navigation_delay_ms = 500
//! strict_content_type = true
//!
//! [[assets]]
//! kind = "script"
//! path = "/funnel/js/pixel.js"
//!
//! [[assets]]
//! kind = "image"
//! path = "/funnel/images/hero.webp"
//!
//! [[assets]]
//! kind = "stylesheet"
//! path = "/funnel/css/site.css"
//! ```

use crate::candidate::{Candidate, ProbeAsset};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable pointing at a config file.
pub const CONFIG_ENV: &str = "MIRRORHOP_CONFIG";

/// Environment variable overriding the probe timeout in milliseconds.
pub const TIMEOUT_ENV: &str = "MIRRORHOP_TIMEOUT_MS";

const DEFAULT_TIMEOUT_MS: u64 = 5000;
const DEFAULT_NAVIGATION_DELAY_MS: u64 = 500;

/// Failover configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Mirror URLs, highest priority first.
    pub candidates: Vec<Candidate>,

    /// Per-candidate probe timeout in milliseconds.
    pub timeout_ms: u64,

    /// Pause between selecting a mirror and navigating to it.
    pub navigation_delay_ms: u64,

    /// Require asset responses to carry a matching `Content-Type`.
    pub strict_content_type: bool,

    /// User agent sent with probe requests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    /// Assets that only exist on a real deployment.
    pub assets: Vec<ProbeAsset>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            candidates: Vec::new(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            navigation_delay_ms: DEFAULT_NAVIGATION_DELAY_MS,
            strict_content_type: true,
            user_agent: None,
            assets: ProbeAsset::defaults(),
        }
    }
}

impl Config {
    /// Load configuration following the documented resolution order.
    ///
    /// A missing file at the platform location yields defaults; a missing
    /// file that was asked for explicitly is an error.
    pub fn load_from(explicit: Option<&Path>) -> Result<Self> {
        Self::load_with(explicit, None)
    }

    /// Like [`Config::load_from`], with a caller-supplied timeout that wins
    /// over both the file and `MIRRORHOP_TIMEOUT_MS`.
    ///
    /// Validation runs after the override, so a file with `timeout_ms = 0`
    /// or a malformed environment value is fine when the caller replaces it.
    pub fn load_with(explicit: Option<&Path>, timeout_ms: Option<u64>) -> Result<Self> {
        let requested = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));

        let mut config = match requested {
            Some(path) => Self::read(&path)?,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::read(&path)?,
                _ => Self::default(),
            },
        };

        match timeout_ms {
            Some(ms) => config.timeout_ms = ms,
            None => config.apply_env_overrides()?,
        }
        config.validate()?;
        Ok(config)
    }

    /// Load from the default locations.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    fn read(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config {}: {e}", path.display()))
        })?;
        toml::from_str(&content).map_err(|e| {
            Error::Config(format!("Failed to parse config {}: {e}", path.display()))
        })
    }

    /// Platform location of the config file, if one can be determined.
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("dev", "mirrorhop", "mirrorhop")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(value) = std::env::var(TIMEOUT_ENV) {
            self.timeout_ms = value.trim().parse().map_err(|_| {
                Error::Config(format!("{TIMEOUT_ENV} must be a number of milliseconds"))
            })?;
        }
        Ok(())
    }

    /// Check invariants that deserialization cannot express.
    ///
    /// An empty candidate list is allowed here; it is reported as
    /// [`Error::NoCandidatesConfigured`] when a run starts.
    pub fn validate(&self) -> Result<()> {
        if self.timeout_ms == 0 {
            return Err(Error::Config("timeout_ms must be greater than zero".into()));
        }
        if self.assets.is_empty() {
            return Err(Error::Config("at least one probe asset is required".into()));
        }
        if let Some(asset) = self.assets.iter().find(|a| a.path.trim().is_empty()) {
            return Err(Error::Config(format!(
                "probe asset of kind '{}' has an empty path",
                asset.kind
            )));
        }
        Ok(())
    }

    /// Probe timeout as a [`Duration`].
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Navigation delay as a [`Duration`].
    #[must_use]
    pub const fn navigation_delay(&self) -> Duration {
        Duration::from_millis(self.navigation_delay_ms)
    }

    /// User agent for probe requests.
    #[must_use]
    pub fn user_agent(&self) -> &str {
        self.user_agent
            .as_deref()
            .unwrap_or(concat!("mirrorhop/", env!("CARGO_PKG_VERSION")))
    }
}
