//! Candidates, probe assets and the probe targets derived from them.
//!
//! A [`Candidate`] is a mirror base URL as configured, minus surrounding
//! whitespace. It is only validated when it is probed, so one malformed entry never prevents the
//! rest of the list from loading.
//!
//! Liveness is judged against deep asset paths ([`ProbeAsset`]) rather than
//! the document root: a parked domain happily answers `200` at `/`, but it
//! does not serve the funnel's own scripts, images and stylesheets.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// One mirror endpoint eligible for redirection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Candidate(String);

impl Candidate {
    /// Wrap a configured mirror URL without validating it.
    ///
    /// Surrounding whitespace is stripped so the string that is validated
    /// is the same one that ends up in the redirect URL.
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.len() == raw.len() {
            Self(raw)
        } else {
            Self(trimmed.to_string())
        }
    }

    /// The candidate as configured, trimmed.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse and validate the candidate as an absolute `http`/`https` URL.
    pub fn parse(&self) -> Result<Url> {
        let url = Url::parse(&self.0)
            .map_err(|e| Error::invalid_candidate(&self.0, e.to_string()))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::invalid_candidate(
                &self.0,
                format!("unsupported scheme '{}'", url.scheme()),
            ));
        }

        if url.host_str().is_none_or(str::is_empty) {
            return Err(Error::invalid_candidate(&self.0, "missing host"));
        }

        Ok(url)
    }

    /// The candidate's origin (`scheme://host[:port]`) as a URL.
    pub fn origin(&self) -> Result<Url> {
        let url = self.parse()?;
        let origin = url.origin().ascii_serialization();
        Url::parse(&origin).map_err(|e| Error::invalid_candidate(&self.0, e.to_string()))
    }

    /// Build the redirect target by appending the query string verbatim.
    ///
    /// The query is not parsed, decoded or reordered.
    #[must_use]
    pub fn redirect_url(&self, query: &str) -> String {
        format!("{}{query}", self.0)
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Candidate {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Candidate {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<Candidate> for String {
    fn from(value: Candidate) -> Self {
        value.0
    }
}

/// Loading mechanism used for one probe asset.
///
/// Each kind is requested the way a browser would request it and has its
/// own idea of an acceptable response type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    /// A script resource (`<script src>`).
    Script,
    /// An image resource (`<img src>`).
    Image,
    /// A stylesheet resource (`<link rel="stylesheet">`).
    Stylesheet,
}

impl AssetKind {
    /// Short lowercase label used in logs and output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Script => "script",
            Self::Image => "image",
            Self::Stylesheet => "stylesheet",
        }
    }

    /// `Accept` header sent with the load.
    #[must_use]
    pub const fn accept_header(self) -> &'static str {
        match self {
            Self::Script => "application/javascript, text/javascript, */*;q=0.8",
            Self::Image => "image/avif,image/webp,image/apng,image/*,*/*;q=0.8",
            Self::Stylesheet => "text/css,*/*;q=0.1",
        }
    }

    /// Whether a response `Content-Type` is acceptable for this kind.
    ///
    /// Parameters such as `charset` are ignored and matching is
    /// case-insensitive.
    #[must_use]
    pub fn accepts_content_type(self, content_type: &str) -> bool {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match self {
            Self::Script => essence.contains("javascript") || essence.contains("ecmascript"),
            Self::Image => essence.starts_with("image/"),
            Self::Stylesheet => essence == "text/css",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A sub-resource that only exists on a real deployment of the funnel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeAsset {
    /// How the asset is loaded.
    pub kind: AssetKind,
    /// Path relative to the candidate origin (e.g. `/assets/app.js`).
    pub path: String,
}

impl ProbeAsset {
    /// Create a new probe asset.
    pub fn new(kind: AssetKind, path: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }

    /// The default asset set: one script, one image, one stylesheet.
    #[must_use]
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new(AssetKind::Script, "/assets/js/app.js"),
            Self::new(AssetKind::Image, "/assets/images/logo.webp"),
            Self::new(AssetKind::Stylesheet, "/assets/css/app.css"),
        ]
    }
}

/// A concrete URL to load for one asset during one probe attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeTarget {
    /// Loading mechanism.
    pub kind: AssetKind,
    /// Fully built URL including the cache-busting token.
    pub url: Url,
}

impl ProbeTarget {
    /// Query parameter carrying the cache-busting token.
    pub const CACHE_BUST_PARAM: &'static str = "t";

    /// Join `asset` onto `origin` and append the cache-busting token.
    pub fn build(origin: &Url, asset: &ProbeAsset, token: i64) -> Result<Self> {
        let path = asset.path.trim();
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };

        let mut url = origin
            .join(&path)
            .map_err(|e| Error::Config(format!("Invalid probe asset path '{path}': {e}")))?;
        url.query_pairs_mut()
            .append_pair(Self::CACHE_BUST_PARAM, &token.to_string());

        Ok(Self {
            kind: asset.kind,
            url,
        })
    }
}
