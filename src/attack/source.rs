//! Byte sources for remote bundles
//!
//! Abstracts the network for testability:
//! - BundleSource trait: fetch the bytes behind a URL
//! - HttpSource: blocking HTTPS client for production
//! - StaticSource: in-memory URL table for tests and offline runs

use std::collections::HashMap;
use std::time::Duration;

use stix_bundle::BundleError;

/// Default request timeout for downloads
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 60;

/// Anything that can return the body behind a URL
pub trait BundleSource {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Fetch errors
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("GET {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("no content registered for {0}")]
    NotFound(String),

    #[error("invalid bundle at {url}: {source}")]
    Bundle {
        url: String,
        #[source]
        source: BundleError,
    },
}

/// Blocking HTTP(S) source; certificates are always verified
pub struct HttpSource {
    client: reqwest::blocking::Client,
}

impl HttpSource {
    /// Create a client with the default timeout
    pub fn new() -> Result<Self, FetchError> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("veris-attack/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

impl BundleSource for HttpSource {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self.client.get(url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let body = response.bytes()?;
        tracing::debug!(url, bytes = body.len(), "download complete");
        Ok(body.to_vec())
    }
}

/// Fixed URL -> body table
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    bodies: HashMap<String, Vec<u8>>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the body returned for `url`
    pub fn with(mut self, url: impl Into<String>, body: Vec<u8>) -> Self {
        self.bodies.insert(url.into(), body);
        self
    }
}

impl BundleSource for StaticSource {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.bodies
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(url.to_string()))
    }
}
