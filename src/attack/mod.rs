//! ATT&CK release selection and download
//!
//! ATT&CK is published as one STIX bundle per domain, tagged per release
//! in the MITRE CTI repository. This module builds the raw-content URL for
//! a release and fetches it through a [`BundleSource`].

mod source;

pub use source::{BundleSource, FetchError, HttpSource, StaticSource, DEFAULT_TIMEOUT_SECONDS};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use stix_bundle::Bundle;

/// Default location of the published ATT&CK bundles
pub const DEFAULT_BASE_URL: &str = "https://raw.githubusercontent.com/mitre/cti";

/// Default ATT&CK release
pub const DEFAULT_VERSION: &str = "9.0";

/// ATT&CK domain (matrix)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Domain {
    #[default]
    EnterpriseAttack,
    MobileAttack,
    PreAttack,
}

impl Domain {
    pub const ALL: [Domain; 3] = [Domain::EnterpriseAttack, Domain::MobileAttack, Domain::PreAttack];

    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::EnterpriseAttack => "enterprise-attack",
            Domain::MobileAttack => "mobile-attack",
            Domain::PreAttack => "pre-attack",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for unrecognized domain names
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown ATT&CK domain '{0}' (expected enterprise-attack, mobile-attack or pre-attack)")]
pub struct UnknownDomain(pub String);

impl FromStr for Domain {
    type Err = UnknownDomain;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Domain::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| UnknownDomain(s.to_string()))
    }
}

/// A specific ATT&CK release of one domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttackRelease {
    pub base_url: String,
    pub version: String,
    pub domain: Domain,
}

impl AttackRelease {
    pub fn new(version: impl Into<String>, domain: Domain) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            version: version.into(),
            domain,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// URL of the release's bundle; `&` in the tag is percent-encoded
    pub fn url(&self) -> String {
        format!(
            "{}/ATT%26CK-v{}/{}/{}.json",
            self.base_url.trim_end_matches('/'),
            self.version,
            self.domain,
            self.domain
        )
    }
}

/// Download and parse the ATT&CK bundle for a release
pub fn fetch_attack(source: &dyn BundleSource, release: &AttackRelease) -> Result<Bundle, FetchError> {
    let url = release.url();
    tracing::debug!(%url, "fetching ATT&CK bundle");
    let bytes = source.fetch(&url)?;
    let bundle = Bundle::from_slice(&bytes).map_err(|source| FetchError::Bundle { url, source })?;
    tracing::debug!(objects = bundle.len(), "parsed ATT&CK bundle");
    Ok(bundle)
}
