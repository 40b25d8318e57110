//! Effective settings with provenance
//!
//! Merges the configuration layers into one JSON value, converts it to
//! typed [`Settings`] and records which sources contributed.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use super::defaults::{BuiltinDefaults, DEFAULT_CONFIG_FILE};
use super::merge::merge_layers;
use crate::attack::{AttackRelease, Domain};

/// Upper bound for the download timeout
const MAX_TIMEOUT_SECONDS: u64 = 3600;

/// Origin of a configuration layer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ConfigOrigin {
    Builtin,
    File,
    Cli,
}

/// A contributing config source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConfigSource {
    pub origin: ConfigOrigin,

    /// File path (None for builtin/cli)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// SHA-256 of the raw file bytes (None for builtin/cli)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

/// Download settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttackSettings {
    pub base_url: String,
    pub timeout_seconds: u64,
}

/// Fully resolved settings for one run
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    pub veris_objects: PathBuf,
    pub mappings: PathBuf,
    pub domain: Domain,
    pub version: String,
    pub allow_unmapped: bool,
    pub output: PathBuf,
    pub attack: AttackSettings,

    /// Contributing sources in precedence order
    #[serde(skip)]
    pub sources: Vec<ConfigSource>,
}

/// Config file for a run: the explicit one, else `veris-attack.toml` in `dir`
/// if it exists there.
pub fn resolve_config_path(explicit: Option<&Path>, dir: &Path) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => Some(dir.join(DEFAULT_CONFIG_FILE)).filter(|p| p.is_file()),
    }
}

impl Settings {
    /// Build settings from the defaults, a config file and CLI overrides.
    ///
    /// `config_path` must exist when given; use [`resolve_config_path`] to
    /// pick up the default file.
    pub fn build(config_path: Option<&Path>, cli_overrides: Option<Value>) -> Result<Self, ConfigError> {
        let mut layers = vec![BuiltinDefaults::default().to_value()];
        let mut sources = vec![ConfigSource {
            origin: ConfigOrigin::Builtin,
            path: None,
            digest: None,
        }];

        if let Some(path) = config_path {
            let (value, digest) = load_toml_file(path)?;
            tracing::debug!(path = %path.display(), %digest, "loaded config file");
            layers.push(value);
            sources.push(ConfigSource {
                origin: ConfigOrigin::File,
                path: Some(path.to_string_lossy().to_string()),
                digest: Some(digest),
            });
        }

        if let Some(cli) = cli_overrides {
            layers.push(cli);
            sources.push(ConfigSource {
                origin: ConfigOrigin::Cli,
                path: None,
                digest: None,
            });
        }

        let merged = merge_layers(layers);
        let mut settings: Settings =
            serde_json::from_value(merged).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        settings.validate()?;
        settings.sources = sources;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let timeout = self.attack.timeout_seconds;
        if timeout == 0 || timeout > MAX_TIMEOUT_SECONDS {
            return Err(ConfigError::ValidationError(format!(
                "attack.timeout_seconds must be in (0, {}]",
                MAX_TIMEOUT_SECONDS
            )));
        }

        if self.version.trim().is_empty() {
            return Err(ConfigError::ValidationError("version must not be empty".to_string()));
        }

        if self.attack.base_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "attack.base_url must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// The ATT&CK release these settings select
    pub fn release(&self) -> AttackRelease {
        AttackRelease::new(self.version.clone(), self.domain).with_base_url(self.attack.base_url.clone())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.attack.timeout_seconds)
    }
}

/// Load and parse a TOML file, returning the value and digest
fn load_toml_file(path: &Path) -> Result<(Value, String), ConfigError> {
    let bytes = fs::read(path)
        .map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;

    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let digest = hex::encode(hasher.finalize());

    let contents = String::from_utf8(bytes)
        .map_err(|e| ConfigError::ParseError(format!("{}: invalid UTF-8: {}", path.display(), e)))?;

    // Deserialize straight into JSON; TOML tables map onto objects
    let value: Value = toml::from_str(&contents)
        .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))?;

    Ok((value, digest))
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}
