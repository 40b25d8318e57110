//! Built-in defaults (layer 1)
//!
//! Paths are relative to the working directory and match the layout of the
//! mappings repository, where the tool is run from its `src/` folder.

use serde::Serialize;

use crate::attack::{Domain, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECONDS, DEFAULT_VERSION};

/// Config file picked up from the working directory when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "veris-attack.toml";

/// Built-in default configuration values
#[derive(Debug, Clone, Serialize)]
pub struct BuiltinDefaults {
    /// Veris framework bundle
    pub veris_objects: String,

    /// Veris -> ATT&CK mappings bundle
    pub mappings: String,

    /// ATT&CK domain to append to (default: enterprise-attack)
    pub domain: Domain,

    /// ATT&CK release (default: 9.0)
    pub version: String,

    /// Keep veris objects without mappings (default: false)
    pub allow_unmapped: bool,

    /// Where the merged bundle is written
    pub output: String,

    /// Where ATT&CK releases are downloaded from
    pub attack_base_url: String,

    /// Download timeout in seconds (default: 60)
    pub attack_timeout_seconds: u64,
}

impl Default for BuiltinDefaults {
    fn default() -> Self {
        Self {
            veris_objects: "../frameworks/veris/stix/veris135-enumerations.json".to_string(),
            mappings: "../frameworks/veris/stix/veris135-mappings.json".to_string(),
            domain: Domain::EnterpriseAttack,
            version: DEFAULT_VERSION.to_string(),
            allow_unmapped: false,
            output: "../frameworks/veris/stix/veris135-enterprise-attack.json".to_string(),
            attack_base_url: DEFAULT_BASE_URL.to_string(),
            attack_timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }
}

impl BuiltinDefaults {
    /// Convert to JSON Value for merging
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "veris_objects": self.veris_objects,
            "mappings": self.mappings,
            "domain": self.domain,
            "version": self.version,
            "allow_unmapped": self.allow_unmapped,
            "output": self.output,
            "attack": {
                "base_url": self.attack_base_url,
                "timeout_seconds": self.attack_timeout_seconds
            }
        })
    }
}
