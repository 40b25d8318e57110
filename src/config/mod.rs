//! Layered configuration
//!
//! Settings are assembled from three layers, later layers winning:
//! 1. Built-in defaults
//! 2. Config file (`--config`, or ./veris-attack.toml when present)
//! 3. CLI flags that were given explicitly

mod defaults;
mod merge;
mod settings;

pub use defaults::{BuiltinDefaults, DEFAULT_CONFIG_FILE};
pub use merge::{deep_merge, merge_layers};
pub use settings::{resolve_config_path, AttackSettings, ConfigError, ConfigOrigin, ConfigSource, Settings};
