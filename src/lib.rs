//! veris-attack - append the veris framework to ATT&CK
//!
//! Downloads an ATT&CK STIX bundle, appends the veris framework objects and
//! their veris -> ATT&CK mappings, and writes the combined bundle.

pub mod attack;
pub mod config;
pub mod merge;
pub mod pipeline;

pub use attack::{AttackRelease, BundleSource, Domain, FetchError, HttpSource, StaticSource};
pub use config::{ConfigError, Settings};
pub use merge::{merge, merge_bundles, MergeStats, Merged};
pub use pipeline::{run, PipelineError, RunReport};
pub use stix_bundle::{Bundle, BundleError, Record, RecordError};
