//! STIX Bundle Types
//!
//! Defines the STIX 2.0 bundle envelope and the opaque records it carries.
//! Records are kept as JSON objects so that ATT&CK, veris and mapping
//! objects pass through untouched regardless of their schema.

pub mod bundle;
pub mod record;

pub use bundle::{Bundle, BundleError};
pub use record::{Record, RecordError};

/// STIX type of the bundle envelope.
pub const BUNDLE_TYPE: &str = "bundle";

/// STIX specification version written on output bundles.
pub const SPEC_VERSION: &str = "2.0";

/// Prefix of generated bundle identifiers.
pub const BUNDLE_ID_PREFIX: &str = "bundle--";
