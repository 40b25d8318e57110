//! STIX 2.0 bundle envelope
//!
//! Input bundles are read only for their `objects` array; every other
//! envelope field is ignored and a fresh envelope is produced on output.
//! Output is pretty-printed with sorted keys and 4-space indentation so
//! that regenerated files diff cleanly.

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::record::{value_kind, Record, RecordError};
use crate::{BUNDLE_ID_PREFIX, BUNDLE_TYPE, SPEC_VERSION};

/// Indentation used for written bundles
const INDENT: &[u8] = b"    ";

/// Errors for bundle parsing and serialization
#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("bundle must be a JSON object, found {found}")]
    NotAnObject { found: &'static str },

    #[error("bundle has no 'objects' array")]
    MissingObjects,

    #[error("objects[{index}]: {source}")]
    InvalidObject {
        index: usize,
        #[source]
        source: RecordError,
    },

    #[error("JCS canonicalization error: {0}")]
    JcsError(String),
}

/// A STIX bundle: an identifier plus an ordered list of records
#[derive(Debug, Clone, PartialEq)]
pub struct Bundle {
    id: String,
    objects: Vec<Record>,
}

/// Serialized envelope. Fields are declared in key order so the written
/// document is sorted at the top level as well.
#[derive(Serialize)]
struct Envelope<'a> {
    id: &'a str,
    objects: &'a [Record],
    spec_version: &'a str,
    #[serde(rename = "type")]
    bundle_type: &'a str,
}

impl Bundle {
    /// Wrap records in a bundle with a freshly generated id
    pub fn new(objects: Vec<Record>) -> Self {
        Self::with_id(generate_id(), objects)
    }

    /// Wrap records in a bundle with a caller-chosen id
    pub fn with_id(id: impl Into<String>, objects: Vec<Record>) -> Self {
        Self {
            id: id.into(),
            objects,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn objects(&self) -> &[Record] {
        &self.objects
    }

    pub fn into_objects(self) -> Vec<Record> {
        self.objects
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Parse a bundle document from raw bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self, BundleError> {
        let value: Value = serde_json::from_slice(bytes)?;
        Self::from_value(value)
    }

    /// Parse a bundle document from a reader
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, BundleError> {
        let value: Value = serde_json::from_reader(reader)?;
        Self::from_value(value)
    }

    /// Load a bundle document from disk
    pub fn load(path: &Path) -> Result<Self, BundleError> {
        let bytes = fs::read(path)?;
        Self::from_slice(&bytes)
    }

    /// Extract the `objects` array from a parsed document
    pub fn from_value(value: Value) -> Result<Self, BundleError> {
        let mut map = match value {
            Value::Object(map) => map,
            other => {
                return Err(BundleError::NotAnObject {
                    found: value_kind(&other),
                })
            }
        };

        let objects = match map.remove("objects") {
            Some(Value::Array(items)) => items,
            _ => return Err(BundleError::MissingObjects),
        };

        let records = objects
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                Record::from_value(item).map_err(|source| BundleError::InvalidObject { index, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(records))
    }

    fn envelope(&self) -> Envelope<'_> {
        Envelope {
            id: &self.id,
            objects: &self.objects,
            spec_version: SPEC_VERSION,
            bundle_type: BUNDLE_TYPE,
        }
    }

    /// Serialize with sorted keys and 4-space indentation
    pub fn to_pretty_json(&self) -> Result<Vec<u8>, BundleError> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(INDENT);
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.envelope().serialize(&mut serializer)?;
        Ok(buf)
    }

    /// Write the pretty-printed bundle to a file, replacing any existing one
    pub fn write_to_file(&self, path: &Path) -> Result<(), BundleError> {
        let bytes = self.to_pretty_json()?;
        fs::write(path, bytes)?;
        Ok(())
    }

    /// SHA-256 of JCS(objects)
    ///
    /// Covers only the records, not the envelope, so the value is stable
    /// across runs even though each run mints a new bundle id.
    pub fn objects_sha256(&self) -> Result<String, BundleError> {
        let jcs_bytes = serde_json_canonicalizer::to_vec(&self.objects)
            .map_err(|e| BundleError::JcsError(e.to_string()))?;

        let mut hasher = Sha256::new();
        hasher.update(&jcs_bytes);
        Ok(hex::encode(hasher.finalize()))
    }
}

fn generate_id() -> String {
    format!("{}{}", BUNDLE_ID_PREFIX, uuid::Uuid::new_v4())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn records(values: Vec<Value>) -> Vec<Record> {
        values
            .into_iter()
            .map(|v| Record::from_value(v).unwrap())
            .collect()
    }

    #[test]
    fn test_new_generates_bundle_id() {
        let bundle = Bundle::new(vec![]);
        assert!(bundle.id().starts_with("bundle--"));
        assert_eq!(bundle.id().len(), "bundle--".len() + 36);
        assert_ne!(bundle.id(), Bundle::new(vec![]).id());
    }

    #[test]
    fn test_parse_reads_objects_only() {
        let doc = json!({
            "type": "bundle",
            "id": "bundle--old",
            "spec_version": "2.0",
            "objects": [{"id": "a1", "type": "attack-pattern"}, {"id": "a2"}]
        });
        let bundle = Bundle::from_slice(doc.to_string().as_bytes()).unwrap();
        assert_eq!(bundle.len(), 2);
        assert_eq!(bundle.objects()[0].id().unwrap(), "a1");
        assert_ne!(bundle.id(), "bundle--old");
    }

    #[test]
    fn test_parse_missing_objects() {
        let err = Bundle::from_slice(br#"{"type": "bundle"}"#).unwrap_err();
        assert!(matches!(err, BundleError::MissingObjects));

        let err = Bundle::from_slice(br#"{"objects": {"id": "a1"}}"#).unwrap_err();
        assert!(matches!(err, BundleError::MissingObjects));
    }

    #[test]
    fn test_parse_rejects_non_object_document() {
        let err = Bundle::from_slice(b"[1, 2]").unwrap_err();
        assert!(matches!(err, BundleError::NotAnObject { found: "array" }));
    }

    #[test]
    fn test_parse_rejects_non_object_record() {
        let err = Bundle::from_slice(br#"{"objects": [{"id": "a1"}, "oops"]}"#).unwrap_err();
        match err {
            BundleError::InvalidObject { index, .. } => assert_eq!(index, 1),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_malformed_json() {
        let err = Bundle::from_slice(b"{\"objects\": [").unwrap_err();
        assert!(matches!(err, BundleError::Json(_)));
    }

    #[test]
    fn test_pretty_json_sorted_and_indented() {
        let bundle = Bundle::with_id(
            "bundle--fixed",
            records(vec![json!({"type": "x", "id": "a1", "name": "Zürich"})]),
        );
        let text = String::from_utf8(bundle.to_pretty_json().unwrap()).unwrap();
        let expected = r#"{
    "id": "bundle--fixed",
    "objects": [
        {
            "id": "a1",
            "name": "Zürich",
            "type": "x"
        }
    ],
    "spec_version": "2.0",
    "type": "bundle"
}"#;
        assert_eq!(text, expected);
    }

    #[test]
    fn test_written_file_parses_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.json");
        let bundle = Bundle::with_id("bundle--fixed", records(vec![json!({"id": "a1"})]));
        bundle.write_to_file(&path).unwrap();

        let loaded = Bundle::load(&path).unwrap();
        assert_eq!(loaded.objects(), bundle.objects());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = Bundle::load(&dir.path().join("absent.json")).unwrap_err();
        match err {
            BundleError::Io(e) => assert_eq!(e.kind(), io::ErrorKind::NotFound),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_objects_sha256_ignores_bundle_id() {
        let objects = records(vec![json!({"id": "a1"}), json!({"id": "v1"})]);
        let first = Bundle::new(objects.clone());
        let second = Bundle::new(objects);
        assert_ne!(first.id(), second.id());
        assert_eq!(first.objects_sha256().unwrap(), second.objects_sha256().unwrap());
        assert_eq!(first.objects_sha256().unwrap().len(), 64);
    }

    #[test]
    fn test_objects_sha256_depends_on_order() {
        let a = Bundle::new(records(vec![json!({"id": "a1"}), json!({"id": "v1"})]));
        let b = Bundle::new(records(vec![json!({"id": "v1"}), json!({"id": "a1"})]));
        assert_ne!(a.objects_sha256().unwrap(), b.objects_sha256().unwrap());
    }
}
