//! Opaque STIX records
//!
//! A record is any JSON object found in a bundle's `objects` array. Only the
//! `id` and `source_ref` fields are ever read; everything else is carried
//! through as-is.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identifier field present on every STIX object
pub const ID_FIELD: &str = "id";

/// Field on mapping records naming the veris object they map from
pub const SOURCE_REF_FIELD: &str = "source_ref";

/// Errors raised when a required field cannot be read from a record
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error("record {record} is missing required field '{field}'")]
    MissingField { field: &'static str, record: String },

    #[error("record {record}: field '{field}' is not a string")]
    NotAString { field: &'static str, record: String },

    #[error("expected a JSON object, found {found}")]
    NotAnObject { found: &'static str },
}

/// A single STIX object, kept as an ordered key-value map
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    /// Wrap an existing JSON map
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Build a record from a JSON value, rejecting anything but an object
    pub fn from_value(value: Value) -> Result<Self, RecordError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(RecordError::NotAnObject {
                found: value_kind(&other),
            }),
        }
    }

    /// The record's `id`
    pub fn id(&self) -> Result<&str, RecordError> {
        self.str_field(ID_FIELD)
    }

    /// The record's `source_ref` (mapping records only)
    pub fn source_ref(&self) -> Result<&str, RecordError> {
        self.str_field(SOURCE_REF_FIELD)
    }

    /// Raw access to any field
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    fn str_field(&self, field: &'static str) -> Result<&str, RecordError> {
        match self.0.get(field) {
            Some(Value::String(s)) => Ok(s),
            Some(_) => Err(RecordError::NotAString {
                field,
                record: self.describe(),
            }),
            None => Err(RecordError::MissingField {
                field,
                record: self.describe(),
            }),
        }
    }

    /// Short human label for error messages: the id if there is one,
    /// otherwise the STIX type.
    fn describe(&self) -> String {
        if let Some(Value::String(id)) = self.0.get(ID_FIELD) {
            return format!("'{}'", id);
        }
        match self.0.get("type") {
            Some(Value::String(ty)) => format!("of type '{}' (no id)", ty),
            _ => "<unidentified>".to_string(),
        }
    }
}

impl From<Map<String, Value>> for Record {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

impl TryFrom<Value> for Record {
    type Error = RecordError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
