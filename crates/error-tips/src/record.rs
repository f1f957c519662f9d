//! Error records produced by an upstream parser.
//!
//! A record is a JSON object with a required string `type` field (the error kind) plus any
//! number of extra fields that message templates read during substitution.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Name of the field that identifies the error kind.
pub const TYPE_FIELD: &str = "type";

/// Errors produced while building an [`ErrorRecord`].
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("error record must be a JSON object")]
    /// The value was not a JSON object.
    NotAnObject,

    #[error("error record has no `type` field")]
    /// The required `type` field was absent.
    MissingType,

    #[error("error record `type` must be a string, found {0}")]
    /// The `type` field held something other than a string.
    TypeNotString(Value),

    #[error("invalid error record JSON: {0}")]
    /// The record text was not valid JSON.
    Json(#[from] serde_json::Error),
}

/// A structured diagnostic: a type tag plus auxiliary fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct ErrorRecord {
    error_type: String,
    value: Value,
}

impl ErrorRecord {
    /// Create a record with only a `type` field.
    pub fn new(error_type: impl Into<String>) -> Self {
        let error_type = error_type.into();
        let mut fields = Map::new();
        fields.insert(TYPE_FIELD.to_string(), Value::String(error_type.clone()));
        Self {
            error_type,
            value: Value::Object(fields),
        }
    }

    /// Add (or replace) a field.
    ///
    /// The `type` field is fixed at construction; attempts to overwrite it are ignored.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        if key == TYPE_FIELD {
            tracing::debug!(error_type = %self.error_type, "ignoring attempt to overwrite record type");
            return self;
        }
        if let Value::Object(fields) = &mut self.value {
            fields.insert(key, value.into());
        }
        self
    }

    /// Build a record from an arbitrary JSON value.
    pub fn from_value(value: Value) -> Result<Self, RecordError> {
        let Value::Object(fields) = &value else {
            return Err(RecordError::NotAnObject);
        };
        let error_type = match fields.get(TYPE_FIELD) {
            None => return Err(RecordError::MissingType),
            Some(Value::String(s)) => s.clone(),
            Some(other) => return Err(RecordError::TypeNotString(other.clone())),
        };
        Ok(Self { error_type, value })
    }

    /// Parse a record from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self, RecordError> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// The error kind (the `type` field).
    pub fn error_type(&self) -> &str {
        &self.error_type
    }

    /// The whole record as a JSON object, `type` included.
    pub fn as_value(&self) -> &Value {
        &self.value
    }

    /// Look up a field by dotted path (`openTag.start`, `attributes.0.name`).
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        lookup_path(&self.value, path)
    }
}

impl TryFrom<Value> for ErrorRecord {
    type Error = RecordError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

impl From<ErrorRecord> for Value {
    fn from(record: ErrorRecord) -> Self {
        record.value
    }
}

/// Resolve a dotted path against a JSON value.
///
/// Object segments are keys, array segments are zero-based indexes. An empty path resolves to
/// `root` itself.
pub fn lookup_path<'v>(root: &'v Value, path: &str) -> Option<&'v Value> {
    let path = path.trim();
    if path.is_empty() {
        return Some(root);
    }

    let mut current = root;
    for segment in path.split('.') {
        current = match current {
            Value::Object(fields) => fields.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}
