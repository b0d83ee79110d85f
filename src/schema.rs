//! JSON Schema for the structured (dict) form of an inventory.
//!
//! ```json
//! {"project": "...", "version": "...", "count": 2,
//!  "0": {"name": "...", "domain": "...", "role": "...",
//!        "priority": "...", "uri": "...", "dispname": "..."},
//!  "1": {...}}
//! ```
//!
//! The schema itself is handed to the `jsonschema` crate.  What a schema
//! cannot express (numbered keys running exactly `0..count`) is checked by
//! [`check_entry_keys`].

use serde_json::{json, Map, Value};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderField {
    Project,
    Version,
    Count,
}

impl HeaderField {
    pub const ALL: [HeaderField; 3] = [HeaderField::Project, HeaderField::Version, HeaderField::Count];

    pub fn as_str(self) -> &'static str {
        match self {
            HeaderField::Project => "project",
            HeaderField::Version => "version",
            HeaderField::Count   => "count",
        }
    }

    pub fn is_header_key(key: &str) -> bool {
        Self::ALL.iter().any(|f| f.as_str() == key)
    }
}

/// Field names every object entry must carry, in on-disk order.
pub const RECORD_FIELDS: [&str; 6] = ["name", "domain", "role", "priority", "uri", "dispname"];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Schema validation failed at '{path}': {message}")]
    Invalid { path: String, message: String },
    #[error("Unexpected object key '{key}' for count {count}")]
    UnexpectedEntryKey { key: String, count: usize },
    #[error("Invalid inventory schema: {0}")]
    BadSchema(String),
}

/// The fixed schema document.
pub fn json_schema() -> Value {
    let entry_props: Map<String, Value> = RECORD_FIELDS
        .iter()
        .map(|f| (f.to_string(), json!({"type": "string"})))
        .collect();

    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "object",
        "properties": {
            "project": {"type": "string"},
            "version": {"type": "string"},
            "count":   {"type": "integer", "minimum": 0},
        },
        "patternProperties": {
            "^\\d+$": {
                "type": "object",
                "properties": entry_props,
                "required": RECORD_FIELDS,
                "additionalProperties": false,
            }
        },
        "additionalProperties": false,
        "required": ["project", "version", "count"],
    })
}

/// Validation capability; the inventory only depends on this seam.
pub trait SchemaValidator {
    fn validate(&self, document: &Value) -> Result<(), SchemaError>;
}

pub struct JsonSchemaValidator {
    inner: jsonschema::Validator,
}

impl JsonSchemaValidator {
    pub fn new() -> Result<Self, SchemaError> {
        Self::with_schema(&json_schema())
    }

    pub fn with_schema(schema: &Value) -> Result<Self, SchemaError> {
        let inner = jsonschema::validator_for(schema)
            .map_err(|e| SchemaError::BadSchema(e.to_string()))?;
        Ok(Self { inner })
    }
}

impl SchemaValidator for JsonSchemaValidator {
    fn validate(&self, document: &Value) -> Result<(), SchemaError> {
        match self.inner.iter_errors(document).next() {
            None    => Ok(()),
            Some(e) => Err(SchemaError::Invalid {
                path:    e.instance_path.to_string(),
                message: e.to_string(),
            }),
        }
    }
}

/// Validate against the fixed inventory schema.
pub fn validate(document: &Value) -> Result<(), SchemaError> {
    JsonSchemaValidator::new()?.validate(document)
}

/// Number of object entries, i.e. every key that is not a header field.
pub fn count_entries(document: &Map<String, Value>) -> usize {
    document.keys().filter(|k| !HeaderField::is_header_key(k)).count()
}

/// Every non-header key must be the decimal form of an index in `0..count`.
pub fn check_entry_keys(document: &Map<String, Value>, count: usize) -> Result<(), SchemaError> {
    for key in document.keys().filter(|k| !HeaderField::is_header_key(k)) {
        let ok = matches!(key.parse::<usize>(), Ok(i) if i < count && i.to_string() == *key);
        if !ok {
            return Err(SchemaError::UnexpectedEntryKey { key: key.clone(), count });
        }
    }
    Ok(())
}
