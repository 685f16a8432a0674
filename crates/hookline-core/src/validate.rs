//! Pre-persistence checks on normalized records.
//!
//! Validation runs against the record's JSON document form, the same shape
//! that is written to the store, so a record that passes here has exactly
//! the fields the store expects.

use serde_json::Value;

use crate::{
    error::ValidationError,
    models::{EventAction, EventRecord},
};

/// Fields every stored record must carry, in check order.
pub const REQUIRED_FIELDS: [&str; 6] =
    ["request_id", "author", "action", "from_branch", "to_branch", "timestamp"];

/// Validates a record before it is handed to the store.
///
/// # Errors
///
/// Returns the first missing field, or an invalid action.
pub fn validate(record: &EventRecord) -> Result<(), ValidationError> {
    let document = serde_json::to_value(record).map_err(|e| ValidationError::InvalidPayload {
        kind: "record",
        reason: e.to_string(),
    })?;
    validate_document(&document)
}

/// Validates a record in document form.
///
/// A field that is absent or `null` counts as missing. Non-object documents
/// have no fields at all.
///
/// # Errors
///
/// Returns the first missing field, or an invalid action.
pub fn validate_document(document: &Value) -> Result<(), ValidationError> {
    for field in REQUIRED_FIELDS {
        if document.get(field).map_or(true, Value::is_null) {
            return Err(ValidationError::MissingField { field });
        }
    }

    match &document["action"] {
        Value::String(action) => action.parse::<EventAction>().map(|_| ()),
        other => Err(ValidationError::InvalidAction { value: other.to_string() }),
    }
}
