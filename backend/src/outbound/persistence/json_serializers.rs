//! JSONB helpers for the document-shaped farm and consumer tables.
//!
//! List columns are stored as JSON arrays of the domain's serde form.
//! Decoding failures surface as strings so each adapter can wrap them in its
//! own query error.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Encode a slice as a JSON array.
pub(super) fn to_json_array<T: Serialize>(items: &[T], column: &str) -> Result<Value, String> {
    serde_json::to_value(items).map_err(|e| format!("{column} encode: {e}"))
}

/// Encode one item as a single-element array, ready for `jsonb ||`.
pub(super) fn to_json_singleton<T: Serialize>(item: &T, column: &str) -> Result<Value, String> {
    serde_json::to_value(item)
        .map(|value| Value::Array(vec![value]))
        .map_err(|e| format!("{column} encode: {e}"))
}

/// Decode a JSON array column. `null` reads as empty.
pub(super) fn from_json_array<T: DeserializeOwned>(
    value: Value,
    column: &str,
) -> Result<Vec<T>, String> {
    if value.is_null() {
        return Ok(Vec::new());
    }
    serde_json::from_value(value).map_err(|e| format!("{column} decode: {e}"))
}
