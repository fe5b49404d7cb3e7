//! Additional-properties collection and field-name matching.
//!
//! JSON keys that match no record field are gathered into a single
//! catch-all `map<string>` field. String values are kept verbatim; any
//! other value is rendered as canonical JSON text, so `{"extra": 42}`
//! becomes `"extra" -> "42"`.

use std::collections::HashMap;

use serde_json::{Map, Value as JsonValue};

use crate::scalar::render_json_text;

/// Renders every unmatched entry to a string. Each key appears exactly
/// once and no value is dropped.
#[must_use]
pub fn collect(unmatched: &Map<String, JsonValue>) -> HashMap<String, String> {
    unmatched
        .iter()
        .map(|(key, value)| (key.clone(), render_json_text(value)))
        .collect()
}

/// Same as [`collect`], but produces a JSON object of strings so the
/// result can be converted through the catch-all field's own schema.
#[must_use]
pub fn collect_as_json(unmatched: &Map<String, JsonValue>) -> Map<String, JsonValue> {
    collect(unmatched)
        .into_iter()
        .map(|(key, value)| (key, JsonValue::String(value)))
        .collect()
}

/// Replaces every character outside `[A-Za-z0-9_]` with `replacement`
/// and prefixes a leading digit, yielding a legal Avro field name.
#[must_use]
pub fn sanitize_field_name(name: &str, replacement: &str) -> String {
    let mut out = String::with_capacity(name.len());
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        out.push_str(replacement);
    }
    for c in name.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            out.push(c);
        } else {
            out.push_str(replacement);
        }
    }
    out
}
