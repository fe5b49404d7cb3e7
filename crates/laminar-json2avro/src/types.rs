//! Input record type for batch conversion.

use serde_json::Value as JsonValue;

/// One JSON document as delivered by a source, before conversion.
///
/// Only the payload takes part in conversion. The key identifies the
/// record when a batch rejects it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    /// Message key, if the source has one.
    pub key: Option<Vec<u8>>,

    /// UTF-8 JSON payload.
    pub value: Vec<u8>,
}

impl RawRecord {
    /// Wraps a raw JSON payload.
    #[must_use]
    pub fn new(value: Vec<u8>) -> Self {
        Self {
            value,
            ..Self::default()
        }
    }

    /// Serializes an already-parsed JSON document as the payload.
    #[must_use]
    pub fn from_json(json: &JsonValue) -> Self {
        Self::new(json.to_string().into_bytes())
    }

    /// Attaches a message key.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<Vec<u8>>) -> Self {
        self.key = Some(key.into());
        self
    }
}
