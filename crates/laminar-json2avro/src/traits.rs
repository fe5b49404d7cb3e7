//! Batch codec traits.
//!
//! | Trait | Direction |
//! |-------|-----------|
//! | [`FormatDecoder`] | raw JSON records → Avro values |
//! | [`FormatEncoder`] | Avro values → JSON byte records |
//!
//! Both are synchronous and object-safe so hosts can hold them as
//! `Box<dyn FormatDecoder>`.

use apache_avro::types::Value;
use apache_avro::Schema;

use crate::error::{ConversionError, ConversionResult};
use crate::types::RawRecord;

// ── FormatDecoder ──────────────────────────────────────────────────

/// Decodes raw records into Avro values conforming to a fixed schema.
pub trait FormatDecoder: Send + Sync {
    /// Returns the Avro schema every decoded value conforms to.
    fn output_schema(&self) -> &Schema;

    /// Decodes a batch of raw records, one value per record.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConversionError`] encountered; no partial batch
    /// is returned.
    fn decode_batch(&self, records: &[RawRecord]) -> ConversionResult<Vec<Value>>;

    /// Decodes one record through [`decode_batch`](Self::decode_batch).
    ///
    /// # Errors
    ///
    /// Returns the [`ConversionError`] raised for the record.
    fn decode_one(&self, record: &RawRecord) -> ConversionResult<Value> {
        self.decode_batch(std::slice::from_ref(record))?
            .pop()
            .ok_or_else(|| ConversionError::UnsupportedSchema {
                path: "<root>".into(),
                detail: "decoder produced no value".into(),
            })
    }

    /// Short name of the input format, such as `"json"`.
    fn format_name(&self) -> &str;
}

// ── FormatEncoder ──────────────────────────────────────────────────

/// Encodes Avro values into raw byte records.
pub trait FormatEncoder: Send + Sync {
    /// Schema the encoded values must conform to.
    fn input_schema(&self) -> &Schema;

    /// Encodes values into one byte record each.
    ///
    /// # Errors
    ///
    /// Returns a [`ConversionError`] if a value does not conform to the
    /// schema.
    fn encode_batch(&self, values: &[Value]) -> ConversionResult<Vec<Vec<u8>>>;

    /// Short name of the output format, such as `"json"`.
    fn format_name(&self) -> &str;
}
