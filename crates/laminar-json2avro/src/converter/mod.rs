//! Schema-guided JSON ↔ Avro converter.
//!
//! [`JsonAvroConverter`] owns an Avro schema and converts JSON documents
//! into Avro values that conform to it, and back. It implements
//! [`FormatDecoder`] and [`FormatEncoder`] for batch use.
//!
//! # Example
//!
//! ```
//! use laminar_json2avro::JsonAvroConverter;
//! use serde_json::json;
//!
//! let schema = r#"{
//!     "type": "record",
//!     "name": "user",
//!     "fields": [
//!         {"name": "name", "type": "string"},
//!         {"name": "age", "type": ["null", "int"], "default": null}
//!     ]
//! }"#;
//! let converter = JsonAvroConverter::from_schema_str(schema, Default::default()).unwrap();
//! let bytes = converter.convert_to_avro(br#"{"name": "ada"}"#).unwrap();
//! let back = converter.convert_to_json(&bytes).unwrap();
//! assert_eq!(
//!     serde_json::from_slice::<serde_json::Value>(&back).unwrap(),
//!     json!({"name": "ada", "age": null})
//! );
//! ```

mod reader;
mod writer;

use apache_avro::types::Value;
use apache_avro::Schema;
use serde_json::Value as JsonValue;
use tracing::debug;

use crate::config::ConverterConfig;
use crate::context::ConversionContext;
use crate::error::ConversionResult;
use crate::metrics::{ConversionStats, ConversionStatsSnapshot};
use crate::names::NamedSchemas;
use crate::traits::{FormatDecoder, FormatEncoder};
use crate::types::RawRecord;

use self::reader::JsonReader;
use self::writer::JsonWriter;

/// Converts between schema-less JSON and Avro values of one schema.
///
/// The schema and named-type table are immutable after construction, so
/// a converter can be shared across threads; every call builds its own
/// [`ConversionContext`].
pub struct JsonAvroConverter {
    /// Root schema every value conforms to.
    schema: Schema,
    /// Named types declared anywhere in `schema`.
    names: NamedSchemas,
    /// Default behavior flags.
    config: ConverterConfig,
    /// Cumulative counters.
    stats: ConversionStats,
}

impl JsonAvroConverter {
    /// Creates a converter with the default configuration.
    #[must_use]
    pub fn new(schema: Schema) -> Self {
        Self::with_config(schema, ConverterConfig::default())
    }

    /// Creates a converter with an explicit configuration.
    #[must_use]
    pub fn with_config(schema: Schema, config: ConverterConfig) -> Self {
        let names = NamedSchemas::from_schema(&schema);
        debug!(
            named_types = names.len(),
            unknown_fields = %config.unknown_fields,
            temporal_failure = %config.temporal_failure,
            "created JSON/Avro converter"
        );
        Self {
            schema,
            names,
            config,
            stats: ConversionStats::new(),
        }
    }

    /// Parses an Avro schema from its JSON text and creates a converter.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError::Avro`](crate::ConversionError::Avro) if
    /// the schema text is invalid.
    pub fn from_schema_str(schema: &str, config: ConverterConfig) -> ConversionResult<Self> {
        Ok(Self::with_config(Schema::parse_str(schema)?, config))
    }

    /// Returns the root schema.
    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Returns the default configuration.
    #[must_use]
    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Returns a snapshot of the cumulative counters.
    #[must_use]
    pub fn stats(&self) -> ConversionStatsSnapshot {
        self.stats.snapshot()
    }

    /// Converts a parsed JSON document into an Avro value.
    ///
    /// # Errors
    ///
    /// Returns a [`ConversionError`](crate::ConversionError) carrying the
    /// path of the first node that could not be converted. No partial
    /// value is ever returned.
    pub fn convert_value(&self, json: &JsonValue) -> ConversionResult<Value> {
        self.convert_value_with(json, &self.config)
    }

    /// Same as [`convert_value`](Self::convert_value), with a per-call
    /// configuration overriding the converter's default.
    ///
    /// # Errors
    ///
    /// See [`convert_value`](Self::convert_value).
    pub fn convert_value_with(&self, json: &JsonValue, config: &ConverterConfig) -> ConversionResult<Value> {
        let mut ctx = ConversionContext::new(config);
        let result = JsonReader::new(&self.names).read(&self.schema, json, &mut ctx);
        if let Err(e) = &result {
            debug!(error = %e, "JSON to Avro conversion failed");
        }
        self.stats.record_call(
            result.is_ok(),
            ctx.unknown_fields_dropped,
            ctx.temporal_values_omitted,
        );
        result
    }

    /// Parses raw JSON bytes and converts them.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError::InvalidJson`](crate::ConversionError::InvalidJson)
    /// for malformed input, otherwise see [`convert_value`](Self::convert_value).
    pub fn convert_to_record(&self, json: &[u8]) -> ConversionResult<Value> {
        let parsed: JsonValue = match serde_json::from_slice(json) {
            Ok(v) => v,
            Err(e) => {
                self.stats.record_call(false, 0, 0);
                return Err(e.into());
            }
        };
        self.convert_value(&parsed)
    }

    /// Converts raw JSON bytes into a single Avro binary datum.
    ///
    /// # Errors
    ///
    /// Returns a conversion error, or
    /// [`ConversionError::Avro`](crate::ConversionError::Avro) if encoding fails.
    pub fn convert_to_avro(&self, json: &[u8]) -> ConversionResult<Vec<u8>> {
        let record = self.convert_to_record(json)?;
        Ok(apache_avro::to_avro_datum(&self.schema, record)?)
    }

    /// Converts an Avro value conforming to the converter's schema into a
    /// JSON tree.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError::TypeMismatch`](crate::ConversionError::TypeMismatch)
    /// if the value does not follow the schema.
    pub fn record_to_json(&self, value: &Value) -> ConversionResult<JsonValue> {
        let mut ctx = ConversionContext::new(&self.config);
        JsonWriter::new(&self.names).write(&self.schema, value, &mut ctx)
    }

    /// Decodes a single Avro binary datum and renders it as JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError::Avro`](crate::ConversionError::Avro) if the
    /// datum cannot be decoded, otherwise see
    /// [`record_to_json`](Self::record_to_json).
    pub fn convert_to_json(&self, avro: &[u8]) -> ConversionResult<Vec<u8>> {
        let mut reader = avro;
        let value = apache_avro::from_avro_datum(&self.schema, &mut reader, None)?;
        let json = self.record_to_json(&value)?;
        Ok(serde_json::to_vec(&json)?)
    }
}

impl std::fmt::Debug for JsonAvroConverter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonAvroConverter")
            .field("config", &self.config)
            .field("named_types", &self.names.len())
            .finish_non_exhaustive()
    }
}

impl FormatDecoder for JsonAvroConverter {
    fn output_schema(&self) -> &Schema {
        &self.schema
    }

    fn decode_batch(&self, records: &[RawRecord]) -> ConversionResult<Vec<Value>> {
        records
            .iter()
            .enumerate()
            .map(|(index, record)| {
                self.convert_to_record(&record.value).map_err(|e| {
                    let key = record.key.as_deref().map(String::from_utf8_lossy);
                    debug!(index, key = ?key, "batch record rejected");
                    e
                })
            })
            .collect()
    }

    fn format_name(&self) -> &str {
        "json"
    }
}

impl FormatEncoder for JsonAvroConverter {
    fn input_schema(&self) -> &Schema {
        &self.schema
    }

    fn encode_batch(&self, values: &[Value]) -> ConversionResult<Vec<Vec<u8>>> {
        values
            .iter()
            .map(|value| -> ConversionResult<Vec<u8>> {
                Ok(serde_json::to_vec(&self.record_to_json(value)?)?)
            })
            .collect()
    }

    fn format_name(&self) -> &str {
        "json"
    }
}
