//! # `LaminarDB` JSON ↔ Avro
//!
//! Schema-guided conversion of schema-less JSON documents into Apache
//! Avro values, and back.
//!
//! The core is a recursive walk over an [`apache_avro::Schema`] in
//! lockstep with a [`serde_json::Value`]: records, unions, arrays, maps,
//! enums, fixed and the logical types (date/time, decimal, uuid) are
//! resolved against whatever JSON is present, with defaults, nullable
//! fields, unknown keys and lenient scalar coercion handled
//! deterministically. See [`JsonAvroConverter`].

#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

#[macro_use]
mod macros;

/// Catch-all collection of unmatched JSON keys
pub mod additional;
/// Converter configuration
pub mod config;
/// Per-call conversion state
pub mod context;
/// Schema-guided converter
pub mod converter;
/// Decimal logical type encoding
pub mod decimal;
/// Error types
pub mod error;
/// Conversion counters
pub mod metrics;
/// Named-type resolution
pub mod names;
/// Scalar coercion
pub mod scalar;
/// Date/time decoding
pub mod temporal;
/// Batch codec traits
pub mod traits;
/// Raw input records
pub mod types;

pub use config::{ConverterConfig, TemporalFailureStrategy, UnknownFieldStrategy};
pub use converter::JsonAvroConverter;
pub use error::{ConversionError, ConversionResult};
pub use metrics::{ConversionStats, ConversionStatsSnapshot};
pub use traits::{FormatDecoder, FormatEncoder};
pub use types::RawRecord;
