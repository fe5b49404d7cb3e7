//! Conversion error types.
//!
//! Provides [`ConversionError`] for JSON ↔ Avro conversion, plus a
//! convenience [`ConversionResult`] alias. Every variant raised while
//! walking a schema carries the dotted path of the offending node.

use thiserror::Error;

/// Result alias for conversion operations.
pub type ConversionResult<T> = Result<T, ConversionError>;

/// Errors that can occur while converting between JSON and Avro.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// The JSON kind cannot be converted into the required schema kind.
    #[error("type mismatch at '{path}': expected {expected}, got {found}")]
    TypeMismatch {
        /// Dotted path of the offending node.
        path: String,
        /// What the schema required.
        expected: String,
        /// What the JSON document contained.
        found: String,
    },

    /// A record field has no JSON entry, no default, and is not nullable.
    #[error("missing required field '{path}'")]
    MissingRequiredField {
        /// Dotted path of the missing field.
        path: String,
    },

    /// No union member is compatible with the JSON value.
    #[error("no union branch at '{path}' accepts a JSON {found}")]
    NoMatchingUnionBranch {
        /// Dotted path of the union.
        path: String,
        /// JSON kind that was offered.
        found: String,
    },

    /// An enum value is not one of the declared symbols.
    #[error("invalid enum symbol '{symbol}' at '{path}'")]
    InvalidEnumSymbol {
        /// Dotted path of the enum.
        path: String,
        /// The rejected symbol.
        symbol: String,
    },

    /// A numeric value does not fit the target width or precision.
    #[error("numeric overflow at '{path}': {value} does not fit {target}")]
    NumericOverflow {
        /// Dotted path of the numeric node.
        path: String,
        /// Textual form of the rejected value.
        value: String,
        /// Target type description (e.g. `int`, `decimal(10, 2)`).
        target: String,
    },

    /// Every parse strategy for a date/time value was exhausted.
    #[error("cannot decode {logical_type} from '{value}' at '{path}'")]
    TemporalDecodeFailure {
        /// Dotted path of the temporal node.
        path: String,
        /// Logical type name (e.g. `timestamp-micros`).
        logical_type: &'static str,
        /// The rejected text.
        value: String,
    },

    /// A JSON object carries a field the record does not declare and the
    /// configured policy rejects unknown fields.
    #[error("unknown field '{field}' at '{path}' not in schema")]
    UnknownField {
        /// Dotted path of the record.
        path: String,
        /// The unmatched JSON key.
        field: String,
    },

    /// A named-type reference could not be resolved.
    #[error("unresolved schema reference '{name}' at '{path}'")]
    UnresolvedReference {
        /// Dotted path where the reference was encountered.
        path: String,
        /// Full name of the referenced type.
        name: String,
    },

    /// The schema node kind is not supported by the converter.
    #[error("unsupported schema at '{path}': {detail}")]
    UnsupportedSchema {
        /// Dotted path of the node.
        path: String,
        /// What was unsupported.
        detail: String,
    },

    /// The document nests deeper than the configured limit.
    #[error("nesting deeper than {limit} levels at '{path}'")]
    NestingTooDeep {
        /// Dotted path where the limit was hit.
        path: String,
        /// Configured depth limit.
        limit: usize,
    },

    /// The input bytes are not valid JSON.
    #[error("JSON parse error: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// An error raised by the Avro codec or schema parser.
    #[error("avro error: {0}")]
    Avro(#[from] apache_avro::Error),

    /// A configuration value is invalid.
    #[error("invalid config key '{key}': {message}")]
    InvalidConfig {
        /// The configuration key.
        key: String,
        /// What was wrong with the value.
        message: String,
    },
}

impl ConversionError {
    /// Returns the dotted path attached to this error, if any.
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::TypeMismatch { path, .. }
            | Self::MissingRequiredField { path }
            | Self::NoMatchingUnionBranch { path, .. }
            | Self::InvalidEnumSymbol { path, .. }
            | Self::NumericOverflow { path, .. }
            | Self::TemporalDecodeFailure { path, .. }
            | Self::UnknownField { path, .. }
            | Self::UnresolvedReference { path, .. }
            | Self::UnsupportedSchema { path, .. }
            | Self::NestingTooDeep { path, .. } => Some(path),
            Self::InvalidJson(_) | Self::Avro(_) | Self::InvalidConfig { .. } => None,
        }
    }

    /// Attaches `path` to a path-less [`ScalarError`].
    #[must_use]
    pub fn from_scalar(path: String, err: ScalarError) -> Self {
        match err {
            ScalarError::Mismatch { expected, found } => Self::TypeMismatch {
                path,
                expected: expected.to_string(),
                found,
            },
            ScalarError::Overflow { value, target } => Self::NumericOverflow {
                path,
                value,
                target,
            },
        }
    }
}

/// Failure of a pure scalar coercion, before a path is known.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScalarError {
    /// The JSON value is fundamentally incompatible with the target.
    #[error("expected {expected}, got {found}")]
    Mismatch {
        /// Target description.
        expected: &'static str,
        /// Offered JSON kind (or a short description of the value).
        found: String,
    },

    /// The value is numeric but out of range for the target.
    #[error("{value} does not fit {target}")]
    Overflow {
        /// Textual form of the value.
        value: String,
        /// Target description.
        target: String,
    },
}
