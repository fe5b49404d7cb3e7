//! Converter configuration.
//!
//! [`ConverterConfig`] carries the behavior flags consulted during a
//! conversion. It can be deserialized with serde or built from a flat
//! property map (the `WITH (...)` style used by connectors) through
//! [`ConverterConfig::from_properties`].

use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ConversionError, ConversionResult};

/// Name of the catch-all field that absorbs unmatched JSON keys.
pub const DEFAULT_ADDITIONAL_PROPERTIES_FIELD: &str = "_ab_additional_properties";

/// Strategy for JSON object fields with no counterpart in the record schema.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownFieldStrategy {
    /// Collect into the catch-all field when the record declares it,
    /// otherwise drop (default).
    #[default]
    Collect,
    /// Always drop, even if the record declares a catch-all field.
    Ignore,
    /// Fail the conversion on the first unmatched field.
    Reject,
}

str_enum!(UnknownFieldStrategy, "unknown.fields",
    Collect => "collect", "collect_extra";
    Ignore => "ignore", "drop";
    Reject => "reject", "strict");

/// What happens when a date/time string cannot be decoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemporalFailureStrategy {
    /// Abort the conversion with `TemporalDecodeFailure` (default).
    #[default]
    Fail,
    /// Treat the enclosing record field as absent: its default applies,
    /// or null when the field is nullable.
    Omit,
}

str_enum!(TemporalFailureStrategy, "temporal.failure",
    Fail => "fail", "strict";
    Omit => "omit", "lenient");

fn default_field_name_replacement() -> String {
    "_".into()
}

fn default_additional_properties_field() -> String {
    DEFAULT_ADDITIONAL_PROPERTIES_FIELD.into()
}

const fn default_true() -> bool {
    true
}

/// Default recursion limit for nested documents.
const fn default_max_depth() -> usize {
    256
}

/// Behavior flags for a conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConverterConfig {
    /// Substring substituted for characters that are illegal in Avro
    /// field names when matching JSON keys against the schema.
    #[serde(default = "default_field_name_replacement")]
    pub field_name_replacement: String,

    /// Reserved catch-all field name.
    #[serde(default = "default_additional_properties_field")]
    pub additional_properties_field: String,

    /// How to handle JSON keys absent from the record schema.
    #[serde(default)]
    pub unknown_fields: UnknownFieldStrategy,

    /// How to handle undecodable date/time strings.
    #[serde(default)]
    pub temporal_failure: TemporalFailureStrategy,

    /// Whether non-string JSON values are rendered to JSON text when a
    /// string is required.
    #[serde(default = "default_true")]
    pub stringify_non_string: bool,

    /// Maximum nesting depth before the conversion is aborted.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            field_name_replacement: default_field_name_replacement(),
            additional_properties_field: default_additional_properties_field(),
            unknown_fields: UnknownFieldStrategy::default(),
            temporal_failure: TemporalFailureStrategy::default(),
            stringify_non_string: default_true(),
            max_depth: default_max_depth(),
        }
    }
}

impl ConverterConfig {
    /// Builds a config from a flat property map.
    ///
    /// Recognized keys: `field.name.replacement`,
    /// `additional.properties.field`, `unknown.fields`,
    /// `strict.unmatched.fields`, `temporal.failure`,
    /// `stringify.non.string`, `max.depth`. Unknown keys are ignored.
    /// `strict.unmatched.fields = true` overrides `unknown.fields` with
    /// [`UnknownFieldStrategy::Reject`].
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError::InvalidConfig`] if a value cannot be parsed.
    pub fn from_properties(props: &HashMap<String, String>) -> ConversionResult<Self> {
        let mut config = Self::default();

        if let Some(replacement) = props.get("field.name.replacement") {
            config.field_name_replacement.clone_from(replacement);
        }
        if let Some(name) = props.get("additional.properties.field") {
            if name.trim().is_empty() {
                return Err(ConversionError::InvalidConfig {
                    key: "additional.properties.field".into(),
                    message: "field name must not be empty".into(),
                });
            }
            config.additional_properties_field = name.trim().to_string();
        }
        if let Some(v) = props.get("unknown.fields") {
            config.unknown_fields = UnknownFieldStrategy::from_str(v)?;
        }
        if parse_bool(props, "strict.unmatched.fields")?.unwrap_or(false) {
            config.unknown_fields = UnknownFieldStrategy::Reject;
        }
        if let Some(v) = props.get("temporal.failure") {
            config.temporal_failure = TemporalFailureStrategy::from_str(v)?;
        }
        if let Some(b) = parse_bool(props, "stringify.non.string")? {
            config.stringify_non_string = b;
        }
        if let Some(v) = props.get("max.depth") {
            config.max_depth = v.trim().parse().map_err(|e| ConversionError::InvalidConfig {
                key: "max.depth".into(),
                message: format!("{e}"),
            })?;
        }

        Ok(config)
    }

    /// Returns `true` when unmatched JSON fields abort the conversion.
    #[must_use]
    pub fn strict_unmatched_fields(&self) -> bool {
        self.unknown_fields == UnknownFieldStrategy::Reject
    }
}

fn parse_bool(props: &HashMap<String, String>, key: &str) -> ConversionResult<Option<bool>> {
    match props.get(key).map(|v| v.trim().to_lowercase()) {
        None => Ok(None),
        Some(ref v) if v == "true" || v == "1" || v == "yes" => Ok(Some(true)),
        Some(ref v) if v == "false" || v == "0" || v == "no" => Ok(Some(false)),
        Some(other) => Err(ConversionError::InvalidConfig {
            key: key.into(),
            message: format!("expected a boolean, got '{other}'"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = ConverterConfig::default();
        assert_eq!(config.field_name_replacement, "_");
        assert_eq!(config.additional_properties_field, "_ab_additional_properties");
        assert_eq!(config.unknown_fields, UnknownFieldStrategy::Collect);
        assert_eq!(config.temporal_failure, TemporalFailureStrategy::Fail);
        assert!(config.stringify_non_string);
        assert!(!config.strict_unmatched_fields());
    }

    #[test]
    fn test_from_properties() {
        let config = ConverterConfig::from_properties(&props(&[
            ("field.name.replacement", "__"),
            ("additional.properties.field", "_extra"),
            ("unknown.fields", "Ignore"),
            ("temporal.failure", "lenient"),
            ("stringify.non.string", "false"),
            ("max.depth", "32"),
            ("some.other.key", "whatever"),
        ]))
        .unwrap();

        assert_eq!(config.field_name_replacement, "__");
        assert_eq!(config.additional_properties_field, "_extra");
        assert_eq!(config.unknown_fields, UnknownFieldStrategy::Ignore);
        assert_eq!(config.temporal_failure, TemporalFailureStrategy::Omit);
        assert!(!config.stringify_non_string);
        assert_eq!(config.max_depth, 32);
    }

    #[test]
    fn test_strict_unmatched_overrides_strategy() {
        let config = ConverterConfig::from_properties(&props(&[
            ("unknown.fields", "collect"),
            ("strict.unmatched.fields", "true"),
        ]))
        .unwrap();
        assert!(config.strict_unmatched_fields());
    }

    #[test]
    fn test_invalid_values() {
        let err = ConverterConfig::from_properties(&props(&[("unknown.fields", "explode")]))
            .unwrap_err();
        assert!(err.to_string().contains("unknown.fields"));

        let err = ConverterConfig::from_properties(&props(&[("max.depth", "deep")])).unwrap_err();
        assert!(matches!(err, ConversionError::InvalidConfig { ref key, .. } if key == "max.depth"));

        let err = ConverterConfig::from_properties(&props(&[("stringify.non.string", "maybe")]))
            .unwrap_err();
        assert!(err.to_string().contains("boolean"));
    }

    #[test]
    fn test_strategy_display_roundtrip() {
        for s in [
            UnknownFieldStrategy::Collect,
            UnknownFieldStrategy::Ignore,
            UnknownFieldStrategy::Reject,
        ] {
            assert_eq!(UnknownFieldStrategy::from_str(&s.to_string()).unwrap(), s);
        }
        assert_eq!(
            TemporalFailureStrategy::from_str("OMIT").unwrap(),
            TemporalFailureStrategy::Omit
        );
    }

    #[test]
    fn test_serde_defaults_fill_missing_keys() {
        let config: ConverterConfig =
            serde_json::from_str(r#"{"unknown_fields": "reject"}"#).unwrap();
        assert_eq!(config.unknown_fields, UnknownFieldStrategy::Reject);
        assert_eq!(config.max_depth, 256);
        assert_eq!(config.additional_properties_field, "_ab_additional_properties");
    }
}
