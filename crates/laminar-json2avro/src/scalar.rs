//! Scalar coercion: one JSON scalar → one Avro primitive.
//!
//! All functions here are pure. Failures are reported as a path-less
//! [`ScalarError`]; the tree converter attaches the path.

use apache_avro::types::Value;
use serde_json::Value as JsonValue;

use crate::error::ScalarError;

/// Special floating-point literals accepted in place of a JSON number.
const INFINITY_NAN: [&str; 3] = ["infinity", "-infinity", "nan"];

/// Primitive target kinds handled by [`coerce_scalar`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    /// Avro `boolean`.
    Boolean,
    /// Avro `int` (32-bit).
    Int,
    /// Avro `long` (64-bit).
    Long,
    /// Avro `float` (32-bit IEEE).
    Float,
    /// Avro `double` (64-bit IEEE).
    Double,
    /// Avro `string`.
    String,
    /// Avro `bytes`, Latin-1 encoded.
    Bytes,
}

impl ScalarKind {
    /// Avro type name of this kind.
    #[must_use]
    pub fn type_name(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Int => "int",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
            Self::String => "string",
            Self::Bytes => "bytes",
        }
    }
}

/// Converts a single JSON value into the Avro primitive `kind`.
///
/// Integer kinds accept whole JSON numbers and integer literal strings;
/// float kinds accept numbers, numeric strings, and the special literals
/// `Infinity`, `-Infinity` and `NaN` (case-insensitive). `String` accepts
/// only JSON strings; see [`render_json_text`] for the stringifying path.
///
/// # Errors
///
/// Returns [`ScalarError::Mismatch`] for incompatible JSON kinds and
/// [`ScalarError::Overflow`] for values outside the target range.
pub fn coerce_scalar(kind: ScalarKind, value: &JsonValue) -> Result<Value, ScalarError> {
    match kind {
        ScalarKind::Boolean => match value {
            JsonValue::Bool(b) => Ok(Value::Boolean(*b)),
            other => Err(mismatch("boolean", other)),
        },
        ScalarKind::Int => {
            let n = extract_i64(value, "int")?;
            i32::try_from(n).map(Value::Int).map_err(|_| ScalarError::Overflow {
                value: n.to_string(),
                target: "int".into(),
            })
        }
        ScalarKind::Long => extract_i64(value, "long").map(Value::Long),
        ScalarKind::Float => {
            let f = extract_f64(value, "float")?;
            if f.is_finite() && f.abs() > f64::from(f32::MAX) {
                return Err(ScalarError::Overflow {
                    value: f.to_string(),
                    target: "float".into(),
                });
            }
            #[allow(clippy::cast_possible_truncation)]
            Ok(Value::Float(f as f32))
        }
        ScalarKind::Double => extract_f64(value, "double").map(Value::Double),
        ScalarKind::String => match value {
            JsonValue::String(s) => Ok(Value::String(s.clone())),
            other => Err(mismatch("string", other)),
        },
        ScalarKind::Bytes => match value {
            JsonValue::String(s) => latin1_bytes(s).map(Value::Bytes).ok_or_else(|| {
                ScalarError::Mismatch {
                    expected: "bytes",
                    found: "string with characters outside Latin-1".into(),
                }
            }),
            other => Err(mismatch("bytes", other)),
        },
    }
}

pub(crate) fn extract_i64(value: &JsonValue, target: &'static str) -> Result<i64, ScalarError> {
    match value {
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Ok(i);
            }
            if let Some(u) = n.as_u64() {
                return Err(ScalarError::Overflow {
                    value: u.to_string(),
                    target: target.into(),
                });
            }
            match n.as_f64() {
                Some(f) => whole_f64_to_i64(f, target),
                None => Err(mismatch(target, value)),
            }
        }
        JsonValue::String(s) => {
            let trimmed = s.trim();
            if !is_integer_literal(trimmed) {
                return Err(ScalarError::Mismatch {
                    expected: target,
                    found: format!("string '{s}'"),
                });
            }
            trimmed.parse::<i64>().map_err(|_| ScalarError::Overflow {
                value: trimmed.to_string(),
                target: target.into(),
            })
        }
        other => Err(mismatch(target, other)),
    }
}

/// Accepts `42.0` but not `42.5`; never truncates silently.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
fn whole_f64_to_i64(f: f64, target: &'static str) -> Result<i64, ScalarError> {
    if !f.is_finite() || f.fract() != 0.0 {
        return Err(ScalarError::Mismatch {
            expected: target,
            found: format!("non-integral number {f}"),
        });
    }
    if f < i64::MIN as f64 || f >= i64::MAX as f64 {
        return Err(ScalarError::Overflow {
            value: f.to_string(),
            target: target.into(),
        });
    }
    Ok(f as i64)
}

fn extract_f64(value: &JsonValue, target: &'static str) -> Result<f64, ScalarError> {
    match value {
        JsonValue::Number(n) => n.as_f64().ok_or_else(|| mismatch(target, value)),
        JsonValue::String(s) => parse_special_float(s)
            .or_else(|| s.trim().parse::<f64>().ok())
            .ok_or_else(|| ScalarError::Mismatch {
                expected: target,
                found: format!("string '{s}'"),
            }),
        other => Err(mismatch(target, other)),
    }
}

fn mismatch(expected: &'static str, value: &JsonValue) -> ScalarError {
    ScalarError::Mismatch {
        expected,
        found: json_kind_name(value).into(),
    }
}

/// Returns `true` if `value` is one of `Infinity`, `-Infinity` or `NaN`
/// (case-insensitive).
#[must_use]
pub fn is_infinity_or_nan(value: &str) -> bool {
    INFINITY_NAN.iter().any(|s| s.eq_ignore_ascii_case(value))
}

/// Maps the special literals recognized by [`is_infinity_or_nan`] to
/// their IEEE values.
#[must_use]
pub fn parse_special_float(value: &str) -> Option<f64> {
    if !is_infinity_or_nan(value) {
        return None;
    }
    Some(match value.to_ascii_lowercase().as_str() {
        "infinity" => f64::INFINITY,
        "-infinity" => f64::NEG_INFINITY,
        _ => f64::NAN,
    })
}

/// Returns `true` for an optionally negative, all-digit literal (`-?\d+`).
#[must_use]
pub fn is_integer_literal(value: &str) -> bool {
    let digits = value.strip_prefix('-').unwrap_or(value);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Encodes `s` one byte per character. Returns `None` if any character
/// lies above U+00FF.
#[must_use]
pub fn latin1_bytes(s: &str) -> Option<Vec<u8>> {
    s.chars().map(|c| u8::try_from(u32::from(c)).ok()).collect()
}

/// Decodes Latin-1 bytes, one character per byte.
#[must_use]
pub fn latin1_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Renders a JSON value as text: strings verbatim, everything else as
/// canonical JSON.
#[must_use]
pub fn render_json_text(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Short name of a JSON value's kind, for error messages.
#[must_use]
pub fn json_kind_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
