//! Decimal logical type: decimal text ↔ scaled two's-complement bytes.
//!
//! Text is parsed with [`BigDecimal`], so precision is bounded only by
//! the schema. Unscaled values travel as [`BigInt`] and are encoded as
//! the signed big-endian bytes Avro stores.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use num_bigint::{BigInt, Sign};

use crate::error::ScalarError;

/// Parses decimal text (`-12.345`, `1e3`, `0.5E-2`) into an unscaled
/// integer at `scale`, checking `precision`.
///
/// # Errors
///
/// Returns [`ScalarError::Mismatch`] if the text is not a decimal number
/// and [`ScalarError::Overflow`] if it needs more than `scale` fractional
/// digits or more than `precision` digits overall.
pub fn unscaled_from_text(text: &str, precision: usize, scale: usize) -> Result<BigInt, ScalarError> {
    let overflow = || ScalarError::Overflow {
        value: text.to_string(),
        target: format!("decimal({precision}, {scale})"),
    };
    let value = parse_decimal(text.trim()).ok_or_else(|| ScalarError::Mismatch {
        expected: "decimal",
        found: format!("string '{text}'"),
    })?;
    if value.sign() == Sign::NoSign {
        return Ok(BigInt::default());
    }

    let target_scale = i64::try_from(scale).map_err(|_| overflow())?;
    let value = value.normalized();
    let (_, value_scale) = value.as_bigint_and_exponent();
    if value_scale > target_scale {
        return Err(overflow());
    }
    // Checked before rescaling so huge exponents never get materialized.
    let digits = i64::try_from(value.digits()).map_err(|_| overflow())?;
    let integer_digits = digits - value_scale;
    let max_integer_digits = i64::try_from(precision).map_err(|_| overflow())? - target_scale;
    if integer_digits > max_integer_digits {
        return Err(overflow());
    }
    Ok(value.with_scale(target_scale).into_bigint_and_exponent().0)
}

/// Plain decimal syntax only: `BigInt` parsing would also take `_`
/// separators.
fn parse_decimal(text: &str) -> Option<BigDecimal> {
    let plain = text
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'));
    if !plain || !text.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    BigDecimal::from_str(text).ok()
}

/// Minimal big-endian two's-complement encoding of `value`.
#[must_use]
pub fn to_twos_complement(value: &BigInt) -> Vec<u8> {
    value.to_signed_bytes_be()
}

/// Decodes big-endian two's-complement bytes. Empty input is zero.
#[must_use]
pub fn from_twos_complement(bytes: &[u8]) -> BigInt {
    BigInt::from_signed_bytes_be(bytes)
}

/// Parses already-formatted decimal text, for exactness comparisons.
#[must_use]
pub fn decimal_value(text: &str) -> Option<BigDecimal> {
    parse_decimal(text)
}

/// Renders an unscaled value at `scale` as plain decimal text, never in
/// exponent form.
#[must_use]
pub fn format_unscaled(unscaled: &BigInt, scale: usize) -> String {
    let digits = unscaled.magnitude().to_string();
    let sign = if unscaled.sign() == Sign::Minus { "-" } else { "" };
    if scale == 0 {
        return format!("{sign}{digits}");
    }
    let padded = format!("{digits:0>width$}", width = scale + 1);
    let (int_part, frac_part) = padded.split_at(padded.len() - scale);
    format!("{sign}{int_part}.{frac_part}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unscaled(text: &str, precision: usize, scale: usize) -> Result<BigInt, ScalarError> {
        unscaled_from_text(text, precision, scale)
    }

    // ── Parsing ──────────────────────────────────────────────

    #[test]
    fn test_unscaled_basic() {
        assert_eq!(unscaled("12.34", 10, 2), Ok(BigInt::from(1234)));
        assert_eq!(unscaled("-12.3", 10, 2), Ok(BigInt::from(-1230)));
        assert_eq!(unscaled("7", 10, 3), Ok(BigInt::from(7000)));
        assert_eq!(unscaled("0", 5, 2), Ok(BigInt::from(0)));
        assert_eq!(unscaled("-0.000", 5, 2), Ok(BigInt::from(0)));
        assert_eq!(unscaled(".5", 5, 1), Ok(BigInt::from(5)));
        assert_eq!(unscaled("+5", 5, 0), Ok(BigInt::from(5)));
    }

    #[test]
    fn test_unscaled_exponent() {
        assert_eq!(unscaled("1e3", 10, 0), Ok(BigInt::from(1000)));
        assert_eq!(unscaled("1.5E-1", 10, 2), Ok(BigInt::from(15)));
        assert_eq!(unscaled("1.50", 10, 1), Ok(BigInt::from(15)));
    }

    #[test]
    fn test_unscaled_rejects_lossy_scale() {
        let err = unscaled("1.234", 10, 2).unwrap_err();
        assert!(matches!(err, ScalarError::Overflow { ref target, .. } if target == "decimal(10, 2)"));
        assert!(unscaled("1e-999999999", 10, 2).is_err());
    }

    #[test]
    fn test_unscaled_rejects_precision() {
        assert!(unscaled("123456", 5, 0).is_err());
        assert_eq!(unscaled("99999", 5, 0), Ok(BigInt::from(99_999)));
        assert!(unscaled("999.5", 4, 1).is_ok());
        assert!(unscaled("1000.5", 4, 1).is_err());
        assert!(unscaled("1e999999999", 10, 0).is_err());
    }

    #[test]
    fn test_unscaled_beyond_128_bits() {
        let text = "123456789012345678901234567890123456789";
        let value = unscaled(text, 40, 0).unwrap();
        assert_eq!(value.to_string(), text);

        let value = unscaled("-1234567890123456789012345678901234567.891", 45, 5).unwrap();
        assert_eq!(value.to_string(), "-123456789012345678901234567890123456789100");
    }

    #[test]
    fn test_unscaled_rejects_garbage() {
        let err = unscaled("12a", 10, 2).unwrap_err();
        assert!(matches!(err, ScalarError::Mismatch { .. }));
        assert!(unscaled("", 10, 2).is_err());
        assert!(unscaled("-", 10, 2).is_err());
        assert!(unscaled("1_000", 10, 2).is_err());
    }

    // ── Encoding ─────────────────────────────────────────────

    #[test]
    fn test_twos_complement() {
        assert_eq!(to_twos_complement(&BigInt::from(0)), vec![0x00]);
        assert_eq!(to_twos_complement(&BigInt::from(1234)), vec![0x04, 0xd2]);
        assert_eq!(to_twos_complement(&BigInt::from(128)), vec![0x00, 0x80]);
        assert_eq!(to_twos_complement(&BigInt::from(-1)), vec![0xff]);
        assert_eq!(to_twos_complement(&BigInt::from(-129)), vec![0xff, 0x7f]);
        assert_eq!(from_twos_complement(&[]), BigInt::from(0));
    }

    #[test]
    fn test_from_twos_complement_sign_padding() {
        assert_eq!(from_twos_complement(&[0xff, 0xff, 0xff, 0xfb]), BigInt::from(-5));
        assert_eq!(from_twos_complement(&[0x00, 0x00, 0x05]), BigInt::from(5));
    }

    #[test]
    fn test_format_unscaled() {
        assert_eq!(format_unscaled(&BigInt::from(1234), 2), "12.34");
        assert_eq!(format_unscaled(&BigInt::from(-5), 3), "-0.005");
        assert_eq!(format_unscaled(&BigInt::from(42), 0), "42");
        assert_eq!(format_unscaled(&BigInt::from(1), 12), "0.000000000001");
    }
}
