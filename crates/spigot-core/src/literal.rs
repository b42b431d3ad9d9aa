//! Numeric literals accepted in expressions.
//!
//! Everything parses to an exact value: a decimal such as `0.1` is the
//! rational `1/10`, not the nearest binary float. Accepted forms:
//!
//! - integers, decimal or hexadecimal: `42`, `-7`, `0x1f`
//! - fractions: `355/113`, `-7/2`
//! - decimal floats: `1.25`, `.5`, `1e-3`, `2.5E+4`
//! - hexadecimal floats: `0x1.8p1`, `0x.8p-2`
//!
//! Floats may carry a trailing `f`, `F`, `l` or `L`, which is ignored.
//! IEEE 754 bit patterns are handled separately by [`parse_ieee_bits`].

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::Zero;

use crate::error::{SpigotError, SpigotResult};

/// Largest decimal or binary exponent accepted in a float literal.
const MAX_EXPONENT: u32 = 100_000;

/// Parse an integer literal (decimal or `0x` hexadecimal, optional sign).
pub fn parse_integer(text: &str) -> SpigotResult<BigInt> {
    let (negative, body) = split_sign(text.trim());
    let (digits, radix) = match strip_hex_prefix(body) {
        Some(hex) => (hex, 16),
        None => (body, 10),
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(SpigotError::invalid_number(text, "expected an integer"));
    }
    let value = BigInt::parse_bytes(digits.as_bytes(), radix)
        .ok_or_else(|| SpigotError::invalid_number(text, "expected an integer"))?;
    Ok(if negative { -value } else { value })
}

/// Parse any numeric literal to an exact rational.
pub fn parse_rational(text: &str) -> SpigotResult<BigRational> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(SpigotError::invalid_number(text, "empty literal"));
    }

    if let Some((numer, denom)) = trimmed.split_once('/') {
        let numer = parse_integer(numer)?;
        let denom = parse_integer(denom)?;
        if denom.is_zero() {
            return Err(SpigotError::invalid_number(text, "zero denominator"));
        }
        return Ok(BigRational::new(numer, denom));
    }

    let (negative, body) = split_sign(trimmed);
    let value = match strip_hex_prefix(body) {
        Some(hex) => parse_hex_float(hex),
        None => parse_decimal_float(body),
    }
    .ok_or_else(|| SpigotError::invalid_number(text, "not a recognised numeric literal"))?;
    Ok(if negative { -value } else { value })
}

/// Convert an IEEE 754 bit pattern to the exact rational it encodes.
///
/// Eight hex digits are read as binary32, sixteen as binary64. Subnormals
/// are exact; NaN and the infinities have no rational value and are
/// rejected.
pub fn parse_ieee_bits(text: &str) -> SpigotResult<BigRational> {
    let hex = strip_hex_prefix(text.trim()).unwrap_or(text.trim());
    let (exponent_bits, mantissa_bits, bias): (u32, u32, i64) = match hex.len() {
        8 => (8, 23, 127),
        16 => (11, 52, 1023),
        _ => {
            return Err(SpigotError::invalid_number(
                text,
                "expected 8 or 16 hex digits",
            ))
        }
    };
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(SpigotError::invalid_number(text, "expected only hex digits"));
    }
    let bits = u64::from_str_radix(hex, 16)
        .map_err(|e| SpigotError::invalid_number(text, e.to_string()))?;

    let width = 1 + exponent_bits + mantissa_bits;
    let negative = (bits >> (width - 1)) & 1 == 1;
    let exponent_mask = (1u64 << exponent_bits) - 1;
    let biased = (bits >> mantissa_bits) & exponent_mask;
    let fraction = bits & ((1u64 << mantissa_bits) - 1);

    if biased == exponent_mask {
        return Err(SpigotError::domain(
            "ieee",
            format!("{} is NaN or infinite", text.trim()),
        ));
    }

    let (significand, exponent) = if biased == 0 {
        (BigInt::from(fraction), 1 - bias - i64::from(mantissa_bits))
    } else {
        (
            BigInt::from(fraction | (1u64 << mantissa_bits)),
            biased as i64 - bias - i64::from(mantissa_bits),
        )
    };
    let value = scale_by_power(BigRational::from_integer(significand), 2, exponent);
    Ok(if negative { -value } else { value })
}

fn split_sign(text: &str) -> (bool, &str) {
    if let Some(rest) = text.strip_prefix('-') {
        (true, rest)
    } else if let Some(rest) = text.strip_prefix('+') {
        (false, rest)
    } else {
        (false, text)
    }
}

fn strip_hex_prefix(text: &str) -> Option<&str> {
    text.strip_prefix("0x").or_else(|| text.strip_prefix("0X"))
}

/// Digits with at most one radix point, as `(all digits as an integer,
/// number of digits after the point)`.
fn parse_mantissa(text: &str, radix: u32) -> Option<(BigInt, u32)> {
    let mut value = BigInt::zero();
    let mut fraction_digits = 0u32;
    let mut seen_point = false;
    let mut seen_digit = false;
    for ch in text.chars() {
        if ch == '.' {
            if seen_point {
                return None;
            }
            seen_point = true;
            continue;
        }
        let digit = ch.to_digit(radix)?;
        value = value * radix + digit;
        seen_digit = true;
        if seen_point {
            fraction_digits += 1;
        }
    }
    seen_digit.then_some((value, fraction_digits))
}

fn parse_exponent(text: &str) -> Option<i64> {
    let (negative, digits) = split_sign(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let magnitude: u32 = digits.parse().ok().filter(|&e| e <= MAX_EXPONENT)?;
    Some(if negative {
        -i64::from(magnitude)
    } else {
        i64::from(magnitude)
    })
}

fn strip_float_suffix(text: &str) -> &str {
    text.strip_suffix(['f', 'F', 'l', 'L']).unwrap_or(text)
}

fn parse_decimal_float(text: &str) -> Option<BigRational> {
    let text = strip_float_suffix(text);
    let (mantissa, exponent) = match text.find(['e', 'E']) {
        Some(i) => (&text[..i], parse_exponent(&text[i + 1..])?),
        None => (text, 0),
    };
    let (digits, fraction_digits) = parse_mantissa(mantissa, 10)?;
    let value = BigRational::from_integer(digits);
    Some(scale_by_power(value, 10, exponent - i64::from(fraction_digits)))
}

fn parse_hex_float(text: &str) -> Option<BigRational> {
    // 'f' is a hex digit, so a suffix only follows a binary exponent
    let (mantissa, exponent) = match text.find(['p', 'P']) {
        Some(i) => (&text[..i], parse_exponent(strip_float_suffix(&text[i + 1..]))?),
        None => (text, 0),
    };
    let (digits, fraction_digits) = parse_mantissa(mantissa, 16)?;
    let value = BigRational::from_integer(digits);
    Some(scale_by_power(value, 2, exponent - 4 * i64::from(fraction_digits)))
}

/// `value * base^exponent`.
fn scale_by_power(value: BigRational, base: u32, exponent: i64) -> BigRational {
    let factor = BigInt::from(base).pow(exponent.unsigned_abs() as u32);
    if exponent >= 0 {
        value * BigRational::from_integer(factor)
    } else {
        value / BigRational::from_integer(factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ratio(n: i64, d: i64) -> BigRational {
        BigRational::new(n.into(), d.into())
    }

    #[test]
    fn test_integers() {
        assert_eq!(parse_integer("42").unwrap(), BigInt::from(42));
        assert_eq!(parse_integer("-7").unwrap(), BigInt::from(-7));
        assert_eq!(parse_integer("+0x1f").unwrap(), BigInt::from(31));
        assert!(parse_integer("1.5").is_err());
        assert!(parse_integer("").is_err());
        assert!(parse_integer("--3").is_err());
        assert!(parse_integer("1_000").is_err());
    }

    #[test]
    fn test_fractions() {
        assert_eq!(parse_rational("355/113").unwrap(), ratio(355, 113));
        assert_eq!(parse_rational("-7/2").unwrap(), ratio(-7, 2));
        assert_eq!(parse_rational("6/-4").unwrap(), ratio(-3, 2));
        assert!(matches!(
            parse_rational("1/0"),
            Err(SpigotError::InvalidNumber { .. })
        ));
    }

    #[test]
    fn test_decimal_floats_are_exact() {
        assert_eq!(parse_rational("0.1").unwrap(), ratio(1, 10));
        assert_eq!(parse_rational("1.25").unwrap(), ratio(5, 4));
        assert_eq!(parse_rational(".5").unwrap(), ratio(1, 2));
        assert_eq!(parse_rational("-2.").unwrap(), ratio(-2, 1));
        assert_eq!(parse_rational("1e-3").unwrap(), ratio(1, 1000));
        assert_eq!(parse_rational("2.5E+4").unwrap(), ratio(25000, 1));
        assert_eq!(parse_rational("1.5f").unwrap(), ratio(3, 2));
        assert_eq!(parse_rational("3L").unwrap(), ratio(3, 1));
    }

    #[test]
    fn test_hex_literals() {
        assert_eq!(parse_rational("0x1f").unwrap(), ratio(31, 1));
        assert_eq!(parse_rational("0x1.8p1").unwrap(), ratio(3, 1));
        assert_eq!(parse_rational("0x.8p-2").unwrap(), ratio(1, 8));
        assert_eq!(parse_rational("-0x1p-3f").unwrap(), ratio(-1, 8));
        assert_eq!(parse_rational("0xA.8").unwrap(), ratio(21, 2));
    }

    #[test]
    fn test_rejects_garbage() {
        for text in ["", ".", "1.2.3", "e5", "1e", "0x", "pi", "1e999999"] {
            assert!(parse_rational(text).is_err(), "{:?} should not parse", text);
        }
    }

    #[test]
    fn test_ieee_single() {
        assert_eq!(parse_ieee_bits("3f800000").unwrap(), ratio(1, 1));
        assert_eq!(parse_ieee_bits("c0600000").unwrap(), ratio(-7, 2));
        // f32 nearest to pi
        assert_eq!(
            parse_ieee_bits("40490FDB").unwrap(),
            ratio(13_176_795, 4_194_304)
        );
        // smallest subnormal
        assert_eq!(
            parse_ieee_bits("00000001").unwrap(),
            BigRational::new(1.into(), BigInt::from(2).pow(149))
        );
    }

    #[test]
    fn test_ieee_double() {
        assert_eq!(parse_ieee_bits("3FF0000000000000").unwrap(), ratio(1, 1));
        assert_eq!(parse_ieee_bits("0x3fb999999999999a").unwrap(), {
            BigRational::new(
                BigInt::from(3_602_879_701_896_397u64),
                BigInt::from(2).pow(55),
            )
        });
        assert_eq!(parse_ieee_bits("8000000000000000").unwrap(), ratio(0, 1));
    }

    #[test]
    fn test_ieee_rejects_specials() {
        assert!(matches!(
            parse_ieee_bits("7f800000"),
            Err(SpigotError::Domain { .. })
        ));
        assert!(matches!(
            parse_ieee_bits("7ff8000000000000"),
            Err(SpigotError::Domain { .. })
        ));
        assert!(parse_ieee_bits("3f80").is_err());
        assert!(parse_ieee_bits("3f80000g").is_err());
    }

    #[test]
    fn test_ieee_rejects_signs() {
        assert!(matches!(
            parse_ieee_bits("+3f80000"),
            Err(SpigotError::InvalidNumber { .. })
        ));
        assert!(matches!(
            parse_ieee_bits("0x+3f80000"),
            Err(SpigotError::InvalidNumber { .. })
        ));
        assert!(parse_ieee_bits("-3f80000").is_err());
    }
}
