//! Hexadecimal floating-point literals
//!
//! Probe dumps encode every sample with C99 `%a` formatting
//! (`0x1.999999999999ap-4`). Unlike a decimal rendering, that encoding
//! round-trips an `f64` bit for bit, which matters when the quantity under
//! study is the last few bits of a result.

use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HexFloatError {
    #[error("empty floating-point literal")]
    Empty,

    #[error("not a floating-point literal: '{0}'")]
    Malformed(String),

    #[error("binary exponent out of range in '{0}'")]
    ExponentOutOfRange(String),
}

fn hex_literal() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([+-]?)0[xX]([0-9a-fA-F]*)(?:\.([0-9a-fA-F]*))?(?:[pP]([+-]?[0-9]+))?$")
            .expect("hex-float pattern is a valid regex")
    })
}

/// Mantissa accumulation stops once this many bits are held; later digits
/// only move the exponent.
const MANTISSA_LIMIT: u64 = 1 << 59;

/// Beyond this magnitude every binary exponent saturates to 0 or infinity.
const EXPONENT_SATURATION: i64 = 1 << 20;

/// Parse a `%a`-style literal (`0x1.8p+1`, `-0x0p+0`, `0x.8p0`, `inf`, `nan`)
///
/// Decoding is exact for every literal carrying at most 53 significant bits,
/// which covers all `%a` renderings of `f64` values including subnormals.
pub fn parse_hex_f64(literal: &str) -> Result<f64, HexFloatError> {
    let literal = literal.trim();
    if literal.is_empty() {
        return Err(HexFloatError::Empty);
    }

    if let Some(special) = parse_special(literal) {
        return Ok(special);
    }

    let caps = hex_literal()
        .captures(literal)
        .ok_or_else(|| HexFloatError::Malformed(literal.to_string()))?;

    let negative = &caps[1] == "-";
    let int_digits = caps.get(2).map_or("", |m| m.as_str());
    let frac_digits = caps.get(3).map_or("", |m| m.as_str());
    if int_digits.is_empty() && frac_digits.is_empty() {
        return Err(HexFloatError::Malformed(literal.to_string()));
    }

    let exponent: i64 = match caps.get(4) {
        Some(m) => m
            .as_str()
            .parse()
            .map_err(|_| HexFloatError::ExponentOutOfRange(literal.to_string()))?,
        None => 0,
    };

    let mut mantissa: u64 = 0;
    let mut scale = exponent.clamp(-EXPONENT_SATURATION, EXPONENT_SATURATION);

    for c in int_digits.chars() {
        let digit = hex_digit(c);
        if mantissa < MANTISSA_LIMIT {
            mantissa = mantissa * 16 + digit;
        } else {
            scale += 4;
        }
    }
    for c in frac_digits.chars() {
        let digit = hex_digit(c);
        if mantissa < MANTISSA_LIMIT {
            mantissa = mantissa * 16 + digit;
            scale -= 4;
        }
    }

    let magnitude = if mantissa == 0 {
        0.0
    } else {
        scale_by_pow2(mantissa as f64, scale)
    };

    Ok(if negative { -magnitude } else { magnitude })
}

/// Parse a sample value: hexadecimal when prefixed with `0x`, otherwise a
/// plain decimal literal.
pub fn parse_sample(literal: &str) -> Result<f64, HexFloatError> {
    let trimmed = literal.trim();
    let body = trimmed.trim_start_matches(['+', '-']);
    if body.starts_with("0x") || body.starts_with("0X") {
        return parse_hex_f64(trimmed);
    }
    if trimmed.is_empty() {
        return Err(HexFloatError::Empty);
    }
    if let Some(special) = parse_special(trimmed) {
        return Ok(special);
    }
    trimmed
        .parse::<f64>()
        .map_err(|_| HexFloatError::Malformed(trimmed.to_string()))
}

/// Render `value` the way C's `printf("%a")` does
pub fn format_hex_f64(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let bits = value.to_bits();
    let sign = if bits >> 63 == 1 { "-" } else { "" };
    let biased = ((bits >> 52) & 0x7ff) as i64;
    let fraction = bits & ((1u64 << 52) - 1);

    if biased == 0 && fraction == 0 {
        return format!("{sign}0x0p+0");
    }

    let (lead, exponent) = if biased == 0 {
        (0, -1022)
    } else {
        (1, biased - 1023)
    };

    let digits = format!("{:013x}", fraction);
    let digits = digits.trim_end_matches('0');
    if digits.is_empty() {
        format!("{sign}0x{lead}p{exponent:+}")
    } else {
        format!("{sign}0x{lead}.{digits}p{exponent:+}")
    }
}

fn parse_special(literal: &str) -> Option<f64> {
    match literal.to_ascii_lowercase().as_str() {
        "inf" | "+inf" | "infinity" | "+infinity" => Some(f64::INFINITY),
        "-inf" | "-infinity" => Some(f64::NEG_INFINITY),
        "nan" | "+nan" | "-nan" => Some(f64::NAN),
        _ => None,
    }
}

fn hex_digit(c: char) -> u64 {
    // The regex only lets hex digits through
    c.to_digit(16).map_or(0, u64::from)
}

/// 2^exp for exp in the normal range [-1022, 1023]
fn pow2(exp: i64) -> f64 {
    f64::from_bits(((exp + 1023) as u64) << 52)
}

/// `value * 2^exp` with a single rounding whenever the result is representable
fn scale_by_pow2(mut value: f64, mut exp: i64) -> f64 {
    const STEP: i64 = 1000;

    while exp > STEP {
        value *= pow2(STEP);
        exp -= STEP;
        if value.is_infinite() {
            return value;
        }
    }
    while exp < -STEP {
        value *= pow2(-STEP);
        exp += STEP;
        if value == 0.0 {
            return value;
        }
    }

    value * pow2(exp)
}
