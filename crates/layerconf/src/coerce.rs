//! # Type coercion
//!
//! Converts raw backend bytes into a [`Value`] of a field's [`TypeKind`].
//!
//! | kind | accepted input |
//! |---|---|
//! | `string` | any UTF-8, untrimmed |
//! | `bool` | `1`, `t`, `true`, `0`, `f`, `false` (ASCII case-insensitive) |
//! | `int*` | base-10 signed integer within the field width |
//! | `uint*` | base-10 unsigned integer within the field width |
//! | `float*` | decimal or exponent notation, rounded to the field width; overflow is an error |
//! | `duration` | `<number><unit>` pairs such as `1h30m` or `1.5s`; units `ns us µs ms s m h` and `humantime`'s longer names |

use crate::field::TypeKind;
use crate::value::Value;
use std::borrow::Cow;
use std::num::ParseFloatError;
use std::str::FromStr;
use std::time::Duration;

const NANOS_PER_SEC: u128 = 1_000_000_000;
/// Fraction digits beyond this are truncated.
const MAX_FRACTION_DIGITS: usize = 20;

/// A raw value that does not parse into the requested kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind} value: {reason}")]
pub struct CoerceError {
    pub kind: TypeKind,
    pub reason: Cow<'static, str>,
}

impl CoerceError {
    fn new(kind: TypeKind, reason: impl Into<Cow<'static, str>>) -> Self {
        Self { kind, reason: reason.into() }
    }
}

/// Converts `raw` into a value of `kind`.
///
/// # Errors
/// Returns [`CoerceError`] when `raw` is not valid UTF-8 or does not parse as `kind`.
pub fn coerce(raw: &[u8], kind: TypeKind) -> Result<Value, CoerceError> {
    let text = std::str::from_utf8(raw)
        .map_err(|e| CoerceError::new(kind, format!("not valid UTF-8 ({e})")))?;

    match kind {
        TypeKind::String => Ok(Value::String(text.to_owned())),
        TypeKind::Bool => parse_bool(text)
            .map(Value::Bool)
            .ok_or_else(|| CoerceError::new(kind, "expected one of 1, t, true, 0, f, false")),
        TypeKind::Int { bits } => parse_int(text, bits).map(Value::Int).map_err(|r| CoerceError::new(kind, r)),
        TypeKind::Uint { bits } => parse_uint(text, bits).map(Value::Uint).map_err(|r| CoerceError::new(kind, r)),
        TypeKind::Float { bits: 32 } => {
            parse_float::<f32>(text, 32).map(Value::Float32).map_err(|r| CoerceError::new(kind, r))
        },
        TypeKind::Float { .. } => {
            parse_float::<f64>(text, 64).map(Value::Float64).map_err(|r| CoerceError::new(kind, r))
        },
        TypeKind::Duration => parse_duration(text).map(Value::Duration).map_err(|r| CoerceError::new(kind, r)),
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    let is = |word: &str| text.eq_ignore_ascii_case(word);
    if text == "1" || is("t") || is("true") {
        Some(true)
    } else if text == "0" || is("f") || is("false") {
        Some(false)
    } else {
        None
    }
}

fn parse_int(text: &str, bits: u32) -> Result<i64, Cow<'static, str>> {
    let n = text.parse::<i64>().map_err(|e| Cow::Owned(e.to_string()))?;
    if bits < i64::BITS {
        let limit = 1i64 << (bits - 1);
        if !(-limit..limit).contains(&n) {
            return Err(format!("{n} does not fit in {bits} bits").into());
        }
    }
    Ok(n)
}

fn parse_uint(text: &str, bits: u32) -> Result<u64, Cow<'static, str>> {
    if text.starts_with('-') {
        return Err("unsigned values cannot be negative".into());
    }
    let n = text.parse::<u64>().map_err(|e| Cow::Owned(e.to_string()))?;
    if bits < u64::BITS && n >> bits != 0 {
        return Err(format!("{n} does not fit in {bits} bits").into());
    }
    Ok(n)
}

/// Parses a float, rejecting values that only become infinite by overflowing the width.
fn parse_float<F>(text: &str, bits: u32) -> Result<F, Cow<'static, str>>
where
    F: FromStr<Err = ParseFloatError> + Into<f64> + Copy,
{
    let n = text.parse::<F>().map_err(|e| Cow::Owned(e.to_string()))?;
    if !n.into().is_finite() && !spells_non_finite(text) {
        return Err(format!("{text} is out of range for float{bits}").into());
    }
    Ok(n)
}

fn spells_non_finite(text: &str) -> bool {
    let unsigned = text.strip_prefix(['+', '-']).unwrap_or(text);
    ["inf", "infinity", "nan"].iter().any(|word| unsigned.eq_ignore_ascii_case(word))
}

/// Parses a duration such as `300ms`, `1.5h` or `2h45m`.
///
/// Summing and overflow checks are left to `humantime`, so its longer unit names (`min`, `d`,
/// `w` and so on) are accepted as well. A bare `0` is accepted. Negative durations are rejected
/// since [`Duration`] is unsigned.
///
/// # Errors
/// Returns a description of the first problem found.
pub fn parse_duration(text: &str) -> Result<Duration, Cow<'static, str>> {
    let (negative, body) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    if body == "0" {
        return Ok(Duration::ZERO);
    }
    if body.is_empty() {
        return Err(format!("invalid duration {text:?}").into());
    }

    let normalized = normalize_duration(body).map_err(|r| Cow::Owned(format!("{r} in duration {text:?}")))?;
    let duration = humantime::parse_duration(&normalized)
        .map_err(|e| Cow::Owned(format!("invalid duration {text:?}: {e}")))?;

    if negative && !duration.is_zero() {
        return Err(format!("negative duration {text:?} is not supported").into());
    }
    Ok(duration)
}

/// Rewrites the forms `humantime` does not read: `µs` becomes `us`, and a fractional pair such as
/// `1.5h` becomes `1h 1800000000000ns`.
fn normalize_duration(body: &str) -> Result<String, Cow<'static, str>> {
    let mut pairs = Vec::new();
    let mut rest = body;

    while !rest.is_empty() {
        let (whole, after) = split_digits(rest);
        let (fraction, after) = match after.strip_prefix('.') {
            Some(after_dot) => {
                let (fraction, after) = split_digits(after_dot);
                (Some(fraction), after)
            },
            None => (None, after),
        };

        let unit_len = after.find(|c: char| c.is_ascii_digit() || c == '.').unwrap_or(after.len());
        let (unit, tail) = after.split_at(unit_len);
        let unit = match unit.trim() {
            "µs" | "μs" => "us",
            trimmed => trimmed,
        };

        match fraction {
            None => pairs.push(format!("{whole}{unit}")),
            Some(fraction) => {
                if whole.is_empty() && fraction.is_empty() {
                    return Err("stray '.'".into());
                }
                let scale = unit_nanos(unit).ok_or_else(|| {
                    if unit.is_empty() {
                        Cow::Borrowed("missing unit")
                    } else {
                        Cow::Owned(format!("fractional value with unit {unit:?}"))
                    }
                })?;
                if !whole.is_empty() {
                    pairs.push(format!("{whole}{unit}"));
                }
                pairs.push(format!("{}ns", fraction_nanos(fraction, scale)));
            },
        }
        rest = tail;
    }

    Ok(pairs.join(" "))
}

fn split_digits(s: &str) -> (&str, &str) {
    s.split_at(s.bytes().take_while(u8::is_ascii_digit).count())
}

fn fraction_nanos(digits: &str, scale: u128) -> u128 {
    let digits = &digits[..digits.len().min(MAX_FRACTION_DIGITS)];
    if digits.is_empty() {
        return 0;
    }
    // At most 20 ASCII digits, so both the parse and the product fit in u128.
    let value = digits.parse::<u128>().unwrap_or_default();
    value * scale / 10u128.pow(digits.len() as u32)
}

fn unit_nanos(unit: &str) -> Option<u128> {
    Some(match unit {
        "ns" => 1,
        "us" => 1_000,
        "ms" => 1_000_000,
        "s" => NANOS_PER_SEC,
        "m" => 60 * NANOS_PER_SEC,
        "h" => 3_600 * NANOS_PER_SEC,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const INT: TypeKind = TypeKind::Int { bits: 64 };
    const UINT: TypeKind = TypeKind::Uint { bits: 64 };

    #[test]
    fn strings_are_not_trimmed() {
        assert_eq!(coerce(b"  padded ", TypeKind::String), Ok(Value::String("  padded ".to_owned())));
        assert_eq!(coerce(b"", TypeKind::String), Ok(Value::String(String::new())));
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        assert!(coerce(&[0xff, 0xfe], TypeKind::String).is_err());
    }

    #[test]
    fn booleans_accept_canonical_forms() {
        for raw in ["1", "t", "T", "true", "TRUE", "True"] {
            assert_eq!(coerce(raw.as_bytes(), TypeKind::Bool), Ok(Value::Bool(true)), "{raw}");
        }
        for raw in ["0", "f", "F", "false", "FALSE", "False"] {
            assert_eq!(coerce(raw.as_bytes(), TypeKind::Bool), Ok(Value::Bool(false)), "{raw}");
        }
        for raw in ["yes", "", "2", " true"] {
            assert!(coerce(raw.as_bytes(), TypeKind::Bool).is_err(), "{raw:?}");
        }
    }

    #[test]
    fn signed_integers_respect_width() {
        assert_eq!(coerce(b"-100", INT), Ok(Value::Int(-100)));
        assert_eq!(coerce(b"127", TypeKind::Int { bits: 8 }), Ok(Value::Int(127)));
        assert_eq!(coerce(b"-128", TypeKind::Int { bits: 8 }), Ok(Value::Int(-128)));
        assert!(coerce(b"128", TypeKind::Int { bits: 8 }).is_err());
        assert!(coerce(b"9223372036854775808", INT).is_err());
        assert!(coerce(b"0x10", INT).is_err());
    }

    #[test]
    fn unsigned_integers_reject_negatives_and_overflow() {
        assert_eq!(coerce(b"1", UINT), Ok(Value::Uint(1)));
        assert_eq!(coerce(b"255", TypeKind::Uint { bits: 8 }), Ok(Value::Uint(255)));
        assert!(coerce(b"256", TypeKind::Uint { bits: 8 }).is_err());
        assert!(coerce(b"-1", UINT).is_err());
        assert!(coerce(b"-0", UINT).is_err());
    }

    #[test]
    fn floats_round_to_field_width() {
        assert_eq!(coerce(b"100.01", TypeKind::Float { bits: 32 }), Ok(Value::Float32(100.01_f32)));
        assert_eq!(coerce(b"42.42", TypeKind::Float { bits: 64 }), Ok(Value::Float64(42.42)));
        assert_eq!(coerce(b"1e3", TypeKind::Float { bits: 64 }), Ok(Value::Float64(1000.0)));
        assert!(coerce(b"1,5", TypeKind::Float { bits: 64 }).is_err());
    }

    #[test]
    fn float_overflow_is_rejected() {
        let err = coerce(b"1e40", TypeKind::Float { bits: 32 }).expect_err("past f32::MAX");
        assert!(err.reason.contains("out of range for float32"), "{err}");
        assert!(coerce(b"-1e40", TypeKind::Float { bits: 32 }).is_err());
        assert!(coerce(b"1e400", TypeKind::Float { bits: 64 }).is_err());
        assert_eq!(coerce(b"1e40", TypeKind::Float { bits: 64 }), Ok(Value::Float64(1e40)));
    }

    #[test]
    fn spelled_infinity_and_nan_are_kept() {
        assert_eq!(coerce(b"inf", TypeKind::Float { bits: 32 }), Ok(Value::Float32(f32::INFINITY)));
        assert_eq!(coerce(b"-Infinity", TypeKind::Float { bits: 64 }), Ok(Value::Float64(f64::NEG_INFINITY)));
        assert!(matches!(coerce(b"NaN", TypeKind::Float { bits: 64 }), Ok(Value::Float64(n)) if n.is_nan()));
    }

    #[test]
    fn durations_sum_unit_pairs() {
        assert_eq!(parse_duration("10s"), Ok(Duration::from_secs(10)));
        assert_eq!(parse_duration("15m"), Ok(Duration::from_secs(900)));
        assert_eq!(parse_duration("1ns"), Ok(Duration::from_nanos(1)));
        assert_eq!(parse_duration("1h30m"), Ok(Duration::from_secs(5_400)));
        assert_eq!(parse_duration("1.5s"), Ok(Duration::from_millis(1_500)));
        assert_eq!(parse_duration(".5ms"), Ok(Duration::from_micros(500)));
        assert_eq!(parse_duration("3µs"), Ok(Duration::from_micros(3)));
        assert_eq!(parse_duration("3us"), Ok(Duration::from_micros(3)));
        assert_eq!(parse_duration("+2h"), Ok(Duration::from_secs(7_200)));
        assert_eq!(parse_duration("0"), Ok(Duration::ZERO));
        assert_eq!(parse_duration("-0s"), Ok(Duration::ZERO));
        assert_eq!(parse_duration("1.5h"), Ok(Duration::from_secs(5_400)));
        assert_eq!(parse_duration("2h45.5m3μs"), Ok(Duration::from_secs(9_930) + Duration::from_micros(3)));
    }

    #[test]
    fn longer_unit_names_are_accepted() {
        assert_eq!(parse_duration("1d"), Ok(Duration::from_secs(86_400)));
        assert_eq!(parse_duration("2min"), Ok(Duration::from_secs(120)));
        assert_eq!(parse_duration("1h 30m"), Ok(Duration::from_secs(5_400)));
    }

    #[test]
    fn malformed_durations_are_rejected() {
        for raw in ["", "10", "s", "1x", "1.s.", "1.5", "1.5d", ".h", "-5s", "1h-30m", "99999999999999999999999999999999999999999h"] {
            assert!(parse_duration(raw).is_err(), "{raw:?} should be rejected");
        }
    }
}
