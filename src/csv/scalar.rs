//! Field-level scalar parsing.
//!
//! All helpers trim surrounding whitespace and treat an all-blank field
//! as the type's zero value. Integers accept the `0x`/`0X` radix prefix
//! after an optional sign.

use thiserror::Error;

/// A field's text could not be read as the requested scalar type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{text}' is not a valid {expected}")]
pub struct ScalarError {
    pub expected: &'static str,
    pub text: String,
}

impl ScalarError {
    fn new(expected: &'static str, text: &str) -> Self {
        Self {
            expected,
            text: text.to_string(),
        }
    }
}

/// `1`/`true` are true, `0`/`false`/blank are false (case-insensitive).
pub fn parse_bool(s: &str) -> Result<bool, ScalarError> {
    let t = s.trim();
    if t.is_empty() || t == "0" || t.eq_ignore_ascii_case("false") {
        Ok(false)
    } else if t == "1" || t.eq_ignore_ascii_case("true") {
        Ok(true)
    } else {
        Err(ScalarError::new("bool", s))
    }
}

pub fn parse_int(s: &str) -> Result<i32, ScalarError> {
    let t = s.trim();
    if t.is_empty() {
        return Ok(0);
    }
    decode_radix::<i32>(t).ok_or_else(|| ScalarError::new("int", s))
}

pub fn parse_long(s: &str) -> Result<i64, ScalarError> {
    let t = s.trim();
    if t.is_empty() {
        return Ok(0);
    }
    decode_radix::<i64>(t).ok_or_else(|| ScalarError::new("long", s))
}

pub fn parse_float(s: &str) -> Result<f32, ScalarError> {
    let t = s.trim();
    if t.is_empty() {
        return Ok(0.0);
    }
    t.parse::<f32>().map_err(|_| ScalarError::new("float", s))
}

trait RadixInt: Sized {
    fn from_radix(src: &str, radix: u32) -> Option<Self>;
    fn negate(self) -> Option<Self>;
}

macro_rules! radix_int {
    ($ty:ty) => {
        impl RadixInt for $ty {
            fn from_radix(src: &str, radix: u32) -> Option<Self> {
                <$ty>::from_str_radix(src, radix).ok()
            }
            fn negate(self) -> Option<Self> {
                self.checked_neg()
            }
        }
    };
}

radix_int!(i32);
radix_int!(i64);

fn decode_radix<T: RadixInt>(t: &str) -> Option<T> {
    let (neg, body) = match t.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, t.strip_prefix('+').unwrap_or(t)),
    };
    let v = if let Some(hex) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        T::from_radix(hex, 16)?
    } else {
        T::from_radix(body, 10)?
    };
    if neg {
        v.negate()
    } else {
        Some(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bool_accepts_one_and_true() {
        assert!(parse_bool("1").unwrap());
        assert!(parse_bool("true").unwrap());
        assert!(parse_bool("TRUE").unwrap());
        assert!(!parse_bool("0").unwrap());
        assert!(!parse_bool("false").unwrap());
        assert!(!parse_bool("  ").unwrap());
        assert!(parse_bool("yes").is_err());
    }

    #[test]
    fn test_blank_is_zero() {
        assert_eq!(parse_int("  ").unwrap(), 0);
        assert_eq!(parse_long("").unwrap(), 0);
        assert_eq!(parse_float("\t").unwrap(), 0.0);
    }

    #[test]
    fn test_int_radix_prefix() {
        assert_eq!(parse_int("0x10").unwrap(), 16);
        assert_eq!(parse_int("0XFF").unwrap(), 255);
        assert_eq!(parse_int("-0x10").unwrap(), -16);
        assert_eq!(parse_long("0x100000000").unwrap(), 0x1_0000_0000);
    }

    #[test]
    fn test_int_trims_and_signs() {
        assert_eq!(parse_int(" 42 ").unwrap(), 42);
        assert_eq!(parse_int("-7").unwrap(), -7);
        assert_eq!(parse_int("+7").unwrap(), 7);
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(parse_int("12a").is_err());
        assert!(parse_long("0x").is_err());
        assert!(parse_float("1.2.3").is_err());
    }

    #[test]
    fn test_float_parses() {
        assert_eq!(parse_float("1.5").unwrap(), 1.5);
        assert_eq!(parse_float(" -2 ").unwrap(), -2.0);
    }
}
