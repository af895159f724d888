//! `Structure` and `Merge` implementations for built-in types.
//!
//! Integers accept the same literal forms as Go's `strconv` with base 0:
//! an optional sign, then decimal, `0x` hex, `0o`/leading-zero octal or `0b`
//! binary. Underscores may separate digits, or follow a base prefix
//! (`1_000`, `0x_ff`), but may not lead, trail or repeat. Values outside the
//! target type's range are rejected rather than truncated.

use std::any::type_name;
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

use serde_json::Value;

use super::{Merge, OptionalSlot, Scalar, Shape, Structure};

fn parse_magnitude(digits: &str) -> Result<u128, String> {
    let (radix, body) = if let Some(rest) = strip_prefix2(digits, "0x", "0X") {
        (16, rest)
    } else if let Some(rest) = strip_prefix2(digits, "0b", "0B") {
        (2, rest)
    } else if let Some(rest) = strip_prefix2(digits, "0o", "0O") {
        (8, rest)
    } else if digits.len() > 1 && digits.starts_with('0') {
        (8, &digits[1..])
    } else {
        (10, digits)
    };

    if !underscores_ok(body, radix != 10) {
        return Err("invalid syntax".to_string());
    }
    let body = body.replace('_', "");
    if body.is_empty() || body.starts_with(['+', '-']) {
        return Err("invalid syntax".to_string());
    }

    u128::from_str_radix(&body, radix).map_err(|e| e.to_string())
}

/// `_` must follow a digit or the base prefix, and be followed by a digit.
fn underscores_ok(body: &str, after_prefix: bool) -> bool {
    let mut after_digit = after_prefix;
    let mut trailing = false;
    for c in body.chars() {
        if c == '_' {
            if !after_digit {
                return false;
            }
            after_digit = false;
            trailing = true;
        } else {
            after_digit = true;
            trailing = false;
        }
    }
    !trailing
}

fn strip_prefix2<'a>(s: &'a str, lower: &str, upper: &str) -> Option<&'a str> {
    s.strip_prefix(lower).or_else(|| s.strip_prefix(upper))
}

fn parse_signed(raw: &str) -> Result<i128, String> {
    let (negative, digits) = match raw.as_bytes().first() {
        Some(b'-') => (true, &raw[1..]),
        Some(b'+') => (false, &raw[1..]),
        _ => (false, raw),
    };
    let magnitude = i128::try_from(parse_magnitude(digits)?).map_err(|e| e.to_string())?;
    Ok(if negative { -magnitude } else { magnitude })
}

fn parse_unsigned(raw: &str) -> Result<u128, String> {
    if raw.starts_with(['+', '-']) {
        return Err("invalid syntax".to_string());
    }
    parse_magnitude(raw)
}

macro_rules! signed_scalar {
    ($($t:ty),*) => {$(
        impl Scalar for $t {
            fn assign(&mut self, raw: &str) -> Result<(), String> {
                let parsed = parse_signed(raw)?;
                *self = <$t>::try_from(parsed).map_err(|_| "value out of range".to_string())?;
                Ok(())
            }
        }

        impl Structure for $t {
            fn shape(&mut self) -> Shape<'_> {
                Shape::Scalar(self)
            }
        }

        impl Merge for $t {
            fn merge_missing(&mut self, lower: Self) {
                if *self == 0 {
                    *self = lower;
                }
            }
        }
    )*};
}

macro_rules! unsigned_scalar {
    ($($t:ty),*) => {$(
        impl Scalar for $t {
            fn assign(&mut self, raw: &str) -> Result<(), String> {
                let parsed = parse_unsigned(raw)?;
                *self = <$t>::try_from(parsed).map_err(|_| "value out of range".to_string())?;
                Ok(())
            }
        }

        impl Structure for $t {
            fn shape(&mut self) -> Shape<'_> {
                Shape::Scalar(self)
            }
        }

        impl Merge for $t {
            fn merge_missing(&mut self, lower: Self) {
                if *self == 0 {
                    *self = lower;
                }
            }
        }
    )*};
}

macro_rules! float_scalar {
    ($($t:ty),*) => {$(
        impl Scalar for $t {
            fn assign(&mut self, raw: &str) -> Result<(), String> {
                *self = raw.parse::<$t>().map_err(|e| e.to_string())?;
                Ok(())
            }
        }

        impl Structure for $t {
            fn shape(&mut self) -> Shape<'_> {
                Shape::Scalar(self)
            }
        }

        impl Merge for $t {
            fn merge_missing(&mut self, lower: Self) {
                if *self == 0.0 {
                    *self = lower;
                }
            }
        }
    )*};
}

signed_scalar!(i8, i16, i32, i64, isize);
unsigned_scalar!(u8, u16, u32, u64, usize);
float_scalar!(f32, f64);

impl Scalar for bool {
    fn assign(&mut self, raw: &str) -> Result<(), String> {
        match raw.to_lowercase().as_str() {
            "true" => *self = true,
            "false" => *self = false,
            _ => return Err("must be true or false".to_string()),
        }
        Ok(())
    }
}

impl Structure for bool {
    fn shape(&mut self) -> Shape<'_> {
        Shape::Scalar(self)
    }
}

impl Merge for bool {
    fn merge_missing(&mut self, lower: Self) {
        if !*self {
            *self = lower;
        }
    }
}

impl Scalar for String {
    fn assign(&mut self, raw: &str) -> Result<(), String> {
        raw.clone_into(self);
        Ok(())
    }
}

impl Structure for String {
    fn shape(&mut self) -> Shape<'_> {
        Shape::Scalar(self)
    }
}

impl Merge for String {
    fn merge_missing(&mut self, lower: Self) {
        if self.is_empty() {
            *self = lower;
        }
    }
}

impl<T: Structure + Default> OptionalSlot for Option<T> {
    fn is_empty(&self) -> bool {
        self.is_none()
    }

    fn fill(&mut self) -> &mut dyn Structure {
        self.get_or_insert_with(T::default)
    }

    fn clear(&mut self) {
        *self = None;
    }
}

impl<T: Structure + Default> Structure for Option<T> {
    fn shape(&mut self) -> Shape<'_> {
        Shape::Optional(self)
    }
}

impl<T: Merge> Merge for Option<T> {
    fn merge_missing(&mut self, lower: Self) {
        match self {
            None => *self = lower,
            Some(upper) => {
                if let Some(lower) = lower {
                    upper.merge_missing(lower);
                }
            }
        }
    }
}

impl<T> Structure for Vec<T> {
    fn shape(&mut self) -> Shape<'_> {
        Shape::Unsupported(type_name::<Self>())
    }
}

impl<T> Merge for Vec<T> {
    fn merge_missing(&mut self, lower: Self) {
        if self.is_empty() {
            *self = lower;
        }
    }
}

impl<K, V> Structure for HashMap<K, V> {
    fn shape(&mut self) -> Shape<'_> {
        Shape::Unsupported(type_name::<Self>())
    }
}

impl<K: Eq + Hash, V: Merge> Merge for HashMap<K, V> {
    fn merge_missing(&mut self, lower: Self) {
        for (key, value) in lower {
            match self.get_mut(&key) {
                Some(existing) => existing.merge_missing(value),
                None => {
                    self.insert(key, value);
                }
            }
        }
    }
}

impl<K, V> Structure for BTreeMap<K, V> {
    fn shape(&mut self) -> Shape<'_> {
        Shape::Unsupported(type_name::<Self>())
    }
}

impl<K: Ord, V: Merge> Merge for BTreeMap<K, V> {
    fn merge_missing(&mut self, lower: Self) {
        for (key, value) in lower {
            match self.get_mut(&key) {
                Some(existing) => existing.merge_missing(value),
                None => {
                    self.insert(key, value);
                }
            }
        }
    }
}

fn json_is_unset(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

impl Structure for Value {
    fn shape(&mut self) -> Shape<'_> {
        Shape::Unsupported("serde_json::Value")
    }
}

impl Merge for Value {
    fn merge_missing(&mut self, lower: Self) {
        match (self, lower) {
            (Value::Object(upper), Value::Object(lower)) if !upper.is_empty() => {
                for (key, value) in lower {
                    match upper.get_mut(&key) {
                        Some(existing) => existing.merge_missing(value),
                        None => {
                            upper.insert(key, value);
                        }
                    }
                }
            }
            (upper, lower) => {
                if json_is_unset(upper) {
                    *upper = lower;
                }
            }
        }
    }
}
