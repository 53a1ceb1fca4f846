//! Conversion of raw config values into typed field values.
//!
//! Conversions are lenient in the way config files tend to need: a numeric
//! string converts to a number, a number renders as a string, a scalar read
//! as an array becomes a one-element array. `Null` (a missing key without a
//! default) never converts; callers fall back to `Default::default()`.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Map, Value};

/// Fixed timestamp layout accepted besides RFC 3339.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A type a config value can be injected into.
pub trait FromConfig: Clone + Default + Send + Sync + 'static {
    fn from_config(raw: &Value) -> Option<Self>;
}

/// Truncate a float into `i64`, rejecting values the type cannot hold.
fn float_to_i64(f: f64) -> Option<i64> {
    (f.is_finite() && f >= i64::MIN as f64 && f < i64::MAX as f64).then_some(f as i64)
}

fn float_to_u64(f: f64) -> Option<u64> {
    (f.is_finite() && f >= 0.0 && f < u64::MAX as f64).then_some(f as u64)
}

fn to_i64(raw: &Value) -> Option<i64> {
    match raw {
        Value::Number(n) if n.is_f64() => n.as_f64().and_then(float_to_i64),
        Value::Number(n) => n.as_i64(),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(float_to_i64))
        }
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

fn to_u64(raw: &Value) -> Option<u64> {
    match raw {
        Value::Number(n) if n.is_f64() => n.as_f64().and_then(float_to_u64),
        Value::Number(n) => n.as_u64(),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<u64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(float_to_u64))
        }
        Value::Bool(b) => Some(u64::from(*b)),
        _ => None,
    }
}

fn to_f64(raw: &Value) -> Option<f64> {
    match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

macro_rules! signed {
    ($($ty:ty),*) => {$(
        impl FromConfig for $ty {
            fn from_config(raw: &Value) -> Option<Self> {
                to_i64(raw).and_then(|v| <$ty>::try_from(v).ok())
            }
        }
    )*};
}

macro_rules! unsigned {
    ($($ty:ty),*) => {$(
        impl FromConfig for $ty {
            fn from_config(raw: &Value) -> Option<Self> {
                to_u64(raw).and_then(|v| <$ty>::try_from(v).ok())
            }
        }
    )*};
}

signed!(i8, i16, i32, i64, isize);
unsigned!(u8, u16, u32, u64, usize);

impl FromConfig for f64 {
    fn from_config(raw: &Value) -> Option<Self> {
        to_f64(raw)
    }
}

impl FromConfig for f32 {
    fn from_config(raw: &Value) -> Option<Self> {
        to_f64(raw).map(|f| f as f32)
    }
}

impl FromConfig for String {
    fn from_config(raw: &Value) -> Option<Self> {
        match raw {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

impl FromConfig for bool {
    fn from_config(raw: &Value) -> Option<Self> {
        match raw {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => n.as_f64().map(|f| f != 0.0),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "1" | "t" | "true" => Some(true),
                "0" | "f" | "false" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}

impl FromConfig for NaiveDateTime {
    fn from_config(raw: &Value) -> Option<Self> {
        let Value::String(s) = raw else {
            return None;
        };
        let s = s.trim();
        DateTime::parse_from_rfc3339(s)
            .map(|t| t.naive_utc())
            .or_else(|_| NaiveDateTime::parse_from_str(s, TIME_FORMAT))
            .ok()
    }
}

impl FromConfig for DateTime<Utc> {
    fn from_config(raw: &Value) -> Option<Self> {
        NaiveDateTime::from_config(raw).map(|t| t.and_utc())
    }
}

impl FromConfig for Map<String, Value> {
    fn from_config(raw: &Value) -> Option<Self> {
        raw.as_object().cloned()
    }
}

impl FromConfig for Vec<Value> {
    fn from_config(raw: &Value) -> Option<Self> {
        match raw {
            Value::Null => None,
            Value::Array(items) => Some(items.clone()),
            other => Some(vec![other.clone()]),
        }
    }
}

macro_rules! sequence {
    ($($ty:ty),*) => {$(
        impl FromConfig for Vec<$ty> {
            fn from_config(raw: &Value) -> Option<Self> {
                Vec::<Value>::from_config(raw).map(|items| {
                    items
                        .iter()
                        .map(|item| <$ty>::from_config(item).unwrap_or_default())
                        .collect()
                })
            }
        }
    )*};
}

sequence!(
    i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, String, bool,
    NaiveDateTime, DateTime<Utc>
);
