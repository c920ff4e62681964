//! Lenient field decoders for exported tables.
//!
//! Tables written by dataframe tools carry integers as `6028.0` once a column
//! holds a missing value, booleans as `True`/`False`, and missing cells as an
//! empty string or `nan`.

use serde::de::{Deserializer, Error};
use serde::Deserialize;

#[derive(Deserialize)]
#[serde(untagged)]
enum Flex {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Flex {
    fn is_missing(&self) -> bool {
        match self {
            Flex::Str(s) => {
                let s = s.trim();
                s.is_empty() || s.eq_ignore_ascii_case("nan") || s.eq_ignore_ascii_case("none")
            }
            Flex::Float(f) => f.is_nan(),
            _ => false,
        }
    }

    fn as_i64(&self) -> Option<i64> {
        match self {
            Flex::Int(i) => Some(*i),
            Flex::Float(f) if f.is_finite() && f.fract() == 0.0 => Some(*f as i64),
            Flex::Str(s) => {
                let s = s.trim();
                s.parse::<i64>().ok().or_else(|| {
                    s.parse::<f64>().ok().filter(|f| f.is_finite() && f.fract() == 0.0).map(|f| f as i64)
                })
            }
            _ => None,
        }
    }

    fn as_bool(&self) -> Option<bool> {
        match self {
            Flex::Bool(b) => Some(*b),
            Flex::Int(0) => Some(false),
            Flex::Int(1) => Some(true),
            Flex::Float(f) if *f == 0.0 => Some(false),
            Flex::Float(f) if *f == 1.0 => Some(true),
            Flex::Str(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Some(true),
                "false" | "0" | "no" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}

fn describe(value: &Flex) -> String {
    match value {
        Flex::Bool(b) => b.to_string(),
        Flex::Int(i) => i.to_string(),
        Flex::Float(f) => f.to_string(),
        Flex::Str(s) => format!("'{}'", s),
    }
}

pub fn flex_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let value = Flex::deserialize(deserializer)?;
    value.as_i64().ok_or_else(|| D::Error::custom(format!("expected integer, got {}", describe(&value))))
}

pub fn flex_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let n = flex_i64(deserializer)?;
    u32::try_from(n).map_err(|_| D::Error::custom(format!("{} is out of range for an id", n)))
}

pub fn flex_opt_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    let Some(value) = Option::<Flex>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if value.is_missing() {
        return Ok(None);
    }
    let n = value
        .as_i64()
        .ok_or_else(|| D::Error::custom(format!("expected id, got {}", describe(&value))))?;
    u32::try_from(n).map(Some).map_err(|_| D::Error::custom(format!("{} is out of range for an id", n)))
}

/// Missing cells read as `false`.
pub fn flex_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let Some(value) = Option::<Flex>::deserialize(deserializer)? else {
        return Ok(false);
    };
    if value.is_missing() {
        return Ok(false);
    }
    value.as_bool().ok_or_else(|| D::Error::custom(format!("expected boolean, got {}", describe(&value))))
}
