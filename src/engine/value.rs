// SPDX-License-Identifier: MIT

//! Typed scalar values and coercion from raw JSON

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;

use super::registry::FieldType;

/// A value coerced to a field's declared type
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TypedValue {
    Str(String),
    Number(f64),
    Bool(bool),
    Date(DateTime<Utc>),
}

impl TypedValue {
    /// Coerce a raw JSON value to `field_type`. Returns `None` when the value
    /// cannot represent that type; null, arrays and objects never coerce.
    pub fn coerce(raw: &Value, field_type: FieldType) -> Option<Self> {
        match field_type {
            FieldType::String => match raw {
                Value::String(s) => Some(TypedValue::Str(s.clone())),
                Value::Number(n) => Some(TypedValue::Str(n.to_string())),
                _ => None,
            },
            FieldType::Number => match raw {
                Value::Number(n) => n.as_f64().map(TypedValue::Number),
                Value::String(s) => s
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(TypedValue::Number),
                _ => None,
            },
            FieldType::Boolean => match raw {
                Value::Bool(b) => Some(TypedValue::Bool(*b)),
                Value::String(s) => match s.trim() {
                    "true" => Some(TypedValue::Bool(true)),
                    "false" => Some(TypedValue::Bool(false)),
                    _ => None,
                },
                _ => None,
            },
            FieldType::Date => match raw {
                Value::String(s) => parse_date(s.trim()).map(TypedValue::Date),
                Value::Number(n) => n
                    .as_i64()
                    .or_else(|| n.as_f64().map(|f| f.round() as i64))
                    .and_then(DateTime::from_timestamp_millis)
                    .map(TypedValue::Date),
                _ => None,
            },
        }
    }

    /// Equality after coercion; numbers compare exactly so that equality
    /// agrees with `compare`
    pub fn matches(&self, other: &TypedValue) -> bool {
        match (self, other) {
            (TypedValue::Str(a), TypedValue::Str(b)) => a == b,
            (TypedValue::Number(a), TypedValue::Number(b)) => a == b,
            (TypedValue::Bool(a), TypedValue::Bool(b)) => a == b,
            (TypedValue::Date(a), TypedValue::Date(b)) => a == b,
            _ => false,
        }
    }

    /// Ordering for numbers and dates only
    pub fn compare(&self, other: &TypedValue) -> Option<Ordering> {
        match (self, other) {
            (TypedValue::Number(a), TypedValue::Number(b)) => a.partial_cmp(b),
            (TypedValue::Date(a), TypedValue::Date(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Case-sensitive substring test; `None` unless both sides are strings
    pub fn contains(&self, needle: &TypedValue) -> Option<bool> {
        match (self, needle) {
            (TypedValue::Str(hay), TypedValue::Str(n)) => Some(hay.contains(n.as_str())),
            _ => None,
        }
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypedValue::Str(s) => write!(f, "\"{}\"", s),
            TypedValue::Number(n) => write!(f, "{}", n),
            TypedValue::Bool(b) => write!(f, "{}", b),
            TypedValue::Date(d) => write!(f, "{}", d.to_rfc3339()),
        }
    }
}

const NAIVE_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
];

fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
