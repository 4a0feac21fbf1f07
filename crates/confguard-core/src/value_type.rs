//! # Declared Schema Types
//!
//! Every environment binding carries the JSON type its schema declares.
//! Environment variables are always strings; before a snapshot is
//! serialized the raw string is coerced into the declared type so that
//! `"8080"` reaches the validator as the number `8080`.
//!
//! Coercion never fails loudly. When a raw value cannot be represented in
//! the declared type it is left as a string, and schema validation then
//! reports the mismatch at the right path.

use std::fmt;

use serde_json::{Number, Value};

/// JSON type declared for a schema property.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DeclaredType {
    /// No usable type information; values pass through as strings.
    Any,
    /// `null`.
    Null,
    /// `boolean`.
    Boolean,
    /// `integer`.
    Integer,
    /// `number`.
    Number,
    /// `string`.
    String,
    /// `array`, with the declared element type.
    Array(Box<DeclaredType>),
    /// `object` without enumerated properties.
    Object,
}

impl DeclaredType {
    /// Map a JSON Schema `type` keyword value to a declared type.
    /// Arrays get an untyped element; callers refine it from `items`.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "null" => Some(Self::Null),
            "boolean" => Some(Self::Boolean),
            "integer" => Some(Self::Integer),
            "number" => Some(Self::Number),
            "string" => Some(Self::String),
            "array" => Some(Self::Array(Box::new(Self::Any))),
            "object" => Some(Self::Object),
            _ => None,
        }
    }

    /// Infer the type of a concrete value, e.g. a schema `default`.
    pub fn of_value(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Boolean,
            Value::Number(n) if n.is_i64() || n.is_u64() => Self::Integer,
            Value::Number(_) => Self::Number,
            Value::String(_) => Self::String,
            Value::Array(items) => Self::Array(Box::new(
                items.first().map(Self::of_value).unwrap_or(Self::Any),
            )),
            Value::Object(_) => Self::Object,
        }
    }

    /// Coerce a raw environment string into this type.
    ///
    /// Returns `None` when the string cannot be represented; the caller
    /// keeps the raw string in that case.
    pub fn coerce(&self, raw: &str) -> Option<Value> {
        let trimmed = raw.trim();
        match self {
            Self::Any | Self::String => Some(Value::String(raw.to_string())),
            Self::Null => (trimmed.is_empty() || trimmed == "null").then_some(Value::Null),
            Self::Boolean => parse_bool(trimmed).map(Value::Bool),
            Self::Integer => parse_integer(trimmed),
            Self::Number => parse_integer(trimmed).or_else(|| {
                trimmed
                    .parse::<f64>()
                    .ok()
                    .and_then(Number::from_f64)
                    .map(Value::Number)
            }),
            Self::Array(item) => coerce_array(item, trimmed),
            Self::Object => serde_json::from_str::<Value>(trimmed)
                .ok()
                .filter(Value::is_object),
        }
    }
}

impl fmt::Display for DeclaredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("any"),
            Self::Null => f.write_str("null"),
            Self::Boolean => f.write_str("boolean"),
            Self::Integer => f.write_str("integer"),
            Self::Number => f.write_str("number"),
            Self::String => f.write_str("string"),
            Self::Array(item) => write!(f, "array<{item}>"),
            Self::Object => f.write_str("object"),
        }
    }
}

/// `1`/`0`, `t`/`f` and `true`/`false` in lower, upper or title case.
fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

fn parse_integer(raw: &str) -> Option<Value> {
    if let Ok(i) = raw.parse::<i64>() {
        return Some(Value::Number(i.into()));
    }
    raw.parse::<u64>().ok().map(|u| Value::Number(u.into()))
}

/// A bracketed value is parsed as a JSON array; anything else is split on
/// commas and each element coerced to the item type.
fn coerce_array(item: &DeclaredType, raw: &str) -> Option<Value> {
    if raw.starts_with('[') {
        return serde_json::from_str::<Value>(raw).ok().filter(Value::is_array);
    }
    if raw.is_empty() {
        return Some(Value::Array(Vec::new()));
    }
    raw.split(',')
        .map(|element| item.coerce(element.trim()))
        .collect::<Option<Vec<_>>>()
        .map(Value::Array)
}
