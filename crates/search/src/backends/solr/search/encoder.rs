//! Conversion between native values and Solr query literals.
//!
//! - [`encode`] renders a [`FieldValue`] as the literal Solr expects in a query
//!   or an update document
//! - [`decode`] turns a raw JSON value from a response back into a
//!   [`FieldValue`], guided by the declared field type when known
//! - [`escape_reserved`] neutralizes query syntax in user-entered text

use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use serde_json::Value;

use crate::error::DecodeError;
use crate::schema::FieldType;
use crate::types::FieldValue;

/// Words Solr treats as operators.
pub const RESERVED_WORDS: &[&str] = &["AND", "NOT", "OR", "TO"];

/// Character sequences Solr treats as syntax. The backslash comes first so
/// that escapes inserted for later entries are not escaped again.
pub const RESERVED_CHARACTERS: &[&str] = &[
    "\\", "+", "-", "&&", "||", "!", "(", ")", "{", "}", "[", "]", "^", "\"", "~", "*", "?", ":",
];

/// Format of Solr's canonical UTC timestamp literal.
pub const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

static DATETIME_REGEX: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^(\d{4})-(\d{2})-(\d{2})T(\d{2}):(\d{2}):(\d{2})(?:\.\d+)?Z$").ok()
});

/// Renders a value as a Solr literal.
///
/// Dates become midnight UTC timestamps and floats always keep a fractional
/// part (`3.0`, not `3`). Lists are rendered element-wise and comma-joined;
/// callers that need per-element clauses iterate themselves.
pub fn encode(value: &FieldValue) -> String {
    match value {
        FieldValue::Null => String::new(),
        FieldValue::Bool(b) => b.to_string(),
        FieldValue::Int(i) => i.to_string(),
        FieldValue::Float(f) => format!("{:?}", f),
        FieldValue::Date(d) => format!("{}T00:00:00Z", d.format("%Y-%m-%d")),
        FieldValue::DateTime(dt) => dt.format(DATETIME_FORMAT).to_string(),
        FieldValue::Text(s) => s.clone(),
        FieldValue::List(values) => values.iter().map(encode).collect::<Vec<_>>().join(","),
    }
}

/// Renders a value as JSON for an update document.
///
/// Numbers and booleans keep their JSON types; dates use the timestamp
/// literal.
pub fn to_json(value: &FieldValue) -> Value {
    match value {
        FieldValue::Null => Value::Null,
        FieldValue::Bool(b) => Value::Bool(*b),
        FieldValue::Int(i) => Value::from(*i),
        FieldValue::Float(f) => Value::from(*f),
        FieldValue::List(values) => Value::Array(values.iter().map(to_json).collect()),
        other => Value::String(encode(other)),
    }
}

/// Converts a raw response value back into a typed value.
///
/// With no declared type the value is inferred from its shape: JSON numbers
/// and booleans map directly, strings that look like timestamps, booleans or
/// numbers are parsed, anything else stays text. An encoded
/// [`FieldValue::Date`] comes back as a midnight [`FieldValue::DateTime`]
/// unless [`FieldType::Date`] is declared. A declared type that the value
/// does not fit is a [`DecodeError`].
pub fn decode(
    value: &Value,
    declared: Option<FieldType>,
    field: &str,
) -> Result<FieldValue, DecodeError> {
    match value {
        Value::Null => Ok(FieldValue::Null),
        Value::Array(items) => items
            .iter()
            .map(|item| decode(item, declared, field))
            .collect::<Result<Vec<_>, _>>()
            .map(FieldValue::List),
        Value::Object(_) => Err(invalid(field, "scalar", value)),
        Value::Bool(b) => match declared {
            None | Some(FieldType::Boolean) => Ok(FieldValue::Bool(*b)),
            Some(other) => Err(invalid(field, &other.to_string(), value)),
        },
        Value::Number(n) => decode_number(n, declared, field, value),
        Value::String(s) => decode_str(s, declared, field),
    }
}

fn decode_number(
    n: &serde_json::Number,
    declared: Option<FieldType>,
    field: &str,
    raw: &Value,
) -> Result<FieldValue, DecodeError> {
    match declared {
        Some(FieldType::Integer) => n
            .as_i64()
            .map(FieldValue::Int)
            .ok_or_else(|| invalid(field, "integer", raw)),
        Some(FieldType::Float) => n
            .as_f64()
            .map(FieldValue::Float)
            .ok_or_else(|| invalid(field, "float", raw)),
        Some(FieldType::Text | FieldType::NGram | FieldType::EdgeNGram) => {
            Ok(FieldValue::Text(n.to_string()))
        }
        None => Ok(n
            .as_i64()
            .map(FieldValue::Int)
            .or_else(|| n.as_f64().map(FieldValue::Float))
            .unwrap_or_else(|| FieldValue::Text(n.to_string()))),
        Some(other) => Err(invalid(field, &other.to_string(), raw)),
    }
}

fn decode_str(s: &str, declared: Option<FieldType>, field: &str) -> Result<FieldValue, DecodeError> {
    let raw = || Value::String(s.to_string());
    match declared {
        Some(FieldType::Text | FieldType::NGram | FieldType::EdgeNGram) => {
            Ok(FieldValue::text(s))
        }
        Some(FieldType::DateTime) => {
            parse_datetime(s).ok_or_else(|| invalid(field, "datetime", &raw()))
        }
        Some(FieldType::Date) => match parse_datetime(s) {
            Some(FieldValue::DateTime(dt)) => Ok(FieldValue::Date(dt.date_naive())),
            _ => NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .map(FieldValue::Date)
                .map_err(|_| invalid(field, "date", &raw())),
        },
        Some(FieldType::Integer) => s
            .parse::<i64>()
            .map(FieldValue::Int)
            .map_err(|_| invalid(field, "integer", &raw())),
        Some(FieldType::Float) => s
            .parse::<f64>()
            .map(FieldValue::Float)
            .map_err(|_| invalid(field, "float", &raw())),
        Some(FieldType::Boolean) => match s {
            "true" => Ok(FieldValue::Bool(true)),
            "false" => Ok(FieldValue::Bool(false)),
            _ => Err(invalid(field, "boolean", &raw())),
        },
        None => Ok(infer_str(s)),
    }
}

fn infer_str(s: &str) -> FieldValue {
    match s {
        "true" => return FieldValue::Bool(true),
        "false" => return FieldValue::Bool(false),
        _ => {}
    }
    if let Some(dt) = parse_datetime(s) {
        return dt;
    }
    if let Ok(i) = s.parse::<i64>() {
        return FieldValue::Int(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        if f.is_finite() {
            return FieldValue::Float(f);
        }
    }
    FieldValue::text(s)
}

fn parse_datetime(s: &str) -> Option<FieldValue> {
    let caps = DATETIME_REGEX.as_ref()?.captures(s)?;
    let part = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());
    let date = NaiveDate::from_ymd_opt(part(1)? as i32, part(2)?, part(3)?)?;
    let naive: NaiveDateTime = date.and_hms_opt(part(4)?, part(5)?, part(6)?)?;
    Some(FieldValue::DateTime(Utc.from_utc_datetime(&naive)))
}

fn invalid(field: &str, expected: &str, value: &Value) -> DecodeError {
    DecodeError::InvalidValue {
        field: field.to_string(),
        expected: expected.to_string(),
        value: value.to_string(),
    }
}

/// Escapes reserved words and characters in user-entered text.
///
/// The text is split on whitespace; reserved words are prefixed with a
/// backslash, reserved characters inside words are backslash-escaped, and
/// the words are rejoined with single spaces.
pub fn escape_reserved(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            if RESERVED_WORDS.contains(&word) {
                return format!("\\{}", word);
            }
            RESERVED_CHARACTERS
                .iter()
                .fold(word.to_string(), |acc, ch| {
                    acc.replace(ch, &format!("\\{}", ch))
                })
        })
        .collect::<Vec<_>>()
        .join(" ")
}
