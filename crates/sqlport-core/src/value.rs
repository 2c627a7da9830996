//! Dynamic values crossing the type-layer boundary.

use serde::{Deserialize, Serialize};

use crate::lob::LobLocator;

/// A dynamically-typed value.
///
/// Raw backend results enter the system as `Text`, `Bytes` or `Null`;
/// decoding produces the native variant for the requested logical type.
/// Application values handed to the quoter use the same enum, which keeps
/// type inference a pure match over a closed set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// NULL value
    Null,

    /// Boolean value
    Bool(bool),

    /// 64-bit signed integer
    Int(i64),

    /// 64-bit floating point
    Float(f64),

    /// Text string
    Text(String),

    /// Binary data
    Bytes(Vec<u8>),

    /// Structured (composite) value
    Json(serde_json::Value),

    /// Reference to a large object held by a LOB registry
    Lob(LobLocator),
}

impl Value {
    /// Check if this value is NULL.
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get the type name of this value.
    pub const fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Bool(_) => "BOOLEAN",
            Value::Int(_) => "INTEGER",
            Value::Float(_) => "FLOAT",
            Value::Text(_) => "TEXT",
            Value::Bytes(_) => "BYTES",
            Value::Json(_) => "JSON",
            Value::Lob(_) => "LOB",
        }
    }

    /// Try to convert this value to a bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            Value::Int(v) => Some(*v != 0),
            _ => None,
        }
    }

    /// Try to convert this value to an i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Bool(v) => Some(i64::from(*v)),
            _ => None,
        }
    }

    /// Try to convert this value to an f64.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Try to get this value as a string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get this value as a byte slice.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            Value::Text(s) => Some(s.as_bytes()),
            _ => None,
        }
    }

    /// Try to get the LOB reference held by this value.
    pub fn as_lob(&self) -> Option<&LobLocator> {
        match self {
            Value::Lob(locator) => Some(locator),
            _ => None,
        }
    }

    /// Check if this is the empty string.
    pub fn is_empty_text(&self) -> bool {
        matches!(self, Value::Text(s) if s.is_empty())
    }

    /// Loose truthiness: `""`, `"0"`, `0`, `0.0`, `false`, NULL and empty
    /// containers are false, everything else is true.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(v) => *v,
            Value::Int(v) => *v != 0,
            Value::Float(v) => *v != 0.0,
            Value::Text(s) => !(s.is_empty() || s == "0"),
            Value::Bytes(b) => !(b.is_empty() || b.as_slice() == b"0"),
            Value::Json(json) => json_truthy(json),
            Value::Lob(_) => true,
        }
    }

    /// Loose integer conversion.
    ///
    /// Text is read up to the end of its leading numeric prefix, fractional
    /// parts are truncated, out-of-range values saturate and anything
    /// non-numeric becomes 0.
    pub fn to_loose_i64(&self) -> i64 {
        match self {
            Value::Null | Value::Lob(_) => 0,
            Value::Bool(v) => i64::from(*v),
            Value::Int(v) => *v,
            Value::Float(v) => *v as i64,
            Value::Text(s) => parse_loose_i64(s),
            Value::Bytes(b) => parse_loose_i64(&String::from_utf8_lossy(b)),
            Value::Json(json) => match json {
                serde_json::Value::Number(n) => n
                    .as_i64()
                    .or_else(|| n.as_f64().map(|f| f as i64))
                    .unwrap_or(0),
                serde_json::Value::String(s) => parse_loose_i64(s),
                other => i64::from(json_truthy(other)),
            },
        }
    }

    /// Loose floating-point conversion (same prefix rules as [`Self::to_loose_i64`]).
    pub fn to_loose_f64(&self) -> f64 {
        match self {
            Value::Null | Value::Lob(_) => 0.0,
            Value::Bool(v) => f64::from(u8::from(*v)),
            Value::Int(v) => *v as f64,
            Value::Float(v) => *v,
            Value::Text(s) => parse_loose_f64(s),
            Value::Bytes(b) => parse_loose_f64(&String::from_utf8_lossy(b)),
            Value::Json(json) => match json {
                serde_json::Value::Number(n) => n.as_f64().unwrap_or(0.0),
                serde_json::Value::String(s) => parse_loose_f64(s),
                other => f64::from(u8::from(json_truthy(other))),
            },
        }
    }

    /// Textual form of the value, as it would be interpolated into SQL.
    ///
    /// NULL and `false` become the empty string, `true` becomes `"1"`,
    /// structured values are serialized as JSON. Bytes are decoded lossily;
    /// quoting checks them separately.
    pub fn to_text(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(v) => {
                if *v {
                    "1".to_string()
                } else {
                    String::new()
                }
            }
            Value::Int(v) => v.to_string(),
            Value::Float(v) => v.to_string(),
            Value::Text(s) => s.clone(),
            Value::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
            Value::Json(json) => json.to_string(),
            Value::Lob(locator) => locator.to_string(),
        }
    }

    /// Convert to a JSON document.
    ///
    /// Returns `None` for values JSON cannot represent: non-finite floats,
    /// bytes that are not valid UTF-8, and LOB references.
    pub fn to_json(&self) -> Option<serde_json::Value> {
        match self {
            Value::Null => Some(serde_json::Value::Null),
            Value::Bool(v) => Some(serde_json::Value::Bool(*v)),
            Value::Int(v) => Some(serde_json::Value::from(*v)),
            Value::Float(v) => serde_json::Number::from_f64(*v).map(serde_json::Value::Number),
            Value::Text(s) => Some(serde_json::Value::String(s.clone())),
            Value::Bytes(b) => std::str::from_utf8(b)
                .ok()
                .map(|s| serde_json::Value::String(s.to_string())),
            Value::Json(json) => Some(json.clone()),
            Value::Lob(_) => None,
        }
    }
}

fn json_truthy(json: &serde_json::Value) -> bool {
    match json {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(v) => *v,
        serde_json::Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        serde_json::Value::String(s) => !(s.is_empty() || s == "0"),
        serde_json::Value::Array(items) => !items.is_empty(),
        serde_json::Value::Object(map) => !map.is_empty(),
    }
}

/// Longest leading numeric prefix of `s`, after leading whitespace.
///
/// Accepts an optional sign, digits, an optional fraction and an optional
/// exponent (only when followed by at least one digit).
fn numeric_prefix(s: &str) -> &str {
    let s = s.trim_start_matches([' ', '\t', '\n', '\r', '\x0b', '\x0c']);
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let int_start = end;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    let mut digits = end - int_start;

    if bytes.get(end) == Some(&b'.') {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while bytes.get(frac_end).is_some_and(u8::is_ascii_digit) {
            frac_end += 1;
        }
        if digits > 0 || frac_end > frac_start {
            digits += frac_end - frac_start;
            end = frac_end;
        }
    }
    if digits == 0 {
        return "";
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while bytes.get(exp_end).is_some_and(u8::is_ascii_digit) {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    &s[..end]
}

pub(crate) fn parse_loose_i64(s: &str) -> i64 {
    let prefix = numeric_prefix(s);
    if prefix.is_empty() {
        return 0;
    }
    if prefix.contains(['.', 'e', 'E']) {
        return prefix.parse::<f64>().map_or(0, |f| f as i64);
    }
    prefix.parse::<i64>().unwrap_or_else(|_| {
        if prefix.starts_with('-') {
            i64::MIN
        } else {
            i64::MAX
        }
    })
}

pub(crate) fn parse_loose_f64(s: &str) -> f64 {
    numeric_prefix(s).parse::<f64>().unwrap_or(0.0)
}

// Conversion implementations
impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i8> for Value {
    fn from(v: i8) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u8> for Value {
    fn from(v: u8) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<u16> for Value {
    fn from(v: u16) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::Json(v)
    }
}

impl From<LobLocator> for Value {
    fn from(v: LobLocator) -> Self {
        Value::Lob(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}
