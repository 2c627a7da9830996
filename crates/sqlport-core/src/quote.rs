//! Conversion of values into SQL literals.
//!
//! [`quote`] turns a [`Value`] into a literal that is safe to interpolate
//! into SQL for the given (or inferred) type. With `quote: false` it instead
//! produces the normalized value a driver would bind, and `None` stands for
//! NULL.

use std::fs::File;
use std::io::Read;
use std::sync::OnceLock;

use regex::Regex;

use crate::backend::{Backend, NowKind};
use crate::error::{Error, Result};
use crate::lob::LobRegistry;
use crate::registry::{Resolved, resolve};
use crate::types::LogicalType;
use crate::value::Value;

const OPERATION: &str = "quote";

/// How [`quote`] renders its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuoteOptions {
    /// Produce a delimited SQL literal (otherwise the bare value)
    pub quote: bool,
    /// Escape LIKE wildcards in text values
    pub escape_wildcards: bool,
}

impl QuoteOptions {
    /// SQL literal, wildcards untouched.
    pub const QUOTED: Self = Self {
        quote: true,
        escape_wildcards: false,
    };

    /// Bare value for parameter binding.
    pub const UNQUOTED: Self = Self {
        quote: false,
        escape_wildcards: false,
    };

    /// SQL literal usable inside a LIKE pattern.
    pub const PATTERN: Self = Self {
        quote: true,
        escape_wildcards: true,
    };
}

impl Default for QuoteOptions {
    fn default() -> Self {
        Self::QUOTED
    }
}

/// Quote `value` as `type_name`, inferring the type when none is given.
pub fn quote(
    backend: &dyn Backend,
    value: &Value,
    type_name: Option<&str>,
    options: QuoteOptions,
) -> Result<Option<String>> {
    if value.is_null() || (value.is_empty_text() && backend.options().portability.empty_to_null)
    {
        return Ok(options.quote.then(|| "NULL".to_string()));
    }

    let ty = match type_name {
        Some(type_name) => match resolve(backend.options(), type_name) {
            Resolved::Builtin(ty) => ty,
            Resolved::Extension {
                name, extension, ..
            } => return extension.quote(backend, &name, value, options),
            Resolved::Unknown(name) => {
                return Err(Error::unsupported(
                    OPERATION,
                    format!("type not defined: {name}"),
                ));
            }
        },
        None => infer_type(value),
    };

    let mut quoted = quote_builtin(backend, value, ty, options)?;
    if options.quote
        && options.escape_wildcards
        && backend.string_quoting().needs_escape_clause()
    {
        quoted.push_str(&backend.pattern_escape_string());
    }

    tracing::trace!(type_name = ty.name(), sql = %quoted, "Quoted value");
    Ok(Some(quoted))
}

/// Quote `value` as a SQL literal of `type_name`. NULL becomes `NULL`.
pub fn quote_literal(backend: &dyn Backend, value: &Value, type_name: Option<&str>) -> Result<String> {
    Ok(quote(backend, value, type_name, QuoteOptions::QUOTED)?
        .unwrap_or_else(|| "NULL".to_string()))
}

/// Replace a LOB reference by the LOB contents so it can be quoted.
///
/// Other values are returned unchanged.
pub fn dereference_lob(
    backend: &dyn Backend,
    lobs: &mut LobRegistry,
    value: &Value,
) -> Result<Value> {
    match value {
        Value::Lob(locator) => Ok(Value::Bytes(lobs.contents(backend, locator)?)),
        other => Ok(other.clone()),
    }
}

/// Comma-separated list of values, for IN clauses.
///
/// With a type each element is quoted; without one the elements are used in
/// their text form. An empty list yields `NULL`.
pub fn implode(backend: &dyn Backend, values: &[Value], type_name: Option<&str>) -> Result<String> {
    if values.is_empty() {
        return Ok("NULL".to_string());
    }
    let parts = values
        .iter()
        .map(|value| match type_name {
            Some(ty) => quote_literal(backend, value, Some(ty)),
            None => text_of(value),
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(parts.join(", "))
}

/// Logical type assumed for a value quoted without an explicit type.
///
/// Floats are quoted as `decimal`, composite values as `text`.
pub fn infer_type(value: &Value) -> LogicalType {
    match value {
        Value::Int(_) => LogicalType::Integer,
        Value::Float(_) => LogicalType::Decimal,
        Value::Bool(_) => LogicalType::Boolean,
        Value::Bytes(_) | Value::Lob(_) => LogicalType::Blob,
        Value::Null | Value::Json(_) => LogicalType::Text,
        Value::Text(text) => infer_text_type(text),
    }
}

fn infer_text_type(text: &str) -> LogicalType {
    if shape_matches(&TIMESTAMP_SHAPE, r"^\d{4}-\d{2}-\d{2} \d{2}:\d{2}$", text) {
        LogicalType::Timestamp
    } else if shape_matches(&TIME_SHAPE, r"^\d{2}:\d{2}$", text) {
        LogicalType::Time
    } else if shape_matches(&DATE_SHAPE, r"^\d{4}-\d{2}-\d{2}$", text) {
        LogicalType::Date
    } else if shape_matches(
        &UUID_SHAPE,
        r"(?i)^[a-f0-9]{8}-[a-f0-9]{4}-4[a-f0-9]{3}-[89ab][a-f0-9]{3}-[a-f0-9]{12}$",
        text,
    ) {
        LogicalType::Uuid
    } else {
        LogicalType::Text
    }
}

static TIMESTAMP_SHAPE: OnceLock<Option<Regex>> = OnceLock::new();
static TIME_SHAPE: OnceLock<Option<Regex>> = OnceLock::new();
static DATE_SHAPE: OnceLock<Option<Regex>> = OnceLock::new();
static UUID_SHAPE: OnceLock<Option<Regex>> = OnceLock::new();
static EXPONENT_SHAPE: OnceLock<Option<Regex>> = OnceLock::new();

/// Compile `pattern` once into `cell`.
fn cached(cell: &'static OnceLock<Option<Regex>>, pattern: &str) -> Option<&'static Regex> {
    cell.get_or_init(|| match Regex::new(pattern) {
        Ok(regex) => Some(regex),
        Err(e) => {
            tracing::warn!(pattern, error = %e, "Invalid built-in regex pattern");
            None
        }
    })
    .as_ref()
}

fn shape_matches(cell: &'static OnceLock<Option<Regex>>, pattern: &str, text: &str) -> bool {
    cached(cell, pattern).is_some_and(|regex| regex.is_match(text))
}

fn quote_builtin(
    backend: &dyn Backend,
    value: &Value,
    ty: LogicalType,
    options: QuoteOptions,
) -> Result<String> {
    match ty {
        LogicalType::Integer => Ok(value.to_loose_i64().to_string()),
        LogicalType::Boolean => Ok(if value.is_truthy() { "1" } else { "0" }.to_string()),
        LogicalType::Text | LogicalType::Uuid => quote_text(backend, &text_of(value)?, options),
        LogicalType::Date => quote_temporal(backend, value, NowKind::Date, options),
        LogicalType::Time => quote_temporal(backend, value, NowKind::Time, options),
        LogicalType::Timestamp => quote_temporal(backend, value, NowKind::Timestamp, options),
        LogicalType::Float => numeric(value, quote_float),
        LogicalType::Decimal => numeric(value, normalize_decimal),
        LogicalType::Clob | LogicalType::Blob => quote_lob(backend, value, options),
        LogicalType::Json | LogicalType::Jsonb => quote_json(backend, value, options),
    }
}

/// Text form of a value about to be quoted as a string. Bytes must be UTF-8.
fn text_of(value: &Value) -> Result<String> {
    match value {
        Value::Lob(locator) => Err(Error::invalid(
            OPERATION,
            format!("LOB reference {locator} must be dereferenced before quoting"),
        )),
        Value::Bytes(bytes) => String::from_utf8(bytes.clone())
            .map_err(|_| Error::invalid(OPERATION, "binary value is not valid UTF-8 text")),
        other => Ok(other.to_text()),
    }
}

/// Number literal through `normalize`. A result without digits is not a number.
fn numeric(value: &Value, normalize: fn(&str) -> String) -> Result<String> {
    if let Value::Float(float) = value {
        if !float.is_finite() {
            return Err(Error::invalid(OPERATION, format!("non-finite float: {float}")));
        }
    }
    let text = text_of(value)?;
    let literal = normalize(&text);
    if literal.chars().any(|c| c.is_ascii_digit()) {
        Ok(literal)
    } else {
        Err(Error::invalid(OPERATION, format!("not a number: {text}")))
    }
}

fn quote_text(backend: &dyn Backend, text: &str, options: QuoteOptions) -> Result<String> {
    if !options.quote {
        return Ok(text.to_string());
    }
    let quoting = backend.string_quoting();
    let escaped = backend.escape(text, options.escape_wildcards)?;
    Ok(format!("{}{}{}", quoting.start, escaped, quoting.end))
}

fn quote_temporal(
    backend: &dyn Backend,
    value: &Value,
    kind: NowKind,
    options: QuoteOptions,
) -> Result<String> {
    if value.as_str() == Some(kind.keyword()) {
        return Ok(match backend.functions() {
            Some(functions) => functions.now(kind),
            None => kind.keyword().to_string(),
        });
    }
    quote_text(backend, &text_of(value)?, options)
}

/// Float literal: scientific notation is split into a normalized mantissa
/// and an exponent of at least two digits.
pub fn quote_float(text: &str) -> String {
    let captures = cached(&EXPONENT_SHAPE, r"(?i)^(.*)e([-+])(\d+)$")
        .and_then(|regex| regex.captures(text));
    match captures {
        Some(caps) => {
            let mantissa = normalize_decimal(&caps[1]);
            format!("{mantissa}E{}{:0>2}", &caps[2], &caps[3])
        }
        None => normalize_decimal(text),
    }
}

/// Decimal literal: strip everything but digits, separators, signs and
/// exponent markers, then settle which separator is the decimal point.
///
/// - `1000,00` and `1,000,00`: the last comma is the decimal point
/// - `1.000,00`: dots group thousands, the last comma is the decimal point
/// - `1,000.00`: commas group thousands
pub fn normalize_decimal(text: &str) -> String {
    let mut value: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-' | '+' | 'e' | 'E'))
        .collect();

    if !value.chars().all(|c| c.is_ascii_digit() || c == '.') {
        let comma = value.find(',').filter(|&pos| pos > 0);
        let dot = value.find('.').filter(|&pos| pos > 0);
        if let Some(comma) = comma {
            match dot {
                None => value = last_comma_as_point(&value),
                Some(dot) if dot < comma => value = last_comma_as_point(&value.replace('.', "")),
                Some(_) => value = value.replace(',', ""),
            }
        }
    }
    value
}

fn last_comma_as_point(value: &str) -> String {
    match value.rfind(',') {
        Some(last) => {
            let (head, tail) = value.split_at(last);
            format!("{}.{}", head.replace(',', ""), &tail[1..])
        }
        None => value.to_string(),
    }
}

fn quote_lob(backend: &dyn Backend, value: &Value, options: QuoteOptions) -> Result<String> {
    if let Value::Bytes(bytes) = value {
        return quote_bytes(backend, bytes.clone(), options);
    }
    let text = text_of(value)?;
    if backend.options().lob_allow_url_include {
        if let Some(contents) = read_url(backend, &text)? {
            return quote_bytes(backend, contents, options);
        }
    }
    quote_text(backend, &text, options)
}

/// LOB data: text literal when it is clean UTF-8, the backend's binary
/// literal otherwise. Bound (unquoted) values must be UTF-8.
fn quote_bytes(backend: &dyn Backend, bytes: Vec<u8>, options: QuoteOptions) -> Result<String> {
    match String::from_utf8(bytes) {
        Ok(text) if !options.quote => Ok(text),
        Ok(text) if !text.contains('\0') => quote_text(backend, &text, options),
        Ok(text) => Ok(backend.quote_binary(text.as_bytes())),
        Err(err) if options.quote => Ok(backend.quote_binary(err.as_bytes())),
        Err(_) => Err(Error::invalid(
            OPERATION,
            "binary LOB data is not valid UTF-8 and can only be quoted as a literal",
        )),
    }
}

/// Contents of a `file://` URL, `None` for any other text.
fn read_url(backend: &dyn Backend, text: &str) -> Result<Option<Vec<u8>>> {
    let Some(path) = strip_file_scheme(text) else {
        return Ok(None);
    };

    let read_failed = |err: std::io::Error| {
        Error::fatal(OPERATION, format!("could not read LOB source {path}"), Some(err))
    };
    let mut file = File::open(path).map_err(read_failed)?;
    let mut contents = Vec::new();
    let mut buffer = vec![0u8; backend.options().lob_buffer_length.max(1)];
    loop {
        let read = file.read(&mut buffer).map_err(read_failed)?;
        if read == 0 {
            break;
        }
        contents.extend_from_slice(&buffer[..read]);
    }

    tracing::debug!(path, bytes = contents.len(), "Inlined LOB from file");
    Ok(Some(contents))
}

fn strip_file_scheme(text: &str) -> Option<&str> {
    let scheme = text.get(..7)?;
    scheme
        .eq_ignore_ascii_case("file://")
        .then(|| &text[7..])
}

fn quote_json(backend: &dyn Backend, value: &Value, options: QuoteOptions) -> Result<String> {
    if !options.quote {
        return match value {
            Value::Text(text) => Ok(text.clone()),
            other => encode_json(other),
        };
    }
    let encoded = encode_json(value)?;
    let quoting = backend.string_quoting();
    let escaped = backend.escape(&encoded, options.escape_wildcards)?;
    Ok(format!("{}{}{}", quoting.start, escaped, quoting.end))
}

fn encode_json(value: &Value) -> Result<String> {
    value
        .to_json()
        .map(|json| json.to_string())
        .ok_or_else(|| {
            Error::invalid(
                OPERATION,
                format!("Unable to encode invalid JSON value: {}", value.to_text()),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::AnsiBackend;
    use crate::options::Options;

    fn q(value: impl Into<Value>, ty: Option<&str>) -> String {
        let backend = AnsiBackend::new("test");
        quote_literal(&backend, &value.into(), ty).unwrap()
    }

    fn raw(value: impl Into<Value>, ty: &str) -> Option<String> {
        let backend = AnsiBackend::new("test");
        quote(&backend, &value.into(), Some(ty), QuoteOptions::UNQUOTED).unwrap()
    }

    #[test]
    fn test_null_and_empty() {
        let backend = AnsiBackend::new("test");
        assert_eq!(quote(&backend, &Value::Null, None, QuoteOptions::QUOTED).unwrap().as_deref(), Some("NULL"));
        assert_eq!(quote(&backend, &Value::Null, Some("integer"), QuoteOptions::UNQUOTED).unwrap(), None);
        assert_eq!(q("", Some("text")), "''");

        let backend = AnsiBackend::new("test").with_options(Options::new().empty_to_null(true));
        let empty = Value::from("");
        assert_eq!(quote_literal(&backend, &empty, Some("text")).unwrap(), "NULL");
        assert_eq!(quote(&backend, &empty, Some("text"), QuoteOptions::UNQUOTED).unwrap(), None);
    }

    #[test]
    fn test_inference() {
        assert_eq!(infer_type(&Value::Int(1)), LogicalType::Integer);
        assert_eq!(infer_type(&Value::Float(1.5)), LogicalType::Decimal);
        assert_eq!(infer_type(&Value::Bool(false)), LogicalType::Boolean);
        assert_eq!(infer_type(&Value::from("2024-01-02 10:30")), LogicalType::Timestamp);
        assert_eq!(infer_type(&Value::from("2024-01-02 10:30:00")), LogicalType::Text);
        assert_eq!(infer_type(&Value::from("10:30")), LogicalType::Time);
        assert_eq!(infer_type(&Value::from("2024-01-02")), LogicalType::Date);
        assert_eq!(
            infer_type(&Value::from("123E4567-E89B-42D3-A456-426614174000")),
            LogicalType::Uuid
        );
        assert_eq!(
            infer_type(&Value::from("123e4567-e89b-12d3-a456-426614174000")),
            LogicalType::Text
        );
        assert_eq!(infer_type(&Value::Bytes(vec![1])), LogicalType::Blob);
    }

    #[test]
    fn test_text_escaping() {
        assert_eq!(q("O'Brien", None), "'O''Brien'");
        assert_eq!(q("'; DROP TABLE users; --", Some("text")), "'''; DROP TABLE users; --'");
        assert_eq!(raw("O'Brien", "text").as_deref(), Some("O'Brien"));
    }

    #[test]
    fn test_wildcard_escaping_appends_clause() {
        let backend = AnsiBackend::new("test");
        let quoted = quote(&backend, &Value::from("50%"), Some("text"), QuoteOptions::PATTERN)
            .unwrap()
            .unwrap();
        assert_eq!(quoted, "'50\\%' ESCAPE '\\'");
    }

    #[test]
    fn test_integer_and_boolean() {
        assert_eq!(q(42, None), "42");
        assert_eq!(q("12abc", Some("integer")), "12");
        assert_eq!(q(true, None), "1");
        assert_eq!(q("0", Some("boolean")), "0");
        assert_eq!(q("yes", Some("boolean")), "1");
    }

    #[test]
    fn test_temporal_sentinels() {
        assert_eq!(q("CURRENT_DATE", Some("date")), "CURRENT_DATE");
        assert_eq!(q("CURRENT_TIMESTAMP", Some("timestamp")), "CURRENT_TIMESTAMP");
        assert_eq!(q("CURRENT_DATE", Some("time")), "'CURRENT_DATE'");
        assert_eq!(q("2024-01-02", None), "'2024-01-02'");

        let backend = AnsiBackend::new("test").without_functions();
        assert_eq!(
            quote_literal(&backend, &Value::from("CURRENT_TIME"), Some("time")).unwrap(),
            "CURRENT_TIME"
        );
    }

    #[test]
    fn test_decimal_locales() {
        assert_eq!(normalize_decimal("1000,00"), "1000.00");
        assert_eq!(normalize_decimal("1.000,00"), "1000.00");
        assert_eq!(normalize_decimal("1,000.00"), "1000.00");
        assert_eq!(normalize_decimal("1,000,50"), "1000.50");
        assert_eq!(normalize_decimal("$ 1,234.5"), "1234.5");
        assert_eq!(normalize_decimal("12.50"), "12.50");
        assert_eq!(normalize_decimal("-3,5"), "-3.5");
        assert_eq!(q(1.5, None), "1.5");
    }

    #[test]
    fn test_float_exponent() {
        assert_eq!(quote_float("1.5e-3"), "1.5E-03");
        assert_eq!(quote_float("2,5E+10"), "2.5E+10");
        assert_eq!(quote_float("7e123"), "7e123");
        assert_eq!(quote_float("7e+123"), "7E+123");
        assert_eq!(q("1.5e-3", Some("float")), "1.5E-03");
    }

    #[test]
    fn test_json() {
        let value = Value::Json(serde_json::json!({"a": "it's"}));
        assert_eq!(q(value.clone(), Some("json")), "'{\"a\":\"it''s\"}'");
        assert_eq!(raw(value, "jsonb").as_deref(), Some("{\"a\":\"it's\"}"));
        assert_eq!(q("plain", Some("json")), "'\"plain\"'");

        let backend = AnsiBackend::new("test");
        let err = quote(&backend, &Value::Float(f64::NAN), Some("json"), QuoteOptions::QUOTED)
            .unwrap_err();
        assert!(err.is_invalid());
        assert!(err.message().starts_with("Unable to encode invalid JSON value"));
    }

    #[test]
    fn test_lob_values() {
        assert_eq!(q(Value::Bytes(b"abc".to_vec()), None), "'abc'");
        assert_eq!(q("file:///etc/hostname", Some("blob")), "'file:///etc/hostname'");

        let backend = AnsiBackend::new("test");
        let mut lobs = LobRegistry::new("test");
        let locator = lobs.register(Value::from("x'y"));
        let lob = Value::Lob(locator);
        assert!(quote_literal(&backend, &lob, Some("clob")).unwrap_err().is_invalid());
        let plain = dereference_lob(&backend, &mut lobs, &lob).unwrap();
        assert_eq!(quote_literal(&backend, &plain, Some("clob")).unwrap(), "'x''y'");
    }

    #[test]
    fn test_binary_lob_data_is_never_mangled() {
        let backend = AnsiBackend::new("test");
        let bytes = Value::Bytes(vec![0xff, 0x00, 0x41, 0xfe]);
        assert_eq!(quote_literal(&backend, &bytes, Some("blob")).unwrap(), "X'FF0041FE'");
        assert_eq!(quote_literal(&backend, &bytes, None).unwrap(), "X'FF0041FE'");
        assert!(
            quote(&backend, &bytes, Some("blob"), QuoteOptions::UNQUOTED)
                .unwrap_err()
                .is_invalid()
        );
        assert!(quote_literal(&backend, &bytes, Some("text")).unwrap_err().is_invalid());

        let with_nul = Value::Bytes(b"a\0b".to_vec());
        assert_eq!(quote_literal(&backend, &with_nul, Some("clob")).unwrap(), "X'610062'");
        assert_eq!(
            quote(&backend, &with_nul, Some("clob"), QuoteOptions::UNQUOTED)
                .unwrap()
                .map(String::into_bytes),
            Some(b"a\0b".to_vec())
        );

        let mut lobs = LobRegistry::new("test");
        let locator = lobs.register(bytes.clone());
        let stored = dereference_lob(&backend, &mut lobs, &Value::Lob(locator)).unwrap();
        assert_eq!(stored, bytes);
        assert_eq!(quote_literal(&backend, &stored, Some("blob")).unwrap(), "X'FF0041FE'");
    }

    #[test]
    fn test_non_numbers_are_rejected() {
        let backend = AnsiBackend::new("test");
        for value in [Value::Float(f64::INFINITY), Value::Float(f64::NAN)] {
            for ty in [Some("decimal"), Some("float"), None] {
                let err = quote_literal(&backend, &value, ty).unwrap_err();
                assert!(err.is_invalid());
                assert!(err.message().starts_with("non-finite float"));
            }
        }
        let err = quote_literal(&backend, &Value::from("n/a"), Some("decimal")).unwrap_err();
        assert_eq!(err.message(), "not a number: n/a");
        assert_eq!(q(-0.25, Some("float")), "-0.25");
    }

    #[test]
    fn test_inferred_types_skip_the_type_map() {
        let backend = AnsiBackend::new("test")
            .with_options(Options::new().map_type("integer", "text").map_type("text", "money"));
        assert_eq!(quote_literal(&backend, &Value::Int(7), None).unwrap(), "7");
        assert_eq!(quote_literal(&backend, &Value::from("x"), None).unwrap(), "'x'");
        assert_eq!(quote_literal(&backend, &Value::Int(7), Some("integer")).unwrap(), "'7'");
        assert!(
            quote_literal(&backend, &Value::from("x"), Some("text"))
                .unwrap_err()
                .is_unsupported()
        );
    }

    #[test]
    fn test_unknown_type() {
        let backend = AnsiBackend::new("test");
        let err = quote(&backend, &Value::from("x"), Some("money"), QuoteOptions::QUOTED).unwrap_err();
        assert!(err.is_unsupported());
        assert_eq!(err.message(), "type not defined: money");
    }

    #[test]
    fn test_implode() {
        let backend = AnsiBackend::new("test");
        assert_eq!(implode(&backend, &[], Some("integer")).unwrap(), "NULL");
        let values = [Value::from("a"), Value::from("b'c")];
        assert_eq!(implode(&backend, &values, Some("text")).unwrap(), "'a', 'b''c'");
        assert_eq!(implode(&backend, &[Value::Int(1), Value::Int(2)], None).unwrap(), "1, 2");
        assert!(implode(&backend, &[Value::Bytes(vec![0xff])], None).is_err());
    }
}
