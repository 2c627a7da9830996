//! Conversion of raw result values into native values.

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::lob::LobRegistry;
use crate::registry::{Resolved, resolve};
use crate::row::{Row, RowTypes};
use crate::types::LogicalType;
use crate::value::Value;

const OPERATION: &str = "convert_result";

/// Convert one raw result value to `type_name`.
///
/// NULL stays NULL for every type. `clob`/`blob` values are registered in
/// `lobs` and come back as [`Value::Lob`].
pub fn decode(
    backend: &dyn Backend,
    lobs: &mut LobRegistry,
    value: Value,
    type_name: &str,
    rtrim: bool,
) -> Result<Value> {
    if value.is_null() {
        return Ok(Value::Null);
    }

    let ty = match resolve(backend.options(), type_name) {
        Resolved::Builtin(ty) => ty,
        Resolved::Extension {
            name, extension, ..
        } => return extension.decode(backend, &name, value, rtrim),
        Resolved::Unknown(name) => {
            return Err(Error::invalid(
                OPERATION,
                format!("attempt to convert result value to an unknown type: {name}"),
            ));
        }
    };

    Ok(match ty {
        LogicalType::Text => {
            if rtrim {
                rtrim_value(value)
            } else {
                value
            }
        }
        LogicalType::Integer => Value::Int(value.to_loose_i64()),
        LogicalType::Boolean => Value::Bool(value.is_truthy()),
        LogicalType::Float => Value::Float(value.to_loose_f64()),
        LogicalType::Decimal
        | LogicalType::Date
        | LogicalType::Time
        | LogicalType::Timestamp
        | LogicalType::Uuid => value,
        LogicalType::Clob | LogicalType::Blob => {
            if let Value::Lob(locator) = value {
                Value::Lob(locator)
            } else {
                Value::Lob(lobs.register(value))
            }
        }
        LogicalType::Json | LogicalType::Jsonb => decode_json(value)?,
    })
}

/// Convert the typed columns of a row in place.
///
/// Column order and untyped columns are preserved; the first failing column
/// aborts the conversion. With [`Portability::lowercase`](crate::options::Portability)
/// named types are matched in lower case, as column keys are.
pub fn decode_row(
    backend: &dyn Backend,
    lobs: &mut LobRegistry,
    types: &RowTypes,
    row: Row,
    rtrim: bool,
) -> Result<Row> {
    let lowered;
    let types = if backend.options().portability.lowercase {
        lowered = types.with_lowercase_keys();
        &lowered
    } else {
        types
    };

    let columns = row.column_info();
    let aligned = types.align(&columns);
    let mut values = row.into_values();

    for (index, ty) in aligned.into_iter().enumerate() {
        let Some(ty) = ty else { continue };
        let Some(slot) = values.get_mut(index) else {
            break;
        };
        let raw = std::mem::replace(slot, Value::Null);
        *slot = decode(backend, lobs, raw, ty, rtrim)?;
    }

    Ok(Row::with_columns(columns, values))
}

fn rtrim_value(value: Value) -> Value {
    const TRAILING: [char; 6] = [' ', '\t', '\n', '\r', '\0', '\x0b'];
    match value {
        Value::Text(text) => Value::Text(text.trim_end_matches(TRAILING).to_string()),
        Value::Bytes(bytes) => {
            let end = bytes
                .iter()
                .rposition(|b| !TRAILING.contains(&char::from(*b)))
                .map_or(0, |i| i + 1);
            Value::Bytes(bytes[..end].to_vec())
        }
        other => other,
    }
}

fn decode_json(value: Value) -> Result<Value> {
    let text = match value {
        Value::Json(json) => return Ok(Value::Json(json)),
        Value::Text(text) => text,
        other => other.to_text(),
    };
    serde_json::from_str(&text).map(Value::Json).map_err(|err| {
        tracing::debug!(error = %err, "Rejected malformed JSON result value");
        Error::invalid(
            OPERATION,
            format!("Unable to decode invalid JSON value: {text}"),
        )
    })
}
