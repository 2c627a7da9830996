//! Logical (backend independent) type definitions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::value::Value;

/// The closed set of logical column types understood by the type layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicalType {
    Text,
    Boolean,
    Integer,
    Decimal,
    Float,
    Timestamp,
    Time,
    Date,
    Clob,
    Blob,
    Uuid,
    Json,
    Jsonb,
}

impl LogicalType {
    /// Every logical type, in canonical order.
    pub const ALL: [LogicalType; 13] = [
        LogicalType::Text,
        LogicalType::Boolean,
        LogicalType::Integer,
        LogicalType::Decimal,
        LogicalType::Float,
        LogicalType::Timestamp,
        LogicalType::Time,
        LogicalType::Date,
        LogicalType::Clob,
        LogicalType::Blob,
        LogicalType::Uuid,
        LogicalType::Json,
        LogicalType::Jsonb,
    ];

    /// The lower-case name used in type maps and field definitions.
    pub const fn name(self) -> &'static str {
        match self {
            LogicalType::Text => "text",
            LogicalType::Boolean => "boolean",
            LogicalType::Integer => "integer",
            LogicalType::Decimal => "decimal",
            LogicalType::Float => "float",
            LogicalType::Timestamp => "timestamp",
            LogicalType::Time => "time",
            LogicalType::Date => "date",
            LogicalType::Clob => "clob",
            LogicalType::Blob => "blob",
            LogicalType::Uuid => "uuid",
            LogicalType::Json => "json",
            LogicalType::Jsonb => "jsonb",
        }
    }

    /// Look up a built-in type by name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|ty| ty.name().eq_ignore_ascii_case(name))
    }

    /// The canonical default value for this type.
    pub fn default_value(self) -> Value {
        match self {
            LogicalType::Text | LogicalType::Clob | LogicalType::Blob | LogicalType::Uuid => {
                Value::Text(String::new())
            }
            LogicalType::Boolean => Value::Bool(true),
            LogicalType::Integer => Value::Int(0),
            LogicalType::Decimal | LogicalType::Float => Value::Float(0.0),
            LogicalType::Timestamp => Value::Text("1970-01-01 00:00:00".to_string()),
            LogicalType::Time => Value::Text("00:00:00".to_string()),
            LogicalType::Date => Value::Text("1970-01-01".to_string()),
            LogicalType::Json | LogicalType::Jsonb => Value::Text("{}".to_string()),
        }
    }

    /// Check if this is a large-object type.
    pub const fn is_lob(self) -> bool {
        matches!(self, LogicalType::Clob | LogicalType::Blob)
    }

    /// Check if this is a date/time type.
    pub const fn is_temporal(self) -> bool {
        matches!(
            self,
            LogicalType::Date | LogicalType::Time | LogicalType::Timestamp
        )
    }

    /// Check if this type is numeric.
    pub const fn is_numeric(self) -> bool {
        matches!(
            self,
            LogicalType::Integer | LogicalType::Decimal | LogicalType::Float
        )
    }
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LogicalType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| {
            Error::unsupported("parse_type", format!("{s} is not a supported column type"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for ty in LogicalType::ALL {
            assert_eq!(LogicalType::from_name(ty.name()), Some(ty));
            assert_eq!(ty.to_string().parse::<LogicalType>().unwrap(), ty);
        }
        assert_eq!(LogicalType::from_name("CLOB"), Some(LogicalType::Clob));
        assert_eq!(LogicalType::from_name("money"), None);
        assert!("money".parse::<LogicalType>().unwrap_err().is_unsupported());
    }

    #[test]
    fn canonical_defaults() {
        assert_eq!(LogicalType::Text.default_value(), Value::Text(String::new()));
        assert_eq!(LogicalType::Boolean.default_value(), Value::Bool(true));
        assert_eq!(LogicalType::Integer.default_value(), Value::Int(0));
        assert_eq!(LogicalType::Decimal.default_value(), Value::Float(0.0));
        assert_eq!(
            LogicalType::Timestamp.default_value(),
            Value::Text("1970-01-01 00:00:00".to_string())
        );
        assert_eq!(
            LogicalType::Time.default_value(),
            Value::Text("00:00:00".to_string())
        );
        assert_eq!(
            LogicalType::Date.default_value(),
            Value::Text("1970-01-01".to_string())
        );
        assert_eq!(
            LogicalType::Jsonb.default_value(),
            Value::Text("{}".to_string())
        );
    }

    #[test]
    fn serde_uses_lowercase_names() {
        let json = serde_json::to_string(&LogicalType::Timestamp).unwrap();
        assert_eq!(json, "\"timestamp\"");
        let ty: LogicalType = serde_json::from_str("\"jsonb\"").unwrap();
        assert_eq!(ty, LogicalType::Jsonb);
    }

    #[test]
    fn classification_helpers() {
        assert!(LogicalType::Blob.is_lob());
        assert!(!LogicalType::Text.is_lob());
        assert!(LogicalType::Time.is_temporal());
        assert!(LogicalType::Float.is_numeric());
        assert!(!LogicalType::Uuid.is_numeric());
    }
}
