//! MySQL declaration keywords.
//!
//! Integers are sized by their byte length and can be declared unsigned;
//! LOB types pick the smallest TEXT/BLOB variant that fits the length.

use super::{DeclarationDialect, generic_type_keyword};
use sqlport_core::{Backend, FieldDefinition, LogicalType};

/// Declarations for MySQL.
#[derive(Debug, Clone, Copy, Default)]
pub struct MysqlDeclarations;

impl DeclarationDialect for MysqlDeclarations {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn type_keyword(&self, backend: &dyn Backend, ty: LogicalType, field: &FieldDefinition) -> String {
        tracing::trace!(dialect = "mysql", type_name = ty.name(), "Mapping type keyword");

        match ty {
            LogicalType::Integer => {
                let keyword = match field.length.unwrap_or(4) {
                    1 => "TINYINT",
                    2 => "SMALLINT",
                    3 => "MEDIUMINT",
                    5.. => "BIGINT",
                    _ => "INT",
                };
                if field.unsigned {
                    format!("{keyword} UNSIGNED")
                } else {
                    keyword.to_string()
                }
            }
            LogicalType::Boolean => "TINYINT(1)".to_string(),
            LogicalType::Clob => lob_keyword(field.length, "TEXT"),
            LogicalType::Blob => lob_keyword(field.length, "BLOB"),
            LogicalType::Date => "DATE".to_string(),
            LogicalType::Time => "TIME".to_string(),
            LogicalType::Timestamp => "DATETIME".to_string(),
            LogicalType::Float => "DOUBLE".to_string(),
            LogicalType::Decimal => "DECIMAL".to_string(),
            LogicalType::Uuid => "CHAR(36)".to_string(),
            LogicalType::Json | LogicalType::Jsonb => "JSON".to_string(),
            LogicalType::Text => generic_type_keyword(backend, ty, field),
        }
    }

    fn charset_clause(&self, charset: &str) -> Option<String> {
        Some(format!("CHARACTER SET {charset}"))
    }

    fn collation_clause(&self, collation: &str) -> Option<String> {
        Some(format!("COLLATE {collation}"))
    }

    fn supports_unsigned(&self) -> bool {
        true
    }
}

fn lob_keyword(length: Option<u32>, base: &str) -> String {
    let prefix = match length {
        Some(n) if n <= 255 => "TINY",
        Some(n) if n <= 65_535 => "",
        Some(n) if n <= 16_777_215 => "MEDIUM",
        _ => "LONG",
    };
    format!("{prefix}{base}")
}
