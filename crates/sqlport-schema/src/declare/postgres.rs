//! PostgreSQL declaration keywords.

use super::{DeclarationDialect, generic_type_keyword};
use sqlport_core::{Backend, FieldDefinition, IdentifierStyle, LogicalType, quote_ident};

/// Declarations for PostgreSQL.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDeclarations;

impl DeclarationDialect for PostgresDeclarations {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn type_keyword(&self, backend: &dyn Backend, ty: LogicalType, field: &FieldDefinition) -> String {
        tracing::trace!(dialect = "postgres", type_name = ty.name(), "Mapping type keyword");

        match ty {
            LogicalType::Integer => {
                let wide = field.length.is_some_and(|n| n > 4);
                match (field.autoincrement, wide, field.length) {
                    (true, true, _) => "BIGSERIAL",
                    (true, false, _) => "SERIAL",
                    (false, true, _) => "BIGINT",
                    (false, false, Some(1 | 2)) => "SMALLINT",
                    (false, false, _) => "INT",
                }
                .to_string()
            }
            LogicalType::Boolean => "BOOLEAN".to_string(),
            LogicalType::Clob => "TEXT".to_string(),
            LogicalType::Blob => "BYTEA".to_string(),
            LogicalType::Date => "DATE".to_string(),
            LogicalType::Time => "TIME".to_string(),
            LogicalType::Timestamp => "TIMESTAMP".to_string(),
            LogicalType::Float => "FLOAT8".to_string(),
            LogicalType::Decimal => "NUMERIC".to_string(),
            LogicalType::Text | LogicalType::Uuid | LogicalType::Json | LogicalType::Jsonb => {
                generic_type_keyword(backend, ty, field)
            }
        }
    }

    fn collation_clause(&self, collation: &str) -> Option<String> {
        Some(format!("COLLATE {}", quote_ident(collation, IdentifierStyle::Ansi)))
    }
}
