//! Column declaration fragments (`<name> <TYPE><options>`).
//!
//! The generic rules live in this module; [`DeclarationDialect`] is the
//! override point for backend-specific type keywords and charset/collation
//! syntax.

mod mysql;
mod postgres;

pub use mysql::MysqlDeclarations;
pub use postgres::PostgresDeclarations;

use serde::Deserialize;
use sqlport_core::{
    Backend, Error, FieldDefinition, LogicalType, Resolved, Result, Value, quote_literal, resolve,
    valid_types,
};

const OPERATION: &str = "get_declaration";

/// Backend family whose declaration syntax to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Portable keywords only
    #[default]
    Generic,
    /// MySQL/MariaDB
    Mysql,
    /// PostgreSQL
    Postgres,
}

/// Backend-specific parts of a column declaration.
pub trait DeclarationDialect: Send + Sync {
    /// The dialect name.
    fn name(&self) -> &'static str;

    /// Type keyword for a built-in type.
    fn type_keyword(&self, backend: &dyn Backend, ty: LogicalType, field: &FieldDefinition) -> String {
        generic_type_keyword(backend, ty, field)
    }

    /// Character set clause, `None` when the backend has no such clause.
    fn charset_clause(&self, _charset: &str) -> Option<String> {
        None
    }

    /// Collation clause, `None` when the backend has no such clause.
    fn collation_clause(&self, _collation: &str) -> Option<String> {
        None
    }

    /// Whether unsigned integers can be declared natively.
    fn supports_unsigned(&self) -> bool {
        false
    }
}

/// Declarations using only the portable keywords.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericDeclarations;

impl DeclarationDialect for GenericDeclarations {
    fn name(&self) -> &'static str {
        "generic"
    }
}

/// Create a declaration dialect for the given backend family.
pub fn dialect_for(dialect: Dialect) -> Box<dyn DeclarationDialect> {
    match dialect {
        Dialect::Generic => Box::new(GenericDeclarations),
        Dialect::Mysql => Box::new(MysqlDeclarations),
        Dialect::Postgres => Box::new(PostgresDeclarations),
    }
}

/// Portable type keywords.
///
/// `text` is `CHAR(n)` when fixed, `VARCHAR(n)` when a length (or a non-zero
/// default length) is available, `TEXT` otherwise. Temporal types are stored
/// as fixed-width text.
pub fn generic_type_keyword(backend: &dyn Backend, ty: LogicalType, field: &FieldDefinition) -> String {
    match ty {
        LogicalType::Text => {
            let default_length = backend.options().default_text_field_length;
            let length = field.length.filter(|&n| n > 0).unwrap_or(default_length);
            if field.fixed {
                let length = if length > 0 { length } else { default_length };
                format!("CHAR({length})")
            } else if length > 0 {
                format!("VARCHAR({length})")
            } else {
                "TEXT".to_string()
            }
        }
        LogicalType::Clob | LogicalType::Blob => "TEXT".to_string(),
        LogicalType::Integer | LogicalType::Boolean => "INT".to_string(),
        LogicalType::Date => "CHAR(10)".to_string(),
        LogicalType::Time => "CHAR(8)".to_string(),
        LogicalType::Timestamp => "CHAR(19)".to_string(),
        LogicalType::Float | LogicalType::Decimal => "TEXT".to_string(),
        LogicalType::Uuid => "UUID".to_string(),
        LogicalType::Json => "JSON".to_string(),
        LogicalType::Jsonb => "JSONB".to_string(),
    }
}

/// Declaration of column `name` as `type_name`.
///
/// Aliases are mapped first; an extension registered for the type builds
/// the whole declaration itself.
pub fn declare(
    backend: &dyn Backend,
    dialect: &dyn DeclarationDialect,
    type_name: &str,
    name: &str,
    field: &FieldDefinition,
) -> Result<String> {
    let ty = match resolve(backend.options(), type_name) {
        Resolved::Builtin(ty) => ty,
        Resolved::Extension {
            name: ext_type,
            extension,
            ..
        } => return extension.declare(backend, &ext_type, name, field),
        Resolved::Unknown(unknown) => {
            return Err(Error::not_found(
                OPERATION,
                format!("type not defined: {unknown}"),
            ));
        }
    };

    let mut field = field.clone();
    field.type_name = Some(ty.name().to_string());

    if ty == LogicalType::Integer && field.unsigned && !dialect.supports_unsigned() {
        backend.warn(&format!(
            "unsigned integer field \"{name}\" is being declared as signed integer"
        ));
    }

    let quoted_name = backend.quote_identifier(name, true);
    let keyword = dialect.type_keyword(backend, ty, &field);
    let declaration = if ty.is_lob() {
        let notnull = if field.notnull { " NOT NULL" } else { "" };
        format!("{quoted_name} {keyword}{notnull}")
    } else {
        let options = declaration_options(backend, dialect, ty, &field)?;
        format!("{quoted_name} {keyword}{options}")
    };

    tracing::debug!(
        dialect = dialect.name(),
        column = name,
        type_name = ty.name(),
        sql = %declaration,
        "Generated column declaration"
    );
    Ok(declaration)
}

/// Bare type keyword for a field definition.
pub fn type_declaration(
    backend: &dyn Backend,
    dialect: &dyn DeclarationDialect,
    field: &FieldDefinition,
) -> Result<String> {
    let type_name = field.type_name.as_deref().unwrap_or_default();
    match resolve(backend.options(), type_name) {
        Resolved::Builtin(ty) => Ok(dialect.type_keyword(backend, ty, field)),
        _ => Err(Error::not_found(
            OPERATION,
            format!("type not defined: {type_name}"),
        )),
    }
}

/// Charset, DEFAULT, NOT NULL and collation clauses, in that order.
fn declaration_options(
    backend: &dyn Backend,
    dialect: &dyn DeclarationDialect,
    ty: LogicalType,
    field: &FieldDefinition,
) -> Result<String> {
    let mut options = String::new();

    if let Some(clause) = field
        .charset
        .as_deref()
        .filter(|charset| !charset.is_empty())
        .and_then(|charset| dialect.charset_clause(charset))
    {
        options.push(' ');
        options.push_str(&clause);
    }

    if let Some(default) = default_for_declaration(backend, ty, field) {
        options.push_str(" DEFAULT ");
        options.push_str(&quote_literal(backend, &default, Some(ty.name()))?);
    }

    if field.notnull {
        options.push_str(" NOT NULL");
    }

    if let Some(clause) = field
        .collation
        .as_deref()
        .filter(|collation| !collation.is_empty())
        .and_then(|collation| dialect.collation_clause(collation))
    {
        options.push(' ');
        options.push_str(&clause);
    }

    Ok(options)
}

/// The value to put in the DEFAULT clause, if any.
///
/// An explicit NULL default is declared as `DEFAULT NULL`, except on NOT NULL
/// columns where it would contradict the constraint.
fn default_for_declaration(
    backend: &dyn Backend,
    ty: LogicalType,
    field: &FieldDefinition,
) -> Option<Value> {
    let default = field.default.as_ref()?;
    let default = if default.is_empty_text() {
        let canonical = valid_types(backend)
            .remove(ty.name())
            .unwrap_or_else(|| ty.default_value());
        if canonical.is_empty_text() && backend.options().portability.empty_to_null {
            Value::Text(" ".to_string())
        } else {
            canonical
        }
    } else {
        default.clone()
    };
    (!(default.is_null() && field.notnull)).then_some(default)
}
