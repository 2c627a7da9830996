//! sqlport - a portable SQL type layer.
//!
//! sqlport converts between application values and the textual forms a SQL
//! backend expects, independently of the backend itself:
//!
//! - Decoding raw result values into typed values, row by row
//! - Quoting values as SQL literals, including LIKE patterns
//! - Column declarations and definition diffs per backend dialect
//! - Streaming access to large objects read from results
//! - User-defined types plugged in through [`TypeExtension`]
//!
//! # Quick Start
//!
//! ```
//! use sqlport::prelude::*;
//!
//! let mut types = Datatype::new(AnsiBackend::new("main"));
//!
//! let value = types.decode(Value::from("42"), "integer", false).unwrap();
//! assert_eq!(value, Value::Int(42));
//!
//! let sql = types.quote_literal(&Value::from("O'Brien"), Some("text")).unwrap();
//! assert_eq!(sql, "'O''Brien'");
//!
//! let column = FieldDefinition::of(LogicalType::Text).length(64).notnull(true);
//! assert_eq!(
//!     types.declare("text", "name", &column).unwrap(),
//!     "name VARCHAR(64) NOT NULL"
//! );
//! ```

pub mod datatype;

pub use datatype::{Datatype, DatatypeBuilder};

pub use sqlport_core::{
    AnsiBackend, Backend, ChangeSet, ColumnChange, ColumnInfo, Error, ErrorKind, FieldDefinition,
    IdentifierStyle, LobEntry, LobIndex, LobLocator, LobRegistry, LobStream, LogicalType,
    NativeTypeMapper, NativeTypeMapping, NowKind, Options, Portability, QuoteOptions, Resolved,
    Result, Row, RowTypes, SqlFunctions, StandardFunctions, StringQuoting, TypeExtension, Value,
};

pub use sqlport_schema::{
    DeclarationDialect, Dialect, GenericDeclarations, MysqlDeclarations, ParsedNativeType,
    PostgresDeclarations,
};

/// Load [`Options`] from a JSON document.
///
/// Extensions and native type mappers cannot be expressed in JSON and have
/// to be registered afterwards.
pub fn options_from_json(json: &str) -> Result<Options> {
    serde_json::from_str(json)
        .map_err(|err| Error::invalid("options", format!("invalid options document: {err}")))
}

/// Commonly used items.
pub mod prelude {
    pub use crate::{
        AnsiBackend, Backend, ChangeSet, ColumnChange, Datatype, DatatypeBuilder, Dialect, Error,
        FieldDefinition, LobLocator, LogicalType, Options, QuoteOptions, Result, Row, RowTypes,
        TypeExtension, Value,
    };
}
