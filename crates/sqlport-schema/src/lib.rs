//! Schema-facing half of the sqlport type layer.
//!
//! This crate provides:
//! - Column declaration fragments with per-backend dialects
//! - Column definition diffing
//! - Mapping of backend-native types onto logical types

pub mod declare;
pub mod diff;
pub mod native;

pub use declare::{
    DeclarationDialect, Dialect, GenericDeclarations, MysqlDeclarations, PostgresDeclarations,
    declare, dialect_for, generic_type_keyword, type_declaration,
};
pub use diff::diff;
pub use native::{ParsedNativeType, map_native_type};
