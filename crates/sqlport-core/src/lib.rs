//! Core types for the sqlport type layer.
//!
//! This crate provides the backend-independent building blocks:
//!
//! - [`LogicalType`] and the tagged [`Value`] crossing the backend boundary
//! - [`Backend`], the connection collaborator, with [`AnsiBackend`] as a
//!   reference implementation
//! - [`TypeExtension`] for user-supplied types, resolved through [`Options`]
//! - result decoding ([`decode`], [`decode_row`]), quoting ([`quote`]),
//!   LIKE pattern construction ([`match_pattern`])
//! - the [`LobRegistry`] owning large objects read from results

pub mod backend;
pub mod decode;
pub mod error;
pub mod extension;
pub mod field;
pub mod identifiers;
pub mod lob;
pub mod options;
pub mod pattern;
pub mod quote;
pub mod registry;
pub mod row;
pub mod types;
pub mod value;

pub use backend::{AnsiBackend, Backend, NowKind, SqlFunctions, StandardFunctions, StringQuoting};
pub use decode::{decode, decode_row};
pub use error::{Error, ErrorKind, Result};
pub use extension::{NativeTypeMapper, TypeExtension};
pub use field::{ChangeSet, ColumnChange, FieldDefinition, NativeTypeMapping};
pub use identifiers::{IdentifierStyle, quote_ident};
pub use lob::{LobEntry, LobIndex, LobLocator, LobRegistry, LobStream};
pub use options::{Options, Portability};
pub use pattern::match_pattern;
pub use quote::{QuoteOptions, dereference_lob, implode, infer_type, quote, quote_literal};
pub use registry::{Resolved, check_result_types, map_prepare_type, resolve, valid_types};
pub use row::{ColumnInfo, Row, RowTypes};
pub use types::LogicalType;
pub use value::Value;
