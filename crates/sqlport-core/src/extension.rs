//! User-supplied type handlers.
//!
//! A [`TypeExtension`] registered in [`Options::extensions`](crate::options::Options)
//! takes over every operation for the type names it is registered under.
//! Operations an extension does not implement fail with `Unsupported`.

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::field::{ChangeSet, FieldDefinition, NativeTypeMapping};
use crate::quote::QuoteOptions;
use crate::value::Value;

/// Handler for a custom (non built-in) type.
///
/// `type_name` is always the name the caller used, before alias mapping.
pub trait TypeExtension: Send + Sync {
    /// Canonical default for `alias`, which maps to `mapped`.
    fn default_value(&self, _backend: &dyn Backend, _alias: &str, _mapped: &str) -> Value {
        Value::Text(String::new())
    }

    /// Convert a raw result value.
    fn decode(
        &self,
        _backend: &dyn Backend,
        type_name: &str,
        _value: Value,
        _rtrim: bool,
    ) -> Result<Value> {
        Err(not_implemented("convert_result", type_name))
    }

    /// Quote a value. `None` is the unquoted NULL.
    fn quote(
        &self,
        _backend: &dyn Backend,
        type_name: &str,
        _value: &Value,
        _options: QuoteOptions,
    ) -> Result<Option<String>> {
        Err(not_implemented("quote", type_name))
    }

    /// Column declaration for `name`.
    fn declare(
        &self,
        _backend: &dyn Backend,
        type_name: &str,
        _name: &str,
        _field: &FieldDefinition,
    ) -> Result<String> {
        Err(not_implemented("get_declaration", type_name))
    }

    /// Changes between two definitions of this type.
    fn diff(
        &self,
        _backend: &dyn Backend,
        type_name: &str,
        _current: &FieldDefinition,
        _previous: &FieldDefinition,
    ) -> Result<ChangeSet> {
        Err(not_implemented("compare_definition", type_name))
    }

    /// Type name used when binding parameters of this type. `mapped` is the
    /// alias-mapped name; by default it is used as is.
    fn prepare_type(&self, _backend: &dyn Backend, mapped: &str) -> Result<String> {
        Ok(mapped.to_string())
    }
}

/// Handler translating a backend-native column type into logical types.
pub trait NativeTypeMapper: Send + Sync {
    fn map(&self, backend: &dyn Backend, native: &str) -> Result<NativeTypeMapping>;
}

fn not_implemented(operation: &'static str, type_name: &str) -> Error {
    Error::unsupported(
        operation,
        format!("extension for type {type_name} does not implement {operation}"),
    )
}
