//! Type name resolution.
//!
//! Every operation resolves the requested type name at call time: the alias
//! map is applied, an extension registered under the mapped name (or the
//! alias itself) wins, and otherwise the name must be a built-in type.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::extension::TypeExtension;
use crate::options::Options;
use crate::row::RowTypes;
use crate::types::LogicalType;
use crate::value::Value;

/// Outcome of resolving a type name.
#[derive(Clone)]
pub enum Resolved {
    /// A built-in logical type
    Builtin(LogicalType),
    /// A registered extension
    Extension {
        /// The name the caller used
        name: String,
        /// The name after alias mapping
        mapped: String,
        extension: Arc<dyn TypeExtension>,
    },
    /// Neither built-in nor registered
    Unknown(String),
}

impl fmt::Debug for Resolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolved::Builtin(ty) => f.debug_tuple("Builtin").field(ty).finish(),
            Resolved::Extension { name, mapped, .. } => f
                .debug_struct("Extension")
                .field("name", name)
                .field("mapped", mapped)
                .finish_non_exhaustive(),
            Resolved::Unknown(name) => f.debug_tuple("Unknown").field(name).finish(),
        }
    }
}

impl Resolved {
    /// The built-in type, if this resolved to one.
    pub fn builtin(&self) -> Option<LogicalType> {
        match self {
            Resolved::Builtin(ty) => Some(*ty),
            _ => None,
        }
    }
}

/// Resolve `name` against the alias map, the extensions and the built-ins.
pub fn resolve(options: &Options, name: &str) -> Resolved {
    let mapped = options
        .mapped_type(name)
        .filter(|mapped| !mapped.is_empty())
        .unwrap_or(name);

    if let Some(extension) = options
        .extension_for(mapped)
        .or_else(|| options.extension_for(name))
    {
        tracing::debug!(type_name = name, mapped, "Resolved type to extension");
        return Resolved::Extension {
            name: name.to_string(),
            mapped: mapped.to_string(),
            extension: Arc::clone(extension),
        };
    }

    match LogicalType::from_name(mapped) {
        Some(ty) => Resolved::Builtin(ty),
        None => Resolved::Unknown(name.to_string()),
    }
}

/// Canonical defaults of every built-in type plus every mapped alias.
///
/// An alias mapped to a built-in copies that default; an alias handled by
/// an extension asks the extension.
pub fn valid_types(backend: &dyn Backend) -> BTreeMap<String, Value> {
    let mut types: BTreeMap<String, Value> = LogicalType::ALL
        .into_iter()
        .map(|ty| (ty.name().to_string(), ty.default_value()))
        .collect();

    let options = backend.options();
    for (alias, mapped) in &options.datatype_map {
        if let Some(default) = types.get(mapped.as_str()).cloned() {
            types.insert(alias.clone(), default);
        } else if let Some(extension) = options.extension_for(alias) {
            let default = extension.default_value(backend, alias, mapped);
            types.insert(alias.clone(), default);
        }
    }
    types
}

/// Check that every requested result type is built-in or mapped.
pub fn check_result_types(backend: &dyn Backend, types: &RowTypes) -> Result<()> {
    let options = backend.options();
    for (key, ty) in types.entries() {
        if LogicalType::from_name(ty).is_some() {
            continue;
        }
        if options.mapped_type(ty).is_some_and(|mapped| !mapped.is_empty()) {
            continue;
        }
        return Err(Error::unsupported(
            "check_result_types",
            format!("{ty} for {key} is not a supported column type"),
        ));
    }
    Ok(())
}

/// Type name to use when binding a parameter of type `name`.
pub fn map_prepare_type(backend: &dyn Backend, name: &str) -> Result<String> {
    match resolve(backend.options(), name) {
        Resolved::Extension {
            mapped, extension, ..
        } => extension.prepare_type(backend, &mapped),
        Resolved::Builtin(_) | Resolved::Unknown(_) => Ok(backend
            .options()
            .mapped_type(name)
            .filter(|mapped| !mapped.is_empty())
            .unwrap_or(name)
            .to_string()),
    }
}
