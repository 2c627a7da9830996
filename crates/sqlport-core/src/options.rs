//! Per-connection configuration read by the type layer.
//!
//! Options are re-read on every call, so changes take effect on the next
//! quote/decode/declare without any cache invalidation.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::Deserialize;

use crate::extension::{NativeTypeMapper, TypeExtension};

/// Portability switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Portability {
    /// Treat the empty string as NULL when quoting
    pub empty_to_null: bool,
    /// Column keys of fetched rows are lower case; named result types are
    /// matched accordingly
    pub lowercase: bool,
}

/// Type-layer options.
///
/// The plain-data part deserializes from any serde format; extensions and
/// native type mappers are code and must be registered with the builder.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Alias type name -> mapped type name
    pub datatype_map: HashMap<String, String>,
    /// Type name -> extension handling it
    #[serde(skip)]
    pub extensions: HashMap<String, Arc<dyn TypeExtension>>,
    /// Native type name -> mapper overriding the generic native mapping
    #[serde(skip)]
    pub native_type_mappers: HashMap<String, Arc<dyn NativeTypeMapper>>,
    pub portability: Portability,
    /// Length used for `text` columns declared without one
    pub default_text_field_length: u32,
    /// Chunk size when copying LOBs to files
    pub lob_buffer_length: usize,
    /// Allow `file://` URLs passed as LOB values to be read and inlined
    pub lob_allow_url_include: bool,
    /// Quote identifiers when the caller asks for an option-checked quote
    pub quote_identifier: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            datatype_map: HashMap::new(),
            extensions: HashMap::new(),
            native_type_mappers: HashMap::new(),
            portability: Portability::default(),
            default_text_field_length: 4096,
            lob_buffer_length: 8192,
            lob_allow_url_include: false,
            quote_identifier: false,
        }
    }
}

impl Options {
    /// Create options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Map an alias type name onto another type name.
    pub fn map_type(mut self, alias: impl Into<String>, target: impl Into<String>) -> Self {
        self.datatype_map.insert(alias.into(), target.into());
        self
    }

    /// Register an extension handling `name`.
    pub fn register_extension(
        mut self,
        name: impl Into<String>,
        extension: Arc<dyn TypeExtension>,
    ) -> Self {
        self.extensions.insert(name.into(), extension);
        self
    }

    /// Register a mapper for a backend-native type name (matched lower-case).
    pub fn register_native_type_mapper(
        mut self,
        native: impl Into<String>,
        mapper: Arc<dyn NativeTypeMapper>,
    ) -> Self {
        self.native_type_mappers
            .insert(native.into().to_ascii_lowercase(), mapper);
        self
    }

    /// Set the portability switches.
    pub fn portability(mut self, portability: Portability) -> Self {
        self.portability = portability;
        self
    }

    /// Treat empty strings as NULL when quoting.
    pub fn empty_to_null(mut self, enabled: bool) -> Self {
        self.portability.empty_to_null = enabled;
        self
    }

    /// Set the default `text` length.
    pub fn default_text_field_length(mut self, length: u32) -> Self {
        self.default_text_field_length = length;
        self
    }

    /// Set the LOB copy chunk size.
    pub fn lob_buffer_length(mut self, length: usize) -> Self {
        self.lob_buffer_length = length;
        self
    }

    /// Allow or forbid reading `file://` LOB values.
    pub fn lob_allow_url_include(mut self, allow: bool) -> Self {
        self.lob_allow_url_include = allow;
        self
    }

    /// Enable option-checked identifier quoting.
    pub fn quote_identifier(mut self, enabled: bool) -> Self {
        self.quote_identifier = enabled;
        self
    }

    /// The type an alias maps to, if any.
    pub fn mapped_type(&self, alias: &str) -> Option<&str> {
        self.datatype_map.get(alias).map(String::as_str)
    }

    /// The extension registered under `name`, if any.
    pub fn extension_for(&self, name: &str) -> Option<&Arc<dyn TypeExtension>> {
        self.extensions.get(name)
    }

    /// The native type mapper registered for `native`, if any.
    pub fn native_type_mapper_for(&self, native: &str) -> Option<&Arc<dyn NativeTypeMapper>> {
        self.native_type_mappers.get(&native.to_ascii_lowercase())
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut extensions: Vec<&str> = self.extensions.keys().map(String::as_str).collect();
        extensions.sort_unstable();
        let mut mappers: Vec<&str> = self
            .native_type_mappers
            .keys()
            .map(String::as_str)
            .collect();
        mappers.sort_unstable();

        f.debug_struct("Options")
            .field("datatype_map", &self.datatype_map)
            .field("extensions", &extensions)
            .field("native_type_mappers", &mappers)
            .field("portability", &self.portability)
            .field("default_text_field_length", &self.default_text_field_length)
            .field("lob_buffer_length", &self.lob_buffer_length)
            .field("lob_allow_url_include", &self.lob_allow_url_include)
            .field("quote_identifier", &self.quote_identifier)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = Options::default();
        assert_eq!(options.default_text_field_length, 4096);
        assert_eq!(options.lob_buffer_length, 8192);
        assert!(!options.lob_allow_url_include);
        assert!(!options.portability.empty_to_null);
        assert!(options.datatype_map.is_empty());
    }

    #[test]
    fn test_builder() {
        let options = Options::new()
            .map_type("money", "decimal")
            .empty_to_null(true)
            .default_text_field_length(255)
            .lob_buffer_length(16);

        assert_eq!(options.mapped_type("money"), Some("decimal"));
        assert_eq!(options.mapped_type("cash"), None);
        assert!(options.portability.empty_to_null);
        assert_eq!(options.default_text_field_length, 255);
        assert_eq!(options.lob_buffer_length, 16);
    }

    #[test]
    fn test_deserialize_partial() {
        let options: Options = serde_json::from_str(
            r#"{
                "datatype_map": {"money": "decimal"},
                "portability": {"empty_to_null": true},
                "lob_buffer_length": 1024
            }"#,
        )
        .unwrap();

        assert_eq!(options.mapped_type("money"), Some("decimal"));
        assert!(options.portability.empty_to_null);
        assert!(!options.portability.lowercase);
        assert_eq!(options.lob_buffer_length, 1024);
        assert_eq!(options.default_text_field_length, 4096);
        assert!(options.extensions.is_empty());
    }

    #[test]
    fn test_debug_lists_extension_names() {
        let options = Options::new().map_type("a", "text");
        let debug = format!("{options:?}");
        assert!(debug.contains("datatype_map"));
        assert!(debug.contains("extensions: []"));
    }
}
