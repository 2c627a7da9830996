//! Per-connection entry point to the type layer.

use std::io::Read;

use sqlport_core::{
    Backend, ChangeSet, FieldDefinition, LobLocator, LobRegistry, LobStream, NativeTypeMapping,
    Options, QuoteOptions, Result, Row, RowTypes, Value,
};
use sqlport_schema::{DeclarationDialect, Dialect, dialect_for};

/// The type layer bound to one backend connection.
///
/// Owns the LOBs decoded through this connection; locators handed out by
/// [`Datatype::decode`] are only valid here and only until destroyed or
/// [`Datatype::reset_lobs`] runs.
pub struct Datatype<B: Backend> {
    backend: B,
    lobs: LobRegistry,
    dialect: Box<dyn DeclarationDialect>,
}

impl<B: Backend> Datatype<B> {
    /// Bind to `backend` with generic declarations.
    pub fn new(backend: B) -> Self {
        DatatypeBuilder::new().build_with(backend)
    }

    /// Get a reference to the backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Get a mutable reference to the backend.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Current backend options.
    pub fn options(&self) -> &Options {
        self.backend.options()
    }

    /// The declaration dialect in use.
    pub fn dialect(&self) -> &dyn DeclarationDialect {
        self.dialect.as_ref()
    }

    /// The LOB registry of this connection.
    pub fn lobs(&self) -> &LobRegistry {
        &self.lobs
    }

    /// Release every LOB and give back the backend.
    pub fn into_backend(mut self) -> B {
        self.lobs.reset();
        self.backend
    }

    // ------------------------------------------------------------------
    // Type registry
    // ------------------------------------------------------------------

    /// Canonical defaults keyed by every valid type name.
    pub fn valid_types(&self) -> std::collections::BTreeMap<String, Value> {
        sqlport_core::valid_types(&self.backend)
    }

    /// Check that every requested result type is supported.
    pub fn check_result_types(&self, types: &RowTypes) -> Result<()> {
        sqlport_core::check_result_types(&self.backend, types)
    }

    /// Type name to bind a parameter of type `name` with.
    pub fn map_prepare_type(&self, name: &str) -> Result<String> {
        sqlport_core::map_prepare_type(&self.backend, name)
    }

    // ------------------------------------------------------------------
    // Decoding
    // ------------------------------------------------------------------

    /// Convert one raw result value.
    pub fn decode(&mut self, value: Value, type_name: &str, rtrim: bool) -> Result<Value> {
        sqlport_core::decode(&self.backend, &mut self.lobs, value, type_name, rtrim)
    }

    /// Convert the typed columns of a row.
    pub fn decode_row(&mut self, types: &RowTypes, row: Row, rtrim: bool) -> Result<Row> {
        sqlport_core::decode_row(&self.backend, &mut self.lobs, types, row, rtrim)
    }

    // ------------------------------------------------------------------
    // Quoting
    // ------------------------------------------------------------------

    /// Quote a value. LOB references of this connection are replaced by
    /// their contents first.
    pub fn quote(
        &mut self,
        value: &Value,
        type_name: Option<&str>,
        options: QuoteOptions,
    ) -> Result<Option<String>> {
        let value = sqlport_core::dereference_lob(&self.backend, &mut self.lobs, value)?;
        sqlport_core::quote(&self.backend, &value, type_name, options)
    }

    /// Quote a value as a SQL literal; NULL becomes `NULL`.
    pub fn quote_literal(&mut self, value: &Value, type_name: Option<&str>) -> Result<String> {
        let value = sqlport_core::dereference_lob(&self.backend, &mut self.lobs, value)?;
        sqlport_core::quote_literal(&self.backend, &value, type_name)
    }

    /// Comma-separated list of values.
    pub fn implode(&self, values: &[Value], type_name: Option<&str>) -> Result<String> {
        sqlport_core::implode(&self.backend, values, type_name)
    }

    /// LIKE expression from alternating literal and wildcard segments.
    pub fn match_pattern<S: AsRef<str>>(
        &self,
        segments: &[S],
        operator: Option<&str>,
        field: Option<&str>,
    ) -> Result<String> {
        sqlport_core::match_pattern(&self.backend, segments, operator, field)
    }

    /// Clause to append after an escaped pattern.
    pub fn pattern_escape_string(&self) -> String {
        self.backend.pattern_escape_string()
    }

    // ------------------------------------------------------------------
    // Declarations and diffs
    // ------------------------------------------------------------------

    /// Declaration of column `name` as `type_name`.
    pub fn declare(&self, type_name: &str, name: &str, field: &FieldDefinition) -> Result<String> {
        sqlport_schema::declare(&self.backend, self.dialect.as_ref(), type_name, name, field)
    }

    /// Bare type keyword for a definition.
    pub fn type_declaration(&self, field: &FieldDefinition) -> Result<String> {
        sqlport_schema::type_declaration(&self.backend, self.dialect.as_ref(), field)
    }

    /// Compare a definition with its previous version.
    pub fn compare_definition(
        &self,
        current: &FieldDefinition,
        previous: &FieldDefinition,
    ) -> Result<ChangeSet> {
        sqlport_schema::diff(&self.backend, current, previous)
    }

    /// Map a backend-native type onto logical types.
    pub fn map_native_type(&self, native: &str) -> Result<NativeTypeMapping> {
        sqlport_schema::map_native_type(&self.backend, native)
    }

    // ------------------------------------------------------------------
    // LOBs
    // ------------------------------------------------------------------

    /// Up to `max_len` bytes from the current LOB position, without advancing.
    pub fn read_lob(&mut self, locator: &LobLocator, max_len: usize) -> Result<Vec<u8>> {
        self.lobs.read(&self.backend, locator, max_len)
    }

    /// The whole LOB contents.
    pub fn lob_contents(&mut self, locator: &LobLocator) -> Result<Vec<u8>> {
        self.lobs.contents(&self.backend, locator)
    }

    /// Read the rest of a LOB into a string.
    ///
    /// Fails when the contents are not valid UTF-8.
    pub fn lob_to_string(&mut self, locator: &LobLocator) -> Result<String> {
        let mut text = String::new();
        self.lobs
            .stream(&self.backend, locator)?
            .read_to_string(&mut text)
            .map_err(|err| {
                sqlport_core::Error::invalid("lob", format!("LOB {locator} is not text: {err}"))
            })?;
        Ok(text)
    }

    /// Whether a stream over the LOB reached its end.
    pub fn end_of_lob(&self, locator: &LobLocator) -> Result<bool> {
        self.lobs.at_end(locator)
    }

    /// Open a read stream over a LOB.
    pub fn lob_stream(&mut self, locator: &LobLocator) -> Result<LobStream<'_>> {
        self.lobs.stream(&self.backend, locator)
    }

    /// Copy the remaining LOB contents to a file.
    pub fn write_lob_to_file(&mut self, locator: &LobLocator, path: &str) -> Result<()> {
        self.lobs.write_to_file(&self.backend, locator, path)
    }

    /// Release a LOB. Destroying an absent LOB is a no-op.
    pub fn destroy_lob(&mut self, locator: &LobLocator) -> Result<()> {
        self.lobs.destroy(&self.backend, locator)
    }

    /// Release every LOB of this connection.
    pub fn reset_lobs(&mut self) {
        self.lobs.reset();
    }
}

impl<B: Backend + std::fmt::Debug> std::fmt::Debug for Datatype<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Datatype")
            .field("backend", &self.backend)
            .field("lobs", &self.lobs)
            .field("dialect", &self.dialect.name())
            .finish()
    }
}

/// Builder for [`Datatype`].
pub struct DatatypeBuilder {
    dialect: Box<dyn DeclarationDialect>,
}

impl DatatypeBuilder {
    /// Create a builder using generic declarations.
    pub fn new() -> Self {
        Self {
            dialect: dialect_for(Dialect::Generic),
        }
    }

    /// Use the declaration syntax of a backend family.
    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect_for(dialect);
        self
    }

    /// Use a custom declaration dialect.
    pub fn custom_dialect(mut self, dialect: impl DeclarationDialect + 'static) -> Self {
        self.dialect = Box::new(dialect);
        self
    }

    /// Bind to a backend.
    pub fn build_with<B: Backend>(self, backend: B) -> Datatype<B> {
        tracing::debug!(
            connection = backend.identity(),
            dialect = self.dialect.name(),
            "Binding type layer"
        );
        let lobs = LobRegistry::new(backend.identity());
        Datatype {
            backend,
            lobs,
            dialect: self.dialect,
        }
    }
}

impl Default for DatatypeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
