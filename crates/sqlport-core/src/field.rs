//! Column definitions and the results of comparing them.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::types::LogicalType;
use crate::value::Value;

/// Definition of a single column, as used for declarations and diffs.
///
/// `default` distinguishes four states:
///
/// - `None`: no default at all
/// - `Some(Value::Null)`: an explicit NULL default
/// - `Some(Value::Text(""))`: use the type's canonical default
/// - anything else: that literal value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldDefinition {
    /// Logical (or alias/extension) type name
    #[serde(rename = "type")]
    pub type_name: Option<String>,
    /// Declared length (text family)
    pub length: Option<u32>,
    /// Fixed-width text
    pub fixed: bool,
    /// Unsigned integer
    pub unsigned: bool,
    /// Auto-increment integer
    pub autoincrement: bool,
    /// NOT NULL constraint
    pub notnull: bool,
    /// Default value. A JSON `null` loads as an explicit NULL default.
    #[serde(
        deserialize_with = "explicit_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub default: Option<Value>,
    /// Character set
    pub charset: Option<String>,
    /// Collation
    pub collation: Option<String>,
}

impl FieldDefinition {
    /// Create a definition for the given type name.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: Some(type_name.into()),
            ..Self::default()
        }
    }

    /// Create a definition for a built-in type.
    pub fn of(ty: LogicalType) -> Self {
        Self::new(ty.name())
    }

    /// Set the type name.
    pub fn type_name(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    /// Set the declared length.
    pub fn length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    /// Set the fixed-width flag.
    pub fn fixed(mut self, fixed: bool) -> Self {
        self.fixed = fixed;
        self
    }

    /// Set the unsigned flag.
    pub fn unsigned(mut self, unsigned: bool) -> Self {
        self.unsigned = unsigned;
        self
    }

    /// Set the auto-increment flag.
    pub fn autoincrement(mut self, autoincrement: bool) -> Self {
        self.autoincrement = autoincrement;
        self
    }

    /// Set the NOT NULL flag.
    pub fn notnull(mut self, notnull: bool) -> Self {
        self.notnull = notnull;
        self
    }

    /// Set an explicit default value.
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Request the type's canonical default.
    pub fn type_default(mut self) -> Self {
        self.default = Some(Value::Text(String::new()));
        self
    }

    /// Set the character set.
    pub fn charset(mut self, charset: impl Into<String>) -> Self {
        self.charset = Some(charset.into());
        self
    }

    /// Set the collation.
    pub fn collation(mut self, collation: impl Into<String>) -> Self {
        self.collation = Some(collation.into());
        self
    }

    /// The built-in type named by this definition, if any.
    pub fn logical_type(&self) -> Option<LogicalType> {
        self.type_name.as_deref().and_then(LogicalType::from_name)
    }

    /// Default used when comparing definitions: the explicit value, else the
    /// empty string for NOT NULL columns, else NULL.
    pub fn effective_default(&self) -> Value {
        match &self.default {
            Some(value) => value.clone(),
            None if self.notnull => Value::Text(String::new()),
            None => Value::Null,
        }
    }
}

/// Keep a present-but-null `default` apart from a missing one.
fn explicit_null<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Value>::deserialize(deserializer).map(|value| Some(value.unwrap_or(Value::Null)))
}

/// A single column attribute that differs between two definitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnChange {
    Type,
    Length,
    Fixed,
    Unsigned,
    Autoincrement,
    NotNull,
    Default,
}

impl ColumnChange {
    /// Attribute name as it appears in a field definition.
    pub const fn name(self) -> &'static str {
        match self {
            ColumnChange::Type => "type",
            ColumnChange::Length => "length",
            ColumnChange::Fixed => "fixed",
            ColumnChange::Unsigned => "unsigned",
            ColumnChange::Autoincrement => "autoincrement",
            ColumnChange::NotNull => "notnull",
            ColumnChange::Default => "default",
        }
    }
}

impl fmt::Display for ColumnChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of comparing a column definition with its previous version.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeSet {
    /// The column must be redefined from scratch
    Redefine(FieldDefinition),
    /// Only these attributes changed
    Attributes(BTreeSet<ColumnChange>),
}

impl ChangeSet {
    /// An empty change set.
    pub fn unchanged() -> Self {
        ChangeSet::Attributes(BTreeSet::new())
    }

    /// Check if nothing changed.
    pub fn is_empty(&self) -> bool {
        match self {
            ChangeSet::Redefine(_) => false,
            ChangeSet::Attributes(changes) => changes.is_empty(),
        }
    }

    /// Check if this is a full redefinition.
    pub fn is_redefinition(&self) -> bool {
        matches!(self, ChangeSet::Redefine(_))
    }

    /// Check if the given attribute changed. A redefinition changes everything.
    pub fn contains(&self, change: ColumnChange) -> bool {
        match self {
            ChangeSet::Redefine(_) => true,
            ChangeSet::Attributes(changes) => changes.contains(&change),
        }
    }

    /// Number of changed attributes (0 for a redefinition).
    pub fn len(&self) -> usize {
        match self {
            ChangeSet::Redefine(_) => 0,
            ChangeSet::Attributes(changes) => changes.len(),
        }
    }

    /// Record a changed attribute. Has no effect on a redefinition.
    pub fn insert(&mut self, change: ColumnChange) {
        if let ChangeSet::Attributes(changes) = self {
            changes.insert(change);
        }
    }
}

impl Default for ChangeSet {
    fn default() -> Self {
        Self::unchanged()
    }
}

/// Logical description of a backend-native column type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeTypeMapping {
    /// Candidate logical type names, most specific first
    pub types: Vec<String>,
    /// Declared length, if any
    pub length: Option<u32>,
    /// Unsigned flag (`None` when the native type says nothing about sign)
    pub unsigned: Option<bool>,
    /// Fixed-width flag (`None` when not applicable)
    pub fixed: Option<bool>,
}

impl NativeTypeMapping {
    /// Mapping onto the given candidate types.
    pub fn new<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            types: types.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// The most specific candidate type.
    pub fn primary_type(&self) -> Option<&str> {
        self.types.first().map(String::as_str)
    }
}
