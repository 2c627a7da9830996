//! Result rows and the type vectors used to decode them.

use std::collections::HashMap;
use std::sync::Arc;

use crate::value::Value;

/// Column metadata shared across all rows in a result set.
///
/// Wrapped in `Arc` so all rows from the same query share the same column
/// information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    /// Column keys in order
    names: Vec<String>,
    /// Key -> index mapping for O(1) lookup
    name_to_index: HashMap<String, usize>,
}

impl ColumnInfo {
    /// Create new column info from a list of column keys.
    pub fn new(names: Vec<String>) -> Self {
        let name_to_index = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        Self {
            names,
            name_to_index,
        }
    }

    /// Column info keyed by position (`"0"`, `"1"`, ...), as for rows
    /// fetched in ordered mode.
    pub fn positional(len: usize) -> Self {
        Self::new((0..len).map(|i| i.to_string()).collect())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Get the index of a column by key.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.name_to_index.get(name).copied()
    }

    /// Get the key of a column by index.
    pub fn name_at(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.name_to_index.contains_key(name)
    }

    /// Get all column keys.
    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// A single result row: ordered column keys plus values.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    values: Vec<Value>,
    columns: Arc<ColumnInfo>,
}

impl Row {
    /// Create a new row with the given column keys and values.
    pub fn new(column_names: Vec<String>, values: Vec<Value>) -> Self {
        let columns = Arc::new(ColumnInfo::new(column_names));
        Self { values, columns }
    }

    /// Create a row from `(key, value)` pairs.
    pub fn from_pairs<I, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let (names, values): (Vec<String>, Vec<Value>) =
            pairs.into_iter().map(|(k, v)| (k.into(), v)).unzip();
        Self::new(names, values)
    }

    /// Create a positionally-keyed row.
    pub fn positional(values: Vec<Value>) -> Self {
        let columns = Arc::new(ColumnInfo::positional(values.len()));
        Self { values, columns }
    }

    /// Create a new row with shared column metadata.
    pub fn with_columns(columns: Arc<ColumnInfo>, values: Vec<Value>) -> Self {
        Self { values, columns }
    }

    /// Get the shared column metadata.
    pub fn column_info(&self) -> Arc<ColumnInfo> {
        Arc::clone(&self.columns)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get a value by column index.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Get a value by column key.
    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        self.columns.index_of(name).and_then(|i| self.values.get(i))
    }

    /// Replace the value at `index`, returning the old one.
    pub fn replace(&mut self, index: usize, value: Value) -> Option<Value> {
        self.values
            .get_mut(index)
            .map(|slot| std::mem::replace(slot, value))
    }

    /// Get all column keys.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.names().iter().map(String::as_str)
    }

    /// Iterate over all values.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.values.iter()
    }

    /// Consume the row, returning its values.
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    /// Iterate over (column key, value) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns
            .names()
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }
}

/// Types requested for the columns of a result row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowTypes {
    /// Types by position
    Positional(Vec<String>),
    /// Types by column key
    Named(Vec<(String, String)>),
}

impl RowTypes {
    pub fn positional<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RowTypes::Positional(types.into_iter().map(Into::into).collect())
    }

    pub fn named<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        RowTypes::Named(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Copy with every named key lower-cased. Positional types are unchanged.
    pub fn with_lowercase_keys(&self) -> Self {
        match self {
            RowTypes::Positional(types) => RowTypes::Positional(types.clone()),
            RowTypes::Named(pairs) => RowTypes::Named(
                pairs
                    .iter()
                    .map(|(key, ty)| (key.to_lowercase(), ty.clone()))
                    .collect(),
            ),
        }
    }

    /// `(key, type)` entries; positional entries are keyed by position.
    pub fn entries(&self) -> Vec<(String, &str)> {
        match self {
            RowTypes::Positional(types) => types
                .iter()
                .enumerate()
                .map(|(i, ty)| (i.to_string(), ty.as_str()))
                .collect(),
            RowTypes::Named(pairs) => pairs
                .iter()
                .map(|(key, ty)| (key.clone(), ty.as_str()))
                .collect(),
        }
    }

    /// The type to apply to each column, in column order.
    ///
    /// Positional types first claim the column whose key equals their
    /// position; the remaining ones fill untyped columns in order. Named
    /// types only ever match by key. Empty type names leave a column untyped.
    pub fn align<'a>(&'a self, columns: &ColumnInfo) -> Vec<Option<&'a str>> {
        let mut aligned: Vec<Option<&'a str>> = vec![None; columns.len()];
        match self {
            RowTypes::Named(pairs) => {
                for (key, ty) in pairs {
                    if let Some(index) = columns.index_of(key) {
                        aligned[index] = Some(ty.as_str());
                    }
                }
            }
            RowTypes::Positional(types) => {
                let mut leftovers = Vec::new();
                for (position, ty) in types.iter().enumerate() {
                    match columns.index_of(&position.to_string()) {
                        Some(index) => aligned[index] = Some(ty.as_str()),
                        None => leftovers.push(ty.as_str()),
                    }
                }
                let mut leftovers = leftovers.into_iter();
                for slot in &mut aligned {
                    if slot.is_none() {
                        match leftovers.next() {
                            Some(ty) => *slot = Some(ty),
                            None => break,
                        }
                    }
                }
            }
        }
        aligned
            .into_iter()
            .map(|ty| ty.filter(|ty| !ty.is_empty()))
            .collect()
    }
}
