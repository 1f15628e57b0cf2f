//! Live database catalogue used to ground SQL generation.

use indexmap::IndexMap;
use serde::Serialize;

/// One column of a table in the target database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnSchema {
    /// Column name.
    pub name: String,
    /// Engine-reported data type, e.g. `integer` or `character varying`.
    pub data_type: String,
}

impl ColumnSchema {
    /// Creates a column description.
    #[must_use]
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}

/// Ordered mapping from table name to its ordered columns.
///
/// Fetched fresh for every generation request; never cached.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaDescriptor {
    tables: IndexMap<String, Vec<ColumnSchema>>,
}

impl SchemaDescriptor {
    /// Creates an empty descriptor.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a descriptor from `(table, column, data_type)` triples.
    ///
    /// Tables keep the order in which they first appear; columns keep input
    /// order within their table.
    #[must_use]
    pub fn from_columns<I, T, C, D>(columns: I) -> Self
    where
        I: IntoIterator<Item = (T, C, D)>,
        T: Into<String>,
        C: Into<String>,
        D: Into<String>,
    {
        let mut descriptor = Self::new();
        for (table, column, data_type) in columns {
            descriptor.push_column(table, ColumnSchema::new(column, data_type));
        }
        descriptor
    }

    /// Appends a column to the named table, creating the table if needed.
    pub fn push_column(&mut self, table: impl Into<String>, column: ColumnSchema) {
        self.tables.entry(table.into()).or_default().push(column);
    }

    /// Iterates over tables in catalogue order.
    pub fn tables(&self) -> impl Iterator<Item = (&str, &[ColumnSchema])> {
        self.tables
            .iter()
            .map(|(name, columns)| (name.as_str(), columns.as_slice()))
    }

    /// Returns the columns of a table, if present.
    #[must_use]
    pub fn columns(&self, table: &str) -> Option<&[ColumnSchema]> {
        self.tables.get(table).map(Vec::as_slice)
    }

    /// Returns the number of tables.
    #[must_use]
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// Returns `true` when the catalogue has no tables.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
