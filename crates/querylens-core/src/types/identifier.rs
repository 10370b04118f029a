//! Table and column identifiers
//!
//! Identifiers are case-sensitive value types. Their canonical key strings
//! are the sole basis for map lookups and cache keys, so two identifiers
//! that print the same key are the same entity.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Fully qualified table reference, optionally scoped to a logical connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableIdentifier {
    /// Logical connection name; `None` means "whatever connection is in scope"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection: Option<String>,
    pub catalog: String,
    pub schema: String,
    pub table: String,
}

impl TableIdentifier {
    pub fn new(
        catalog: impl Into<String>,
        schema: impl Into<String>,
        table: impl Into<String>,
    ) -> Self {
        Self {
            connection: None,
            catalog: catalog.into(),
            schema: schema.into(),
            table: table.into(),
        }
    }

    /// Scope this identifier to a logical connection.
    pub fn with_connection(mut self, connection: impl Into<String>) -> Self {
        self.connection = Some(connection.into());
        self
    }

    /// Canonical key string: `connection:catalog.schema.table`, or
    /// `catalog.schema.table` when no connection is set.
    ///
    /// An empty connection string is treated the same as an absent one.
    pub fn key(&self) -> String {
        match self.connection.as_deref() {
            Some(conn) if !conn.is_empty() => {
                format!("{}:{}.{}.{}", conn, self.catalog, self.schema, self.table)
            }
            _ => format!("{}.{}.{}", self.catalog, self.schema, self.table),
        }
    }

    /// Key string with the connection stripped, for connection-agnostic
    /// metadata indexes.
    pub fn base_key(&self) -> String {
        format!("{}.{}.{}", self.catalog, self.schema, self.table)
    }

    /// `catalog.schema.table`, as it would appear in SQL text.
    pub fn qualified_name(&self) -> String {
        self.base_key()
    }

    /// Parse a dotted `catalog.schema.table` name. Returns `None` when the
    /// input does not have exactly three non-empty parts.
    pub fn parse(s: &str) -> Option<Self> {
        let parts: Vec<&str> = s.split('.').collect();
        match parts.as_slice() {
            [catalog, schema, table]
                if !catalog.is_empty() && !schema.is_empty() && !table.is_empty() =>
            {
                Some(Self::new(*catalog, *schema, *table))
            }
            _ => None,
        }
    }

    /// Identify a column of this table.
    pub fn column(&self, name: impl Into<String>) -> ColumnIdentifier {
        ColumnIdentifier {
            table: self.clone(),
            column: name.into(),
        }
    }
}

impl fmt::Display for TableIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// A single column of a table; the key is the table key dot-appended with
/// the column name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnIdentifier {
    pub table: TableIdentifier,
    pub column: String,
}

impl ColumnIdentifier {
    pub fn new(table: TableIdentifier, column: impl Into<String>) -> Self {
        Self {
            table,
            column: column.into(),
        }
    }

    pub fn key(&self) -> String {
        format!("{}.{}", self.table.key(), self.column)
    }
}

impl fmt::Display for ColumnIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}
