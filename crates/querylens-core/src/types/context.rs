//! Metadata snapshots for tables and columns
//!
//! A context is an immutable snapshot of what a metadata backend knows about
//! one entity at the time it was fetched. A missing context (`None` from a
//! provider) means "no metadata known" and is a successful outcome, never an
//! error.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::identifier::{ColumnIdentifier, TableIdentifier};
use super::now_unix;

/// Whether an owner is an individual or a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OwnerType {
    User,
    Group,
}

/// One owner of an entity, as recorded by the metadata backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub owner_type: OwnerType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// A tag attached to an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Deprecation marker with an optional human note.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deprecation {
    pub deprecated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Everything a metadata backend knows about one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableContext {
    pub table: TableIdentifier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub owners: Vec<Owner>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub glossary_terms: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecation: Option<Deprecation>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub custom_properties: HashMap<String, Value>,
    /// Which provider produced this snapshot (for attribution/logging)
    pub source: String,
    /// Unix seconds at fetch time
    pub fetched_at: u64,
}

impl TableContext {
    /// Empty snapshot for a table, stamped now.
    pub fn new(table: TableIdentifier, source: impl Into<String>) -> Self {
        Self {
            table,
            description: None,
            owners: Vec::new(),
            tags: Vec::new(),
            glossary_terms: Vec::new(),
            domain: None,
            deprecation: None,
            custom_properties: HashMap::new(),
            source: source.into(),
            fetched_at: now_unix(),
        }
    }

    pub fn is_deprecated(&self) -> bool {
        self.deprecation.as_ref().is_some_and(|d| d.deprecated)
    }
}

/// Everything a metadata backend knows about one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnContext {
    pub column: ColumnIdentifier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub glossary_terms: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecation: Option<Deprecation>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub custom_properties: HashMap<String, Value>,
    pub source: String,
    pub fetched_at: u64,
}

impl ColumnContext {
    pub fn new(column: ColumnIdentifier, source: impl Into<String>) -> Self {
        Self {
            column,
            description: None,
            tags: Vec::new(),
            glossary_terms: Vec::new(),
            deprecation: None,
            custom_properties: HashMap::new(),
            source: source.into(),
            fetched_at: now_unix(),
        }
    }
}
