//! Table search filter and results

use serde::{Deserialize, Serialize};

use super::identifier::TableIdentifier;

/// Filter for table search. Every field is optional; an empty filter matches
/// everything. Zero matches is an empty result, never an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchFilter {
    /// Substring match against table name and description (case-insensitive)
    #[serde(default)]
    pub query: Option<String>,
    /// Exact-match tag names; a table must carry all of them
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub domain: Option<String>,
    /// Matches an owner's id or name
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub catalog: Option<String>,
    #[serde(default)]
    pub schema: Option<String>,
    #[serde(default)]
    pub include_deprecated: bool,
    /// Maximum results; 0 means unlimited
    #[serde(default)]
    pub limit: usize,
}

impl SearchFilter {
    /// Filter matching everything.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

/// One table search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSearchResult {
    pub table: TableIdentifier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default)]
    pub deprecated: bool,
    /// Which provider produced this hit
    pub source: String,
}
