//! Table-level lineage: upstream/downstream data-flow relationships

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::identifier::TableIdentifier;

/// Which way to walk the lineage graph from a starting table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineageDirection {
    /// Tables this table is derived from
    Upstream,
    /// Tables derived from this table
    Downstream,
}

impl LineageDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineageDirection::Upstream => "upstream",
            LineageDirection::Downstream => "downstream",
        }
    }
}

impl fmt::Display for LineageDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One edge in the lineage graph: data flows from `source_table` into
/// `target_table`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineageEdge {
    pub source_table: TableIdentifier,
    pub target_table: TableIdentifier,
    /// target column name -> source column name, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_mappings: Option<HashMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transformation_type: Option<String>,
}

/// Lineage for one table in one direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineageInfo {
    pub table: TableIdentifier,
    pub direction: LineageDirection,
    pub edges: Vec<LineageEdge>,
}
