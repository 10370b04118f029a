//! Business glossary terms

use serde::{Deserialize, Serialize};

use super::context::Owner;

/// A business glossary term that table and column contexts can reference by
/// name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlossaryTerm {
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub synonyms: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub owners: Vec<Owner>,
    /// Which provider produced this term
    pub source: String,
}

impl GlossaryTerm {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            synonyms: Vec::new(),
            owners: Vec::new(),
            source: source.into(),
        }
    }
}
