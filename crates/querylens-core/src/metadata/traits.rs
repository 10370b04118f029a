//! Core trait and error types for metadata lookup

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{
    CancellationToken, ColumnContext, ColumnIdentifier, GlossaryTerm, LineageDirection,
    LineageInfo, SearchFilter, TableContext, TableIdentifier, TableSearchResult,
};

/// Errors that can occur while talking to a metadata backend.
///
/// These are reserved for connectivity, auth and transport failures. A
/// backend that simply knows nothing about an entity returns `Ok(None)` or
/// an empty collection, never an error.
#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("metadata backend {backend} unavailable: {message}")]
    Unavailable { backend: String, message: String },

    #[error("metadata backend {backend} authorization failed: {message}")]
    Auth { backend: String, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("request cancelled")]
    Cancelled,

    /// An error replayed from the cache. Displays exactly like the original.
    #[error("{0}")]
    Cached(Arc<MetadataError>),

    #[error("{0}")]
    Other(String),
}

impl MetadataError {
    pub fn unavailable(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unavailable {
            backend: backend.into(),
            message: message.into(),
        }
    }

    pub fn auth(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Auth {
            backend: backend.into(),
            message: message.into(),
        }
    }
}

pub type MetadataResult<T> = Result<T, MetadataError>;

/// Pluggable source of organizational metadata about tables and columns.
///
/// Contract:
/// - absence of metadata is success with `None`/empty, never an error;
/// - a method never produces both a value and an error (`Result` enforces
///   this structurally);
/// - every method is safe for concurrent invocation;
/// - `close` is idempotent.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Provider name for attribution and logging.
    fn name(&self) -> String;

    async fn table_context(
        &self,
        cancel: &CancellationToken,
        table: &TableIdentifier,
    ) -> MetadataResult<Option<TableContext>>;

    async fn column_context(
        &self,
        cancel: &CancellationToken,
        column: &ColumnIdentifier,
    ) -> MetadataResult<Option<ColumnContext>>;

    /// Contexts for all known columns of a table, keyed by column name.
    /// `None` when the backend knows none of them.
    async fn columns_context(
        &self,
        cancel: &CancellationToken,
        table: &TableIdentifier,
    ) -> MetadataResult<Option<HashMap<String, ColumnContext>>>;

    /// Lineage in one direction, up to `max_depth` hops; 0 means unlimited.
    async fn lineage(
        &self,
        cancel: &CancellationToken,
        table: &TableIdentifier,
        direction: LineageDirection,
        max_depth: u32,
    ) -> MetadataResult<Option<LineageInfo>>;

    async fn glossary_term(
        &self,
        cancel: &CancellationToken,
        term: &str,
    ) -> MetadataResult<Option<GlossaryTerm>>;

    /// Zero matches is an empty vec, never an error.
    async fn search_tables(
        &self,
        cancel: &CancellationToken,
        filter: &SearchFilter,
    ) -> MetadataResult<Vec<TableSearchResult>>;

    /// Release backend resources. Safe to call more than once.
    async fn close(&self) -> MetadataResult<()>;
}

impl std::fmt::Debug for dyn MetadataProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("dyn MetadataProvider")
            .field("name", &self.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cached_error_displays_like_original() {
        let original = MetadataError::unavailable("catalog", "connection refused");
        let text = original.to_string();
        let cached = MetadataError::Cached(Arc::new(original));
        assert_eq!(cached.to_string(), text);
    }
}
