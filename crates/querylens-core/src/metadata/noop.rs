//! No-op metadata provider

use std::collections::HashMap;

use async_trait::async_trait;

use super::traits::{MetadataProvider, MetadataResult};
use crate::types::{
    CancellationToken, ColumnContext, ColumnIdentifier, GlossaryTerm, LineageDirection,
    LineageInfo, SearchFilter, TableContext, TableIdentifier, TableSearchResult,
};

/// The zero-configuration default: knows nothing about anything.
///
/// Every lookup succeeds with an absent result and allocates nothing per
/// call.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProvider;

impl NoopProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MetadataProvider for NoopProvider {
    fn name(&self) -> String {
        "noop".to_string()
    }

    async fn table_context(
        &self,
        _cancel: &CancellationToken,
        _table: &TableIdentifier,
    ) -> MetadataResult<Option<TableContext>> {
        Ok(None)
    }

    async fn column_context(
        &self,
        _cancel: &CancellationToken,
        _column: &ColumnIdentifier,
    ) -> MetadataResult<Option<ColumnContext>> {
        Ok(None)
    }

    async fn columns_context(
        &self,
        _cancel: &CancellationToken,
        _table: &TableIdentifier,
    ) -> MetadataResult<Option<HashMap<String, ColumnContext>>> {
        Ok(None)
    }

    async fn lineage(
        &self,
        _cancel: &CancellationToken,
        _table: &TableIdentifier,
        _direction: LineageDirection,
        _max_depth: u32,
    ) -> MetadataResult<Option<LineageInfo>> {
        Ok(None)
    }

    async fn glossary_term(
        &self,
        _cancel: &CancellationToken,
        _term: &str,
    ) -> MetadataResult<Option<GlossaryTerm>> {
        Ok(None)
    }

    async fn search_tables(
        &self,
        _cancel: &CancellationToken,
        _filter: &SearchFilter,
    ) -> MetadataResult<Vec<TableSearchResult>> {
        Ok(Vec::new())
    }

    async fn close(&self) -> MetadataResult<()> {
        Ok(())
    }
}
