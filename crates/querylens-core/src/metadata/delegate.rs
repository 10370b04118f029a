//! Delegating provider built from per-method closures
//!
//! Chiefly for the test suite: set a handler for the methods under test and
//! let everything else fall back to the absence-is-success default.

use std::collections::HashMap;

use async_trait::async_trait;

use super::traits::{MetadataProvider, MetadataResult};
use crate::types::{
    CancellationToken, ColumnContext, ColumnIdentifier, GlossaryTerm, LineageDirection,
    LineageInfo, SearchFilter, TableContext, TableIdentifier, TableSearchResult,
};

type TableHandler =
    dyn Fn(&TableIdentifier) -> MetadataResult<Option<TableContext>> + Send + Sync;
type ColumnHandler =
    dyn Fn(&ColumnIdentifier) -> MetadataResult<Option<ColumnContext>> + Send + Sync;
type ColumnsHandler = dyn Fn(&TableIdentifier) -> MetadataResult<Option<HashMap<String, ColumnContext>>>
    + Send
    + Sync;
type LineageHandler = dyn Fn(&TableIdentifier, LineageDirection, u32) -> MetadataResult<Option<LineageInfo>>
    + Send
    + Sync;
type GlossaryHandler = dyn Fn(&str) -> MetadataResult<Option<GlossaryTerm>> + Send + Sync;
type SearchHandler =
    dyn Fn(&SearchFilter) -> MetadataResult<Vec<TableSearchResult>> + Send + Sync;
type CloseHandler = dyn Fn() -> MetadataResult<()> + Send + Sync;

/// A provider whose behavior is whatever closures were installed on it.
/// Unset methods behave like [`super::NoopProvider`].
#[derive(Default)]
pub struct DelegatingProvider {
    name: Option<String>,
    on_table_context: Option<Box<TableHandler>>,
    on_column_context: Option<Box<ColumnHandler>>,
    on_columns_context: Option<Box<ColumnsHandler>>,
    on_lineage: Option<Box<LineageHandler>>,
    on_glossary_term: Option<Box<GlossaryHandler>>,
    on_search_tables: Option<Box<SearchHandler>>,
    on_close: Option<Box<CloseHandler>>,
}

impl DelegatingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn on_table_context<F>(mut self, f: F) -> Self
    where
        F: Fn(&TableIdentifier) -> MetadataResult<Option<TableContext>> + Send + Sync + 'static,
    {
        self.on_table_context = Some(Box::new(f));
        self
    }

    pub fn on_column_context<F>(mut self, f: F) -> Self
    where
        F: Fn(&ColumnIdentifier) -> MetadataResult<Option<ColumnContext>> + Send + Sync + 'static,
    {
        self.on_column_context = Some(Box::new(f));
        self
    }

    pub fn on_columns_context<F>(mut self, f: F) -> Self
    where
        F: Fn(&TableIdentifier) -> MetadataResult<Option<HashMap<String, ColumnContext>>>
            + Send
            + Sync
            + 'static,
    {
        self.on_columns_context = Some(Box::new(f));
        self
    }

    pub fn on_lineage<F>(mut self, f: F) -> Self
    where
        F: Fn(&TableIdentifier, LineageDirection, u32) -> MetadataResult<Option<LineageInfo>>
            + Send
            + Sync
            + 'static,
    {
        self.on_lineage = Some(Box::new(f));
        self
    }

    pub fn on_glossary_term<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> MetadataResult<Option<GlossaryTerm>> + Send + Sync + 'static,
    {
        self.on_glossary_term = Some(Box::new(f));
        self
    }

    pub fn on_search_tables<F>(mut self, f: F) -> Self
    where
        F: Fn(&SearchFilter) -> MetadataResult<Vec<TableSearchResult>> + Send + Sync + 'static,
    {
        self.on_search_tables = Some(Box::new(f));
        self
    }

    pub fn on_close<F>(mut self, f: F) -> Self
    where
        F: Fn() -> MetadataResult<()> + Send + Sync + 'static,
    {
        self.on_close = Some(Box::new(f));
        self
    }
}

#[async_trait]
impl MetadataProvider for DelegatingProvider {
    fn name(&self) -> String {
        self.name.clone().unwrap_or_else(|| "delegate".to_string())
    }

    async fn table_context(
        &self,
        _cancel: &CancellationToken,
        table: &TableIdentifier,
    ) -> MetadataResult<Option<TableContext>> {
        match &self.on_table_context {
            Some(f) => f(table),
            None => Ok(None),
        }
    }

    async fn column_context(
        &self,
        _cancel: &CancellationToken,
        column: &ColumnIdentifier,
    ) -> MetadataResult<Option<ColumnContext>> {
        match &self.on_column_context {
            Some(f) => f(column),
            None => Ok(None),
        }
    }

    async fn columns_context(
        &self,
        _cancel: &CancellationToken,
        table: &TableIdentifier,
    ) -> MetadataResult<Option<HashMap<String, ColumnContext>>> {
        match &self.on_columns_context {
            Some(f) => f(table),
            None => Ok(None),
        }
    }

    async fn lineage(
        &self,
        _cancel: &CancellationToken,
        table: &TableIdentifier,
        direction: LineageDirection,
        max_depth: u32,
    ) -> MetadataResult<Option<LineageInfo>> {
        match &self.on_lineage {
            Some(f) => f(table, direction, max_depth),
            None => Ok(None),
        }
    }

    async fn glossary_term(
        &self,
        _cancel: &CancellationToken,
        term: &str,
    ) -> MetadataResult<Option<GlossaryTerm>> {
        match &self.on_glossary_term {
            Some(f) => f(term),
            None => Ok(None),
        }
    }

    async fn search_tables(
        &self,
        _cancel: &CancellationToken,
        filter: &SearchFilter,
    ) -> MetadataResult<Vec<TableSearchResult>> {
        match &self.on_search_tables {
            Some(f) => f(filter),
            None => Ok(Vec::new()),
        }
    }

    async fn close(&self) -> MetadataResult<()> {
        match &self.on_close {
            Some(f) => f(),
            None => Ok(()),
        }
    }
}
