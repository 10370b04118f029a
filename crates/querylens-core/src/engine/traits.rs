//! Engine client trait and result types

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::types::{CancellationToken, TableIdentifier};

/// Errors from the query engine layer.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The requested logical connection does not exist. The message lists
    /// every configured name so the caller can fix the request.
    #[error("connection not found: {name} (known connections: {})", .known.join(", "))]
    UnknownConnection { name: String, known: Vec<String> },

    #[error("query failed: {message}")]
    QueryFailed {
        error_code: Option<i64>,
        message: String,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid response from engine: {0}")]
    InvalidResponse(String),

    #[error("query timed out after {0:?}")]
    Timeout(Duration),

    #[error("request cancelled")]
    Cancelled,

    #[error("engine not configured: {0}")]
    NotConfigured(String),

    #[error("{0}")]
    Other(String),
}

impl EngineError {
    pub fn query_failed(error_code: Option<i64>, message: impl Into<String>) -> Self {
        Self::QueryFailed {
            error_code,
            message: message.into(),
        }
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse(message.into())
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Per-query knobs.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Stop collecting rows past this count and mark the result truncated
    pub max_rows: Option<usize>,
    /// Overall deadline for the query
    pub timeout: Option<Duration>,
}

/// One output column of a query or table description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Collected result of one query.
#[derive(Debug, Clone, Default, Serialize)]
pub struct QueryResult {
    pub columns: Vec<ColumnInfo>,
    pub rows: Vec<Vec<Value>>,
    /// True when `max_rows` cut the result short
    pub truncated: bool,
}

impl QueryResult {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Schema of one table as the engine reports it.
#[derive(Debug, Clone, Serialize)]
pub struct TableSchema {
    pub table: TableIdentifier,
    pub columns: Vec<ColumnInfo>,
}

/// One backend query engine. Every call takes a cancellation token and
/// unwinds promptly once it fires.
#[async_trait]
pub trait Client: Send + Sync {
    async fn query(
        &self,
        cancel: &CancellationToken,
        sql: &str,
        options: &QueryOptions,
    ) -> EngineResult<QueryResult>;

    /// The engine's query plan as text.
    async fn explain(&self, cancel: &CancellationToken, sql: &str) -> EngineResult<String>;

    async fn list_catalogs(&self, cancel: &CancellationToken) -> EngineResult<Vec<String>>;

    async fn list_schemas(
        &self,
        cancel: &CancellationToken,
        catalog: &str,
    ) -> EngineResult<Vec<String>>;

    async fn list_tables(
        &self,
        cancel: &CancellationToken,
        catalog: &str,
        schema: &str,
    ) -> EngineResult<Vec<String>>;

    async fn describe_table(
        &self,
        cancel: &CancellationToken,
        table: &TableIdentifier,
    ) -> EngineResult<TableSchema>;

    /// Release resources. Safe to call more than once.
    async fn close(&self) -> EngineResult<()> {
        Ok(())
    }
}

impl std::fmt::Debug for dyn Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("dyn Client").finish()
    }
}
