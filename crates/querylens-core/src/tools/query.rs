//! Query execution tools

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{connection_name, parse_args, ToolDeps};
use crate::engine::QueryOptions;
use crate::toolkit::{ToolContext, ToolHandler, ToolkitResult};

const DEFAULT_MAX_ROWS: usize = 1000;

#[derive(Debug, Deserialize)]
struct ExecuteQueryArgs {
    sql: String,
    #[serde(default)]
    connection: Option<String>,
    #[serde(default)]
    max_rows: Option<usize>,
    #[serde(default)]
    timeout_seconds: Option<u64>,
}

/// Runs SQL against the engine. The SQL passes through the interceptor
/// chain first, so policy hooks see it before the engine does.
pub struct ExecuteQueryTool {
    deps: Arc<ToolDeps>,
}

impl ExecuteQueryTool {
    pub fn new(deps: Arc<ToolDeps>) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl ToolHandler for ExecuteQueryTool {
    async fn handle(&self, ctx: &ToolContext) -> ToolkitResult<Value> {
        let args: ExecuteQueryArgs = parse_args(ctx)?;
        let client = self
            .deps
            .connections
            .client(&connection_name(ctx, &args.connection))?;

        let sql = self.deps.interceptors.apply(ctx, args.sql).await?;

        let options = QueryOptions {
            max_rows: Some(args.max_rows.unwrap_or(DEFAULT_MAX_ROWS)),
            timeout: args.timeout_seconds.map(Duration::from_secs),
        };
        let result = client.query(ctx.cancel_token(), &sql, &options).await?;

        Ok(json!({
            "columns": result.columns,
            "rows": result.rows,
            "row_count": result.row_count(),
            "truncated": result.truncated,
        }))
    }
}

#[derive(Debug, Deserialize)]
struct ExplainQueryArgs {
    sql: String,
    #[serde(default)]
    connection: Option<String>,
}

/// Returns the engine's plan for a statement without running it.
pub struct ExplainQueryTool {
    deps: Arc<ToolDeps>,
}

impl ExplainQueryTool {
    pub fn new(deps: Arc<ToolDeps>) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl ToolHandler for ExplainQueryTool {
    async fn handle(&self, ctx: &ToolContext) -> ToolkitResult<Value> {
        let args: ExplainQueryArgs = parse_args(ctx)?;
        let client = self
            .deps
            .connections
            .client(&connection_name(ctx, &args.connection))?;

        let sql = self.deps.interceptors.apply(ctx, args.sql).await?;
        let plan = client.explain(ctx.cancel_token(), &sql).await?;

        Ok(json!({ "plan": plan }))
    }
}
