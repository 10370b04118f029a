//! Semantic metadata tools

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{connection_name, parse_args, ToolDeps};
use crate::toolkit::{ToolContext, ToolHandler, ToolkitResult};
use crate::types::{LineageDirection, SearchFilter, TableIdentifier};

#[derive(Debug, Deserialize)]
struct TableArgs {
    catalog: String,
    schema: String,
    table: String,
    #[serde(default)]
    connection: Option<String>,
}

impl TableArgs {
    /// Identifier scoped to the effective connection, so metadata and cache
    /// keys distinguish same-named tables on different backends.
    fn identifier(&self, ctx: &ToolContext) -> TableIdentifier {
        let id = TableIdentifier::new(&self.catalog, &self.schema, &self.table);
        let connection = connection_name(ctx, &self.connection);
        if connection.is_empty() {
            id
        } else {
            id.with_connection(connection)
        }
    }
}

/// Table-level metadata lookup. An unknown table is a successful `null`,
/// not an error.
pub struct GetTableContextTool {
    deps: Arc<ToolDeps>,
}

impl GetTableContextTool {
    pub fn new(deps: Arc<ToolDeps>) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl ToolHandler for GetTableContextTool {
    async fn handle(&self, ctx: &ToolContext) -> ToolkitResult<Value> {
        let args: TableArgs = parse_args(ctx)?;
        let table = args.identifier(ctx);
        let context = self
            .deps
            .metadata
            .table_context(ctx.cancel_token(), &table)
            .await?;
        Ok(json!({
            "table": table.key(),
            "context": context,
        }))
    }
}

pub struct GetColumnsContextTool {
    deps: Arc<ToolDeps>,
}

impl GetColumnsContextTool {
    pub fn new(deps: Arc<ToolDeps>) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl ToolHandler for GetColumnsContextTool {
    async fn handle(&self, ctx: &ToolContext) -> ToolkitResult<Value> {
        let args: TableArgs = parse_args(ctx)?;
        let table = args.identifier(ctx);
        let columns = self
            .deps
            .metadata
            .columns_context(ctx.cancel_token(), &table)
            .await?;
        Ok(json!({
            "table": table.key(),
            "columns": columns,
        }))
    }
}

fn default_direction() -> LineageDirection {
    LineageDirection::Upstream
}

#[derive(Debug, Deserialize)]
struct LineageArgs {
    catalog: String,
    schema: String,
    table: String,
    #[serde(default = "default_direction")]
    direction: LineageDirection,
    /// 0 = unlimited
    #[serde(default)]
    max_depth: u32,
    #[serde(default)]
    connection: Option<String>,
}

pub struct GetLineageTool {
    deps: Arc<ToolDeps>,
}

impl GetLineageTool {
    pub fn new(deps: Arc<ToolDeps>) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl ToolHandler for GetLineageTool {
    async fn handle(&self, ctx: &ToolContext) -> ToolkitResult<Value> {
        let args: LineageArgs = parse_args(ctx)?;
        let table = {
            let id = TableIdentifier::new(&args.catalog, &args.schema, &args.table);
            let connection = connection_name(ctx, &args.connection);
            if connection.is_empty() {
                id
            } else {
                id.with_connection(connection)
            }
        };
        let lineage = self
            .deps
            .metadata
            .lineage(ctx.cancel_token(), &table, args.direction, args.max_depth)
            .await?;
        Ok(json!({
            "table": table.key(),
            "direction": args.direction,
            "lineage": lineage,
        }))
    }
}

#[derive(Debug, Deserialize, Default)]
struct SearchTablesArgs {
    #[serde(default)]
    query: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    domain: Option<String>,
    #[serde(default)]
    owner: Option<String>,
    #[serde(default)]
    catalog: Option<String>,
    #[serde(default)]
    schema: Option<String>,
    #[serde(default)]
    include_deprecated: bool,
    #[serde(default)]
    limit: usize,
}

pub struct SearchTablesTool {
    deps: Arc<ToolDeps>,
}

impl SearchTablesTool {
    pub fn new(deps: Arc<ToolDeps>) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl ToolHandler for SearchTablesTool {
    async fn handle(&self, ctx: &ToolContext) -> ToolkitResult<Value> {
        let args: SearchTablesArgs = parse_args(ctx)?;
        let filter = SearchFilter {
            query: args.query,
            tags: args.tags,
            domain: args.domain,
            owner: args.owner,
            catalog: args.catalog,
            schema: args.schema,
            include_deprecated: args.include_deprecated,
            limit: args.limit,
        };
        let results = self
            .deps
            .metadata
            .search_tables(ctx.cancel_token(), &filter)
            .await?;
        Ok(json!({
            "count": results.len(),
            "results": results,
        }))
    }
}

#[derive(Debug, Deserialize)]
struct GlossaryArgs {
    term: String,
}

pub struct GetGlossaryTermTool {
    deps: Arc<ToolDeps>,
}

impl GetGlossaryTermTool {
    pub fn new(deps: Arc<ToolDeps>) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl ToolHandler for GetGlossaryTermTool {
    async fn handle(&self, ctx: &ToolContext) -> ToolkitResult<Value> {
        let args: GlossaryArgs = parse_args(ctx)?;
        let term = self
            .deps
            .metadata
            .glossary_term(ctx.cancel_token(), &args.term)
            .await?;
        Ok(json!({
            "term": args.term,
            "definition": term,
        }))
    }
}
