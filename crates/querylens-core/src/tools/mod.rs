//! Tool handlers
//!
//! Each tool resolves an engine client through the connection manager
//! and/or consults the metadata provider, then returns a JSON payload. Bad
//! arguments become error payloads, never panics.

mod catalog;
mod query;
mod semantic;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::json;

pub use catalog::{
    DescribeTableTool, ListCatalogsTool, ListConnectionsTool, ListSchemasTool, ListTablesTool,
};
pub use query::{ExecuteQueryTool, ExplainQueryTool};
pub use semantic::{
    GetColumnsContextTool, GetGlossaryTermTool, GetLineageTool, GetTableContextTool,
    SearchTablesTool,
};

use crate::connection::ConnectionManager;
use crate::logging::Logger;
use crate::metadata::MetadataProvider;
use crate::toolkit::{SqlInterceptors, ToolContext, ToolError, ToolSpec, Toolkit, ToolkitResult};

/// Shared collaborators for every tool handler.
pub struct ToolDeps {
    pub connections: Arc<ConnectionManager>,
    pub metadata: Arc<dyn MetadataProvider>,
    pub interceptors: Arc<SqlInterceptors>,
    pub logger: Arc<dyn Logger>,
}

/// Deserialize the tool's input payload into its argument struct.
fn parse_args<T: DeserializeOwned>(ctx: &ToolContext) -> ToolkitResult<T> {
    serde_json::from_value(ctx.input()).map_err(|e| ToolError::InvalidArguments(e.to_string()))
}

/// The connection a call should use: an explicit argument wins, then the
/// request-level connection, then the default (empty name).
fn connection_name(ctx: &ToolContext, from_args: &Option<String>) -> String {
    from_args
        .clone()
        .or_else(|| ctx.connection().map(str::to_string))
        .unwrap_or_default()
}

/// Specs for every built-in tool.
pub fn tool_specs(deps: &Arc<ToolDeps>) -> Vec<ToolSpec> {
    vec![
        ToolSpec::new(
            "execute_query",
            "Run a SQL query against the engine and return rows",
            json!({
                "type": "object",
                "properties": {
                    "sql": {"type": "string", "description": "SQL text to execute"},
                    "connection": {"type": "string", "description": "Logical connection name"},
                    "max_rows": {"type": "integer", "description": "Row limit, defaults to 1000"},
                    "timeout_seconds": {"type": "integer", "description": "Query deadline"}
                },
                "required": ["sql"]
            }),
            Arc::new(ExecuteQueryTool::new(deps.clone())),
        ),
        ToolSpec::new(
            "explain_query",
            "Return the engine's plan for a SQL query",
            json!({
                "type": "object",
                "properties": {
                    "sql": {"type": "string"},
                    "connection": {"type": "string"}
                },
                "required": ["sql"]
            }),
            Arc::new(ExplainQueryTool::new(deps.clone())),
        ),
        ToolSpec::new(
            "list_catalogs",
            "List catalogs available on a connection",
            json!({
                "type": "object",
                "properties": {
                    "connection": {"type": "string"}
                }
            }),
            Arc::new(ListCatalogsTool::new(deps.clone())),
        ),
        ToolSpec::new(
            "list_schemas",
            "List schemas in a catalog",
            json!({
                "type": "object",
                "properties": {
                    "catalog": {"type": "string"},
                    "connection": {"type": "string"}
                },
                "required": ["catalog"]
            }),
            Arc::new(ListSchemasTool::new(deps.clone())),
        ),
        ToolSpec::new(
            "list_tables",
            "List tables in a schema",
            json!({
                "type": "object",
                "properties": {
                    "catalog": {"type": "string"},
                    "schema": {"type": "string"},
                    "connection": {"type": "string"}
                },
                "required": ["catalog", "schema"]
            }),
            Arc::new(ListTablesTool::new(deps.clone())),
        ),
        ToolSpec::new(
            "describe_table",
            "Describe a table's columns, enriched with semantic metadata when available",
            json!({
                "type": "object",
                "properties": {
                    "catalog": {"type": "string"},
                    "schema": {"type": "string"},
                    "table": {"type": "string"},
                    "connection": {"type": "string"}
                },
                "required": ["catalog", "schema", "table"]
            }),
            Arc::new(DescribeTableTool::new(deps.clone())),
        ),
        ToolSpec::new(
            "list_connections",
            "List configured engine connections",
            json!({"type": "object", "properties": {}}),
            Arc::new(ListConnectionsTool::new(deps.clone())),
        ),
        ToolSpec::new(
            "get_table_context",
            "Semantic metadata for a table: description, owners, tags, domain",
            json!({
                "type": "object",
                "properties": {
                    "catalog": {"type": "string"},
                    "schema": {"type": "string"},
                    "table": {"type": "string"},
                    "connection": {"type": "string"}
                },
                "required": ["catalog", "schema", "table"]
            }),
            Arc::new(GetTableContextTool::new(deps.clone())),
        ),
        ToolSpec::new(
            "get_columns_context",
            "Semantic metadata for every known column of a table",
            json!({
                "type": "object",
                "properties": {
                    "catalog": {"type": "string"},
                    "schema": {"type": "string"},
                    "table": {"type": "string"},
                    "connection": {"type": "string"}
                },
                "required": ["catalog", "schema", "table"]
            }),
            Arc::new(GetColumnsContextTool::new(deps.clone())),
        ),
        ToolSpec::new(
            "search_tables",
            "Search tables by name, description, tags, domain or owner",
            json!({
                "type": "object",
                "properties": {
                    "query": {"type": "string"},
                    "tags": {"type": "array", "items": {"type": "string"}},
                    "domain": {"type": "string"},
                    "owner": {"type": "string"},
                    "catalog": {"type": "string"},
                    "schema": {"type": "string"},
                    "include_deprecated": {"type": "boolean"},
                    "limit": {"type": "integer"}
                }
            }),
            Arc::new(SearchTablesTool::new(deps.clone())),
        ),
        ToolSpec::new(
            "get_lineage",
            "Upstream or downstream lineage for a table",
            json!({
                "type": "object",
                "properties": {
                    "catalog": {"type": "string"},
                    "schema": {"type": "string"},
                    "table": {"type": "string"},
                    "direction": {"type": "string", "enum": ["upstream", "downstream"]},
                    "max_depth": {"type": "integer", "description": "Hop limit, 0 = unlimited"},
                    "connection": {"type": "string"}
                },
                "required": ["catalog", "schema", "table"]
            }),
            Arc::new(GetLineageTool::new(deps.clone())),
        ),
        ToolSpec::new(
            "get_glossary_term",
            "Look up a business glossary term",
            json!({
                "type": "object",
                "properties": {
                    "term": {"type": "string"}
                },
                "required": ["term"]
            }),
            Arc::new(GetGlossaryTermTool::new(deps.clone())),
        ),
    ]
}

/// Register every built-in tool. Individual tools already registered are
/// left untouched (registration is idempotent).
pub fn register_all(toolkit: &Toolkit, deps: &Arc<ToolDeps>) {
    for spec in tool_specs(deps) {
        toolkit.register(spec);
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;
    use crate::metadata::NoopProvider;

    #[test]
    fn test_register_all_registers_every_tool_once() {
        let client = Arc::new(test_support::RecordingClient::new());
        let deps = test_support::deps_with(client, Arc::new(NoopProvider));
        let toolkit = Toolkit::new(Arc::new(NoOpLogger));

        register_all(&toolkit, &deps);
        let count = toolkit.tool_count();
        assert_eq!(count, 12);

        // second pass is a no-op
        register_all(&toolkit, &deps);
        assert_eq!(toolkit.tool_count(), count);

        assert!(toolkit.has_tool("execute_query"));
        assert!(toolkit.has_tool("get_lineage"));
        assert!(toolkit.has_tool("list_connections"));
    }
}
