//! Catalog browsing tools

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::{connection_name, parse_args, ToolDeps};
use crate::toolkit::{ToolContext, ToolHandler, ToolkitResult};
use crate::types::TableIdentifier;

#[derive(Debug, Deserialize)]
struct ConnectionArgs {
    #[serde(default)]
    connection: Option<String>,
}

pub struct ListCatalogsTool {
    deps: Arc<ToolDeps>,
}

impl ListCatalogsTool {
    pub fn new(deps: Arc<ToolDeps>) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl ToolHandler for ListCatalogsTool {
    async fn handle(&self, ctx: &ToolContext) -> ToolkitResult<Value> {
        let args: ConnectionArgs = parse_args(ctx)?;
        let client = self
            .deps
            .connections
            .client(&connection_name(ctx, &args.connection))?;
        let catalogs = client.list_catalogs(ctx.cancel_token()).await?;
        Ok(json!({ "catalogs": catalogs }))
    }
}

#[derive(Debug, Deserialize)]
struct ListSchemasArgs {
    catalog: String,
    #[serde(default)]
    connection: Option<String>,
}

pub struct ListSchemasTool {
    deps: Arc<ToolDeps>,
}

impl ListSchemasTool {
    pub fn new(deps: Arc<ToolDeps>) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl ToolHandler for ListSchemasTool {
    async fn handle(&self, ctx: &ToolContext) -> ToolkitResult<Value> {
        let args: ListSchemasArgs = parse_args(ctx)?;
        let client = self
            .deps
            .connections
            .client(&connection_name(ctx, &args.connection))?;
        let schemas = client.list_schemas(ctx.cancel_token(), &args.catalog).await?;
        Ok(json!({ "catalog": args.catalog, "schemas": schemas }))
    }
}

#[derive(Debug, Deserialize)]
struct ListTablesArgs {
    catalog: String,
    schema: String,
    #[serde(default)]
    connection: Option<String>,
}

pub struct ListTablesTool {
    deps: Arc<ToolDeps>,
}

impl ListTablesTool {
    pub fn new(deps: Arc<ToolDeps>) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl ToolHandler for ListTablesTool {
    async fn handle(&self, ctx: &ToolContext) -> ToolkitResult<Value> {
        let args: ListTablesArgs = parse_args(ctx)?;
        let client = self
            .deps
            .connections
            .client(&connection_name(ctx, &args.connection))?;
        let tables = client
            .list_tables(ctx.cancel_token(), &args.catalog, &args.schema)
            .await?;
        Ok(json!({
            "catalog": args.catalog,
            "schema": args.schema,
            "tables": tables,
        }))
    }
}

#[derive(Debug, Deserialize)]
struct DescribeTableArgs {
    catalog: String,
    schema: String,
    table: String,
    #[serde(default)]
    connection: Option<String>,
}

/// Describes a table from the engine, then folds in per-column semantic
/// metadata when the provider knows any. A metadata failure degrades to a
/// plain engine description rather than failing the call.
pub struct DescribeTableTool {
    deps: Arc<ToolDeps>,
}

impl DescribeTableTool {
    pub fn new(deps: Arc<ToolDeps>) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl ToolHandler for DescribeTableTool {
    async fn handle(&self, ctx: &ToolContext) -> ToolkitResult<Value> {
        let args: DescribeTableArgs = parse_args(ctx)?;
        let connection = connection_name(ctx, &args.connection);
        let client = self.deps.connections.client(&connection)?;

        let table = TableIdentifier::new(args.catalog, args.schema, args.table);
        let schema = client.describe_table(ctx.cancel_token(), &table).await?;

        let columns_context = match self
            .deps
            .metadata
            .columns_context(ctx.cancel_token(), &table)
            .await
        {
            Ok(map) => map.unwrap_or_default(),
            Err(e) => {
                self.deps
                    .logger
                    .warn(&format!("column metadata lookup failed for {}: {}", table, e));
                Default::default()
            }
        };
        let table_context = self
            .deps
            .metadata
            .table_context(ctx.cancel_token(), &table)
            .await
            .unwrap_or(None);

        let columns: Vec<Value> = schema
            .columns
            .iter()
            .map(|col| {
                let mut entry = Map::new();
                entry.insert("name".to_string(), json!(col.name));
                entry.insert("data_type".to_string(), json!(col.data_type));
                if let Some(comment) = &col.comment {
                    entry.insert("comment".to_string(), json!(comment));
                }
                if let Some(meta) = columns_context.get(&col.name) {
                    if let Some(description) = &meta.description {
                        entry.insert("description".to_string(), json!(description));
                    }
                    if !meta.tags.is_empty() {
                        let tags: Vec<&str> =
                            meta.tags.iter().map(|t| t.name.as_str()).collect();
                        entry.insert("tags".to_string(), json!(tags));
                    }
                }
                Value::Object(entry)
            })
            .collect();

        Ok(json!({
            "table": table.key(),
            "columns": columns,
            "context": table_context,
        }))
    }
}

pub struct ListConnectionsTool {
    deps: Arc<ToolDeps>,
}

impl ListConnectionsTool {
    pub fn new(deps: Arc<ToolDeps>) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl ToolHandler for ListConnectionsTool {
    async fn handle(&self, _ctx: &ToolContext) -> ToolkitResult<Value> {
        let infos = self.deps.connections.connection_infos();
        Ok(json!({
            "connections": infos,
            "default": self.deps.connections.default_name(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use super::super::test_support::{deps_with, RecordingClient};
    use crate::metadata::{DelegatingProvider, NoopProvider};
    use crate::types::{CancellationToken, ColumnContext, Tag};

    fn ctx(input: Value) -> ToolContext {
        ToolContext::new("t", input, None, CancellationToken::new())
    }

    #[tokio::test]
    async fn test_list_catalogs() {
        let deps = deps_with(Arc::new(RecordingClient::new()), Arc::new(NoopProvider));
        let out = ListCatalogsTool::new(deps).handle(&ctx(json!({}))).await.unwrap();
        assert_eq!(out["catalogs"], json!(["hive", "iceberg"]));
    }

    #[tokio::test]
    async fn test_list_schemas_and_tables() {
        let deps = deps_with(Arc::new(RecordingClient::new()), Arc::new(NoopProvider));

        let out = ListSchemasTool::new(deps.clone())
            .handle(&ctx(json!({"catalog": "hive"})))
            .await
            .unwrap();
        assert_eq!(out["schemas"], json!(["sales"]));

        let out = ListTablesTool::new(deps)
            .handle(&ctx(json!({"catalog": "hive", "schema": "sales"})))
            .await
            .unwrap();
        assert_eq!(out["tables"], json!(["orders"]));
    }

    #[tokio::test]
    async fn test_describe_table_enriched_with_metadata() {
        let metadata = Arc::new(DelegatingProvider::named("catalog").on_columns_context(|t| {
            let mut ctx = ColumnContext::new(t.column("order_id"), "catalog");
            ctx.description = Some("Primary key of orders".to_string());
            ctx.tags.push(Tag {
                name: "pk".to_string(),
                description: None,
                source: None,
            });
            let mut map = std::collections::HashMap::new();
            map.insert("order_id".to_string(), ctx);
            Ok(Some(map))
        }));

        let deps = deps_with(Arc::new(RecordingClient::new()), metadata);
        let out = DescribeTableTool::new(deps)
            .handle(&ctx(json!({"catalog": "hive", "schema": "sales", "table": "orders"})))
            .await
            .unwrap();

        assert_eq!(out["table"], "hive.sales.orders");
        let columns = out["columns"].as_array().unwrap();
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[0]["name"], "order_id");
        assert_eq!(columns[0]["description"], "Primary key of orders");
        assert_eq!(columns[0]["tags"], json!(["pk"]));
        // amount has no metadata; engine fields only
        assert_eq!(columns[1]["name"], "amount");
        assert!(columns[1].get("description").is_none());
    }

    #[tokio::test]
    async fn test_describe_table_survives_metadata_failure() {
        let metadata = Arc::new(DelegatingProvider::new().on_columns_context(|_| {
            Err(crate::metadata::MetadataError::unavailable("catalog", "down"))
        }));

        let deps = deps_with(Arc::new(RecordingClient::new()), metadata);
        let out = DescribeTableTool::new(deps)
            .handle(&ctx(json!({"catalog": "hive", "schema": "sales", "table": "orders"})))
            .await
            .unwrap();

        assert_eq!(out["columns"].as_array().unwrap().len(), 2);
        assert!(out["context"].is_null());
    }

    #[tokio::test]
    async fn test_list_connections() {
        let deps = deps_with(Arc::new(RecordingClient::new()), Arc::new(NoopProvider));
        let out = ListConnectionsTool::new(deps).handle(&ctx(json!({}))).await.unwrap();

        assert_eq!(out["default"], "primary");
        let connections = out["connections"].as_array().unwrap();
        assert_eq!(connections.len(), 2);
        assert_eq!(connections[0]["name"], "primary");
        assert_eq!(connections[0]["is_default"], true);
    }
}
