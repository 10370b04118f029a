// rmcp service layer: adapts the toolkit's tool registry to the MCP
// protocol. Tool failures become tool results with isError set, never
// protocol errors; protocol errors are reserved for malformed requests.

use std::borrow::Cow;
use std::sync::Arc;

use rmcp::handler::server::ServerHandler;
use rmcp::model::{
    CallToolRequestParam, CallToolResult, Content, Implementation, ListToolsResult,
    PaginatedRequestParam, ProtocolVersion, ServerCapabilities, ServerInfo, Tool,
};
use rmcp::service::{RequestContext, RoleServer};
use rmcp::ErrorData as McpError;
use serde_json::Value;

use querylens_core::toolkit::{ToolInfo, ToolResponse, Toolkit};
use querylens_core::types::CancellationToken;

#[derive(Clone)]
pub struct QuerylensService {
    toolkit: Arc<Toolkit>,
}

impl QuerylensService {
    pub fn new(toolkit: Arc<Toolkit>) -> Self {
        Self { toolkit }
    }
}

fn to_protocol_tool(info: ToolInfo) -> Tool {
    let input_schema = match info.input_schema {
        Value::Object(map) => Arc::new(map),
        _ => Arc::new(serde_json::Map::new()),
    };
    Tool {
        name: Cow::Owned(info.name),
        title: None,
        description: Some(Cow::Owned(info.description)),
        input_schema,
        output_schema: None,
        annotations: None,
        icons: None,
    }
}

fn convert_response(response: ToolResponse) -> Result<CallToolResult, McpError> {
    if response.success {
        let content = match response.data {
            Some(data) => serde_json::to_string_pretty(&data)
                .map_err(|e| McpError::internal_error(e.to_string(), None))?,
            None => "null".to_string(),
        };
        Ok(CallToolResult::success(vec![Content::text(content)]))
    } else {
        let message = response
            .error
            .unwrap_or_else(|| "unknown error".to_string());
        Ok(CallToolResult::error(vec![Content::text(message)]))
    }
}

impl ServerHandler for QuerylensService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "querylens".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: Some("Querylens MCP Server".to_string()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Query a Trino-style analytical engine with semantic context. \
                 Use search_tables and get_table_context to find and understand \
                 tables before querying them with execute_query."
                    .to_string(),
            ),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        let tools = self
            .toolkit
            .tool_infos()
            .into_iter()
            .map(to_protocol_tool)
            .collect();
        Ok(ListToolsResult::with_all_items(tools))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let payload = Value::Object(request.arguments.unwrap_or_default());
        let cancel = CancellationToken::new();

        // A protocol-level cancellation fires our token, then waits for the
        // pipeline to unwind through its After hooks rather than abandoning
        // it mid-flight.
        let execution = self
            .toolkit
            .execute(&request.name, payload, None, cancel.clone());
        tokio::pin!(execution);
        let response = tokio::select! {
            response = &mut execution => response,
            _ = context.ct.cancelled() => {
                cancel.cancel();
                execution.await
            }
        };

        convert_response(response)
    }
}
