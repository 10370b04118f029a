//! Tool registry and pipeline execution

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;

use super::context::ToolContext;
use super::traits::{
    Middleware, ResultTransformer, SqlInterceptor, ToolHandler, ToolResponse, ToolkitResult,
};
use crate::logging::Logger;
use crate::toolkit::ToolError;
use crate::types::CancellationToken;

/// Registration-time description of a tool, also used for protocol
/// introspection.
#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
    /// JSON Schema of the input payload
    pub input_schema: Value,
}

/// Everything needed to register one tool.
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
    pub handler: Arc<dyn ToolHandler>,
    /// Per-registration middleware, appended after global and per-tool
    pub middleware: Vec<Arc<dyn Middleware>>,
}

impl ToolSpec {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: Value,
        handler: Arc<dyn ToolHandler>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
            handler,
            middleware: Vec::new(),
        }
    }

    pub fn with_middleware(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middleware.push(middleware);
        self
    }
}

struct RegisteredTool {
    info: ToolInfo,
    handler: Arc<dyn ToolHandler>,
    middleware: Vec<Arc<dyn Middleware>>,
}

/// Shared, ordered chain of SQL interceptors. Tool handlers run their SQL
/// through it immediately before dispatch; the first error aborts before
/// anything reaches the engine.
#[derive(Default)]
pub struct SqlInterceptors {
    chain: RwLock<Vec<Arc<dyn SqlInterceptor>>>,
}

impl SqlInterceptors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, interceptor: Arc<dyn SqlInterceptor>) {
        self.chain.write().push(interceptor);
    }

    pub fn len(&self) -> usize {
        self.chain.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.read().is_empty()
    }

    pub async fn apply(&self, ctx: &ToolContext, sql: String) -> ToolkitResult<String> {
        let chain = self.chain.read().clone();
        let mut sql = sql;
        for interceptor in &chain {
            sql = interceptor.intercept(ctx, sql).await?;
        }
        Ok(sql)
    }
}

/// Tool registry plus the hooks wrapping every execution.
pub struct Toolkit {
    tools: RwLock<HashMap<String, RegisteredTool>>,
    /// registration order, for stable introspection listings
    order: RwLock<Vec<String>>,
    global_middleware: RwLock<Vec<Arc<dyn Middleware>>>,
    tool_middleware: RwLock<HashMap<String, Vec<Arc<dyn Middleware>>>>,
    transformers: RwLock<Vec<Arc<dyn ResultTransformer>>>,
    interceptors: Arc<SqlInterceptors>,
    logger: Arc<dyn Logger>,
}

impl Toolkit {
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self {
            tools: RwLock::new(HashMap::new()),
            order: RwLock::new(Vec::new()),
            global_middleware: RwLock::new(Vec::new()),
            tool_middleware: RwLock::new(HashMap::new()),
            transformers: RwLock::new(Vec::new()),
            interceptors: Arc::new(SqlInterceptors::new()),
            logger,
        }
    }

    /// Register a tool. Registration is idempotent: a name that already
    /// exists is left untouched and `false` is returned, so `register_all`
    /// style helpers and selective registration compose safely.
    pub fn register(&self, spec: ToolSpec) -> bool {
        let mut tools = self.tools.write();
        if tools.contains_key(&spec.name) {
            self.logger
                .debug(&format!("tool {} already registered, skipping", spec.name));
            return false;
        }
        self.order.write().push(spec.name.clone());
        tools.insert(
            spec.name.clone(),
            RegisteredTool {
                info: ToolInfo {
                    name: spec.name,
                    description: spec.description,
                    input_schema: spec.input_schema,
                },
                handler: spec.handler,
                middleware: spec.middleware,
            },
        );
        true
    }

    /// Middleware applied to every tool, first in the composition order.
    pub fn add_middleware(&self, middleware: Arc<dyn Middleware>) {
        self.global_middleware.write().push(middleware);
    }

    /// Middleware applied to one tool, after the global middleware.
    pub fn add_tool_middleware(&self, tool: impl Into<String>, middleware: Arc<dyn Middleware>) {
        self.tool_middleware
            .write()
            .entry(tool.into())
            .or_default()
            .push(middleware);
    }

    pub fn add_transformer(&self, transformer: Arc<dyn ResultTransformer>) {
        self.transformers.write().push(transformer);
    }

    pub fn add_interceptor(&self, interceptor: Arc<dyn SqlInterceptor>) {
        self.interceptors.add(interceptor);
    }

    /// The shared interceptor chain, for handing to tool handlers.
    pub fn interceptors(&self) -> Arc<SqlInterceptors> {
        self.interceptors.clone()
    }

    pub fn tool_count(&self) -> usize {
        self.tools.read().len()
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.read().contains_key(name)
    }

    /// Registered tools in registration order.
    pub fn tool_infos(&self) -> Vec<ToolInfo> {
        let tools = self.tools.read();
        self.order
            .read()
            .iter()
            .filter_map(|name| tools.get(name).map(|t| t.info.clone()))
            .collect()
    }

    /// Execute one tool call through the pipeline.
    ///
    /// Stage order: Before hooks (composition order) -> handler -> After
    /// hooks (reverse order) -> transformers (registration order). A Before
    /// failure skips the handler and returns immediately; handler errors
    /// unwind through After hooks and transformers.
    pub async fn execute(
        &self,
        name: &str,
        input: Value,
        connection: Option<String>,
        cancel: CancellationToken,
    ) -> ToolResponse {
        let tool = {
            let tools = self.tools.read();
            tools
                .get(name)
                .map(|t| (t.handler.clone(), t.middleware.clone()))
        };
        let Some((handler, registration_middleware)) = tool else {
            return ToolResponse::error(ToolError::UnknownTool(name.to_string()));
        };

        // global, then per-tool, then per-registration
        let mut chain = self.global_middleware.read().clone();
        if let Some(per_tool) = self.tool_middleware.read().get(name) {
            chain.extend(per_tool.iter().cloned());
        }
        chain.extend(registration_middleware);
        let transformers = self.transformers.read().clone();

        let ctx = ToolContext::new(name, input, connection, cancel);

        // Nothing configured: invoke the handler directly, no wrapping.
        if chain.is_empty() && transformers.is_empty() {
            return ToolResponse::from(handler.handle(&ctx).await);
        }

        for middleware in &chain {
            if let Err(e) = middleware.before(&ctx).await {
                self.logger.debug(&format!(
                    "middleware {} aborted {}: {}",
                    middleware.name(),
                    name,
                    e
                ));
                return ToolResponse::error(e);
            }
        }

        let mut outcome = handler.handle(&ctx).await;

        for middleware in chain.iter().rev() {
            if let Err(e) = middleware.after(&ctx, &mut outcome).await {
                self.logger.debug(&format!(
                    "middleware {} failed after {}: {}",
                    middleware.name(),
                    name,
                    e
                ));
                outcome = Err(e);
                break;
            }
        }

        for transformer in &transformers {
            if let Err(e) = transformer.transform(&ctx, &mut outcome).await {
                self.logger.debug(&format!(
                    "transformer {} failed on {}: {}",
                    transformer.name(),
                    name,
                    e
                ));
                outcome = Err(e);
                break;
            }
        }

        ToolResponse::from(outcome)
    }
}
