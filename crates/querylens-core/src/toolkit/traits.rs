//! Hook traits and error/result types for the tool pipeline

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use super::context::ToolContext;
use crate::engine::EngineError;
use crate::metadata::MetadataError;

/// Errors surfaced by tool execution. At the pipeline boundary these become
/// error payloads, never a crash.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("request cancelled")]
    Cancelled,

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

pub type ToolkitResult<T> = Result<T, ToolError>;

/// Final shape of a tool call: a success payload or an error payload.
#[derive(Debug, Clone, Serialize)]
pub struct ToolResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolResponse {
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl std::fmt::Display) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.to_string()),
        }
    }
}

impl From<ToolkitResult<Value>> for ToolResponse {
    fn from(outcome: ToolkitResult<Value>) -> Self {
        match outcome {
            Ok(data) => Self::ok(data),
            Err(e) => Self::error(e),
        }
    }
}

/// One tool implementation. The handler reads its arguments from the
/// context's input payload.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn handle(&self, ctx: &ToolContext) -> ToolkitResult<Value>;
}

/// Boxed handler closure: borrows the context, returns a boxed future.
pub type HandlerFn =
    Box<dyn for<'a> Fn(&'a ToolContext) -> BoxFuture<'a, ToolkitResult<Value>> + Send + Sync>;

/// Handler built from a closure; handy in tests and for trivial tools.
pub struct FnHandler {
    f: HandlerFn,
}

impl FnHandler {
    pub fn new(f: HandlerFn) -> Self {
        Self { f }
    }
}

#[async_trait]
impl ToolHandler for FnHandler {
    async fn handle(&self, ctx: &ToolContext) -> ToolkitResult<Value> {
        (self.f)(ctx).await
    }
}

/// A Before/After pair wrapping an entire tool invocation.
///
/// Before hooks run in composition order; the first failure aborts the
/// remaining Before hooks and the handler, and its error becomes the
/// response. After hooks run in strict reverse order — the last-registered
/// middleware sees the raw handler outcome first — and receive the outcome
/// whether the handler succeeded or failed, so cancellation and errors
/// unwind through them rather than around them. An After hook that itself
/// fails short-circuits the remaining After hooks.
#[async_trait]
pub trait Middleware: Send + Sync {
    fn name(&self) -> &str;

    async fn before(&self, _ctx: &ToolContext) -> ToolkitResult<()> {
        Ok(())
    }

    async fn after(
        &self,
        _ctx: &ToolContext,
        _outcome: &mut ToolkitResult<Value>,
    ) -> ToolkitResult<()> {
        Ok(())
    }
}

/// Rewrites SQL text immediately before it is dispatched to the engine.
/// Invoked by tool handlers, not by the generic wrapper.
#[async_trait]
pub trait SqlInterceptor: Send + Sync {
    fn name(&self) -> &str;

    async fn intercept(&self, ctx: &ToolContext, sql: String) -> ToolkitResult<String>;
}

/// Rewrites the outcome after all middleware After hooks have run.
#[async_trait]
pub trait ResultTransformer: Send + Sync {
    fn name(&self) -> &str;

    async fn transform(
        &self,
        ctx: &ToolContext,
        outcome: &mut ToolkitResult<Value>,
    ) -> ToolkitResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CancellationToken;

    #[test]
    fn test_response_from_outcome() {
        let ok = ToolResponse::from(Ok(serde_json::json!({"rows": 1})));
        assert!(ok.success);
        assert!(ok.error.is_none());

        let err: ToolResponse = Err(ToolError::UnknownTool("nope".to_string())).into();
        assert!(!err.success);
        assert!(err.error.unwrap().contains("nope"));
    }

    #[tokio::test]
    async fn test_fn_handler() {
        let handler = FnHandler::new(Box::new(|ctx| {
            Box::pin(async move { Ok(serde_json::json!({"tool": ctx.tool_name()})) })
        }));
        let ctx = ToolContext::new(
            "echo",
            serde_json::json!({}),
            None,
            CancellationToken::new(),
        );
        let out = handler.handle(&ctx).await.unwrap();
        assert_eq!(out["tool"], "echo");
    }
}
