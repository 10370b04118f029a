//! Built-in middleware

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde_json::{json, Value};

use super::context::ToolContext;
use super::traits::{Middleware, ToolkitResult};
use crate::logging::Logger;

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Logs every tool call start and outcome.
pub struct LoggingMiddleware {
    logger: Arc<dyn Logger>,
}

impl LoggingMiddleware {
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self { logger }
    }
}

#[async_trait]
impl Middleware for LoggingMiddleware {
    fn name(&self) -> &str {
        "logging"
    }

    async fn before(&self, ctx: &ToolContext) -> ToolkitResult<()> {
        match ctx.connection() {
            Some(connection) => self.logger.debug(&format!(
                "tool {} started (connection {})",
                ctx.tool_name(),
                connection
            )),
            None => self.logger.debug(&format!("tool {} started", ctx.tool_name())),
        }
        Ok(())
    }

    async fn after(
        &self,
        ctx: &ToolContext,
        outcome: &mut ToolkitResult<Value>,
    ) -> ToolkitResult<()> {
        match outcome {
            Ok(_) => self.logger.debug(&format!("tool {} succeeded", ctx.tool_name())),
            Err(e) => self
                .logger
                .warn(&format!("tool {} failed: {}", ctx.tool_name(), e)),
        }
        Ok(())
    }
}

const TIMING_KEY: &str = "timing.start_ms";

/// Measures wall-clock duration of each call through the context store.
pub struct TimingMiddleware {
    logger: Arc<dyn Logger>,
}

impl TimingMiddleware {
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self { logger }
    }
}

#[async_trait]
impl Middleware for TimingMiddleware {
    fn name(&self) -> &str {
        "timing"
    }

    async fn before(&self, ctx: &ToolContext) -> ToolkitResult<()> {
        ctx.set(TIMING_KEY, json!(now_millis()));
        Ok(())
    }

    async fn after(
        &self,
        ctx: &ToolContext,
        _outcome: &mut ToolkitResult<Value>,
    ) -> ToolkitResult<()> {
        if let Some(started) = ctx.get(TIMING_KEY).and_then(|v| v.as_u64()) {
            let elapsed = now_millis().saturating_sub(started);
            self.logger
                .debug(&format!("tool {} took {}ms", ctx.tool_name(), elapsed));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;
    use crate::types::CancellationToken;

    fn ctx() -> ToolContext {
        ToolContext::new("t", json!({}), None, CancellationToken::new())
    }

    #[tokio::test]
    async fn test_timing_middleware_stashes_start() {
        let mw = TimingMiddleware::new(Arc::new(NoOpLogger));
        let ctx = ctx();

        mw.before(&ctx).await.unwrap();
        assert!(ctx.get(TIMING_KEY).is_some());

        let mut outcome = Ok(json!(null));
        mw.after(&ctx, &mut outcome).await.unwrap();
        assert!(outcome.is_ok());
    }

    #[tokio::test]
    async fn test_logging_middleware_passes_through() {
        let mw = LoggingMiddleware::new(Arc::new(NoOpLogger));
        let ctx = ctx();

        mw.before(&ctx).await.unwrap();
        let mut outcome = Ok(json!(1));
        mw.after(&ctx, &mut outcome).await.unwrap();
        assert_eq!(outcome.unwrap(), json!(1));
    }
}
