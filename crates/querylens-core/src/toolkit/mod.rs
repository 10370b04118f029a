//! Extension pipeline around tool execution
//!
//! The [`Toolkit`] holds registered tools and the hooks that wrap them:
//! middleware (a Before/After pair around the whole invocation), SQL
//! interceptors (rewrite SQL just before dispatch) and result transformers
//! (rewrite the outcome after the middleware unwind). When nothing is
//! configured, a tool call is a plain handler invocation with no wrapping.

mod context;
mod middleware;
mod pipeline;
mod traits;

pub use context::ToolContext;
pub use pipeline::{SqlInterceptors, ToolInfo, ToolSpec, Toolkit};
pub use middleware::{LoggingMiddleware, TimingMiddleware};
pub use traits::{
    FnHandler, HandlerFn, Middleware, ResultTransformer, SqlInterceptor, ToolError, ToolHandler,
    ToolResponse, ToolkitResult,
};
