//! Per-invocation tool context

use std::collections::HashMap;

use parking_lot::RwLock;
use serde_json::Value;

use crate::types::CancellationToken;

/// Per-call bag threaded through the pipeline: the tool name, the input
/// payload, the requested connection and a thread-safe key/value store for
/// middleware to stash cross-cutting state (trace ids, timers, identity).
///
/// Created at pipeline entry, dropped at exit; nothing here persists across
/// calls. The store supports concurrent reads and writes because middleware
/// may touch it from background work they started.
pub struct ToolContext {
    tool_name: String,
    input: RwLock<Value>,
    connection: Option<String>,
    values: RwLock<HashMap<String, Value>>,
    cancel: CancellationToken,
}

impl ToolContext {
    pub fn new(
        tool_name: impl Into<String>,
        input: Value,
        connection: Option<String>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            tool_name: tool_name.into(),
            input: RwLock::new(input),
            connection,
            values: RwLock::new(HashMap::new()),
            cancel,
        }
    }

    pub fn tool_name(&self) -> &str {
        &self.tool_name
    }

    /// Current input payload. Middleware may have replaced the original.
    pub fn input(&self) -> Value {
        self.input.read().clone()
    }

    /// Swap the input payload the handler will see.
    pub fn replace_input(&self, input: Value) {
        *self.input.write() = input;
    }

    /// Logical connection name the request asked for, if any.
    pub fn connection(&self) -> Option<&str> {
        self.connection.as_deref()
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn set(&self, key: impl Into<String>, value: Value) {
        self.values.write().insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.values.read().get(key).cloned()
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.values.write().remove(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use serde_json::json;

    #[test]
    fn test_basic_accessors() {
        let ctx = ToolContext::new(
            "execute_query",
            json!({"sql": "SELECT 1"}),
            Some("eu".to_string()),
            CancellationToken::new(),
        );

        assert_eq!(ctx.tool_name(), "execute_query");
        assert_eq!(ctx.input()["sql"], "SELECT 1");
        assert_eq!(ctx.connection(), Some("eu"));
        assert!(!ctx.cancel_token().is_cancelled());
    }

    #[test]
    fn test_replace_input() {
        let ctx = ToolContext::new("t", json!({"a": 1}), None, CancellationToken::new());
        ctx.replace_input(json!({"a": 2}));
        assert_eq!(ctx.input()["a"], 2);
    }

    #[test]
    fn test_value_store() {
        let ctx = ToolContext::new("t", json!({}), None, CancellationToken::new());

        assert!(ctx.get("trace_id").is_none());
        ctx.set("trace_id", json!("abc123"));
        assert_eq!(ctx.get("trace_id"), Some(json!("abc123")));
        assert_eq!(ctx.remove("trace_id"), Some(json!("abc123")));
        assert!(ctx.get("trace_id").is_none());
    }

    #[tokio::test]
    async fn test_concurrent_store_access() {
        let ctx = Arc::new(ToolContext::new(
            "t",
            json!({}),
            None,
            CancellationToken::new(),
        ));

        let mut handles = Vec::new();
        for i in 0..16 {
            let ctx = ctx.clone();
            handles.push(tokio::spawn(async move {
                ctx.set(format!("key{}", i), json!(i));
                ctx.get(&format!("key{}", i))
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap().is_some());
        }
    }
}
