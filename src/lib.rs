//! Core tool definitions - shared between CLI and MCP server
//!
//! Each tool is defined once, used in both binaries.

use serde::Serialize;
use serde_json::{Map, Value};
use std::future::Future;
use std::pin::Pin;

pub mod cli;
pub mod config;
pub mod mcp;
pub mod tools;

/// Tool execution result
///
/// Serializes to the envelope every operation returns: a `success` marker,
/// operation-specific payload fields flattened alongside it, and an `error`
/// message on failure.
#[derive(Debug, Serialize)]
pub struct ToolResult {
    pub success: bool,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolResult {
    /// Success envelope. `payload` must be a JSON object.
    pub fn ok(payload: Value) -> Self {
        let payload = match payload {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("result".into(), other);
                map
            }
        };
        Self { success: true, payload, error: None }
    }

    pub fn err(error: impl Into<String>) -> Self {
        Self { success: false, payload: Map::new(), error: Some(error.into()) }
    }

    /// Failure envelope that still carries payload fields (e.g. a script run
    /// that completed with a nonzero exit keeps its stdout/stderr).
    pub fn err_with(payload: Value, error: impl Into<String>) -> Self {
        let mut result = Self::ok(payload);
        result.success = false;
        result.error = Some(error.into());
        result
    }
}

/// Boxed future for dyn compatibility
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Trait for tools - dyn-compatible using BoxFuture
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn schema(&self) -> Value;
    fn execute(&self, args: Value) -> BoxFuture<'_, ToolResult>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_success_flattens_payload() {
        let result = ToolResult::ok(json!({"result": 4}));
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value, json!({"success": true, "result": 4}));
    }

    #[test]
    fn envelope_failure_carries_error() {
        let result = ToolResult::err("boom");
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value, json!({"success": false, "error": "boom"}));
    }

    #[test]
    fn envelope_failure_with_payload() {
        let result = ToolResult::err_with(json!({"returncode": 2}), "Exit: 2");
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["success"], json!(false));
        assert_eq!(value["returncode"], json!(2));
        assert_eq!(value["error"], json!("Exit: 2"));
    }
}
