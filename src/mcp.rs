//! MCP Server implementation
//!
//! Speaks MCP protocol over stdio. All tools are executed directly.
//! The text content of a tool-call response is the serialized result
//! envelope, so callers always see the same `{success, ...}` shape.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::io::{self, BufRead, Write};

use crate::Tool;

/// MCP JSON-RPC request
#[derive(Debug, Deserialize)]
struct McpRequest {
    #[allow(dead_code)]
    jsonrpc: String,
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Value,
}

/// MCP JSON-RPC response
#[derive(Debug, Serialize)]
struct McpResponse {
    jsonrpc: String,
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<McpError>,
}

#[derive(Debug, Serialize)]
struct McpError {
    code: i32,
    message: String,
}

impl McpResponse {
    fn ok(id: Value, result: Value) -> Self {
        Self { jsonrpc: "2.0".into(), id, result: Some(result), error: None }
    }

    fn err(id: Value, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            id,
            result: None,
            error: Some(McpError { code, message: message.into() }),
        }
    }
}

/// MCP Server - handles stdio communication
pub struct McpServer {
    tools: Vec<Box<dyn Tool>>,
}

impl McpServer {
    pub fn new(tools: Vec<Box<dyn Tool>>) -> Self {
        Self { tools }
    }

    /// Run the server (blocking, reads from stdin)
    pub async fn run(&self) -> io::Result<()> {
        let stdin = io::stdin();
        let mut stdout = io::stdout();

        for line in stdin.lock().lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let response = self.handle_request(&line).await;
            let output = serde_json::to_string(&response)?;
            writeln!(stdout, "{}", output)?;
            stdout.flush()?;
        }

        Ok(())
    }

    async fn handle_request(&self, line: &str) -> McpResponse {
        let req: McpRequest = match serde_json::from_str(line) {
            Ok(r) => r,
            Err(e) => return McpResponse::err(Value::Null, -32700, format!("Parse error: {}", e)),
        };

        let id = req.id.unwrap_or(Value::Null);

        match req.method.as_str() {
            "initialize" => self.handle_initialize(id, req.params),
            "tools/list" => self.handle_tools_list(id),
            "tools/call" => self.handle_tools_call(id, req.params).await,
            "notifications/initialized" => McpResponse::ok(id, json!({})),
            _ => McpResponse::err(id, -32601, format!("Method not found: {}", req.method)),
        }
    }

    fn handle_initialize(&self, id: Value, _params: Value) -> McpResponse {
        McpResponse::ok(id, json!({
            "protocolVersion": "2024-11-05",
            "capabilities": {
                "tools": {}
            },
            "serverInfo": {
                "name": "macbridge",
                "version": env!("CARGO_PKG_VERSION")
            }
        }))
    }

    fn handle_tools_list(&self, id: Value) -> McpResponse {
        let tools: Vec<Value> = self.tools.iter().map(|t| {
            json!({
                "name": t.name(),
                "description": t.description(),
                "inputSchema": t.schema()
            })
        }).collect();

        McpResponse::ok(id, json!({ "tools": tools }))
    }

    async fn handle_tools_call(&self, id: Value, params: Value) -> McpResponse {
        let name = params.get("name").and_then(|n| n.as_str()).unwrap_or("");
        let args = params.get("arguments").cloned().unwrap_or(json!({}));

        let tool = match self.tools.iter().find(|t| t.name() == name) {
            Some(t) => t,
            None => return McpResponse::err(id, -32602, format!("Unknown tool: {}", name)),
        };

        let result = tool.execute(args).await;
        let success = result.success;

        // The envelope itself is the content
        let text = match serde_json::to_string(&result) {
            Ok(t) => t,
            Err(e) => return McpResponse::err(id, -32603, format!("Serialize error: {}", e)),
        };

        McpResponse::ok(id, json!({
            "content": [{
                "type": "text",
                "text": text
            }],
            "isError": !success
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::tools;

    fn server() -> McpServer {
        McpServer::new(tools::all_tools(&Config::default()))
    }

    #[tokio::test]
    async fn tools_list_names_every_operation() {
        let response = server()
            .handle_request(r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#)
            .await;
        let result = response.result.unwrap();
        let names: Vec<&str> = result["tools"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap())
            .collect();
        for expected in [
            "current_datetime",
            "calculate",
            "create_note",
            "create_calendar_event",
            "send_email",
            "run_script",
        ] {
            assert!(names.contains(&expected), "missing {expected}");
        }
    }

    #[tokio::test]
    async fn tool_call_wraps_the_envelope() {
        let response = server()
            .handle_request(
                r#"{"jsonrpc":"2.0","id":2,"method":"tools/call",
                    "params":{"name":"calculate","arguments":{"expression":"2+2"}}}"#,
            )
            .await;
        let result = response.result.unwrap();
        assert_eq!(result["isError"], json!(false));
        let text = result["content"][0]["text"].as_str().unwrap();
        let envelope: Value = serde_json::from_str(text).unwrap();
        assert_eq!(envelope, json!({"success": true, "result": 4}));
    }

    #[tokio::test]
    async fn unknown_tool_is_a_protocol_error() {
        let response = server()
            .handle_request(
                r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"nope"}}"#,
            )
            .await;
        assert!(response.error.is_some());
    }

    #[tokio::test]
    async fn malformed_json_is_a_parse_error() {
        let response = server().handle_request("{nope").await;
        assert_eq!(response.error.unwrap().code, -32700);
    }
}
