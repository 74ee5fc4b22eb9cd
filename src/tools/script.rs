//! Run script tool - free-form AppleScript execution

use crate::tools::osa;
use crate::{BoxFuture, Tool, ToolResult};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct ScriptArgs {
    pub script: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 { 10 }

pub struct RunScriptTool;

impl Tool for RunScriptTool {
    fn name(&self) -> &'static str { "run_script" }
    fn description(&self) -> &'static str { "Run an AppleScript and capture its output" }

    fn schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "script": {"type": "string", "description": "AppleScript source (multi-line supported)"},
                "timeout_secs": {"type": "integer", "default": 10}
            },
            "required": ["script"]
        })
    }

    fn execute(&self, args: Value) -> BoxFuture<'_, ToolResult> {
        Box::pin(async move {
            let args: ScriptArgs = match serde_json::from_value(args) {
                Ok(a) => a,
                Err(e) => return ToolResult::err(format!("Invalid args: {e}")),
            };

            match osa::run_script(&args.script, Duration::from_secs(args.timeout_secs)).await {
                Ok(out) => {
                    let payload = json!({
                        "stdout": out.stdout,
                        "stderr": out.stderr,
                        "returncode": out.status,
                    });
                    if out.success() {
                        ToolResult::ok(payload)
                    } else {
                        ToolResult::err_with(payload, format!("Exit: {}", out.status))
                    }
                }
                Err(e) => ToolResult::err(e),
            }
        })
    }
}
