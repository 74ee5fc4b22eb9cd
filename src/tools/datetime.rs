//! Current datetime tool

use crate::{BoxFuture, Tool, ToolResult};
use serde_json::{json, Value};

pub struct DatetimeTool;

impl Tool for DatetimeTool {
    fn name(&self) -> &'static str { "current_datetime" }
    fn description(&self) -> &'static str { "Get the current local date and time" }

    fn schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {}
        })
    }

    fn execute(&self, _args: Value) -> BoxFuture<'_, ToolResult> {
        Box::pin(async move {
            let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
            ToolResult::ok(json!({"datetime": now}))
        })
    }
}
