//! Create note tool - Notes.app via the AppleScript bridge

use crate::tools::osa;
use crate::{BoxFuture, Tool, ToolResult};
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Clone, Deserialize)]
pub struct NoteArgs {
    pub title: String,
    pub content: String,
    #[serde(default = "default_account")]
    pub account: String,
}

fn default_account() -> String {
    "iCloud".to_string()
}

fn render_script(args: &NoteArgs) -> String {
    format!(
        r#"tell application "Notes"
    activate
    tell account "{account}"
        make new note with properties {{name:"{title}", body:"{content}"}}
    end tell
end tell"#,
        account = osa::escape_literal(&args.account),
        title = osa::escape_literal(&args.title),
        content = osa::escape_literal(&args.content),
    )
}

pub struct CreateNoteTool;

impl Tool for CreateNoteTool {
    fn name(&self) -> &'static str { "create_note" }
    fn description(&self) -> &'static str { "Create a note in Notes.app" }

    fn schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "title": {"type": "string", "description": "Note title"},
                "content": {"type": "string", "description": "Note body"},
                "account": {"type": "string", "description": "Notes account", "default": "iCloud"}
            },
            "required": ["title", "content"]
        })
    }

    fn execute(&self, args: Value) -> BoxFuture<'_, ToolResult> {
        Box::pin(async move {
            let args: NoteArgs = match serde_json::from_value(args) {
                Ok(a) => a,
                Err(e) => return ToolResult::err(format!("Invalid args: {e}")),
            };

            let script = render_script(&args);
            match osa::run_script(&script, osa::SCRIPT_TIMEOUT).await {
                Ok(out) if out.success() => {
                    tracing::info!("note '{}' added to {}", args.title, args.account);
                    ToolResult::ok(json!({
                        "message": format!("Note '{}' added to {}.", args.title, args.account)
                    }))
                }
                Ok(out) => ToolResult::err(if out.stderr.is_empty() {
                    format!("osascript exited with {}", out.status)
                } else {
                    out.stderr
                }),
                Err(e) => ToolResult::err(e),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(title: &str, content: &str) -> NoteArgs {
        NoteArgs {
            title: title.to_string(),
            content: content.to_string(),
            account: default_account(),
        }
    }

    #[test]
    fn script_contains_each_field_once() {
        let script = render_script(&args("Standup", "Discuss launch"));
        assert_eq!(script.matches("Standup").count(), 1);
        assert_eq!(script.matches("Discuss launch").count(), 1);
        assert!(script.contains(r#"tell account "iCloud""#));
    }

    #[test]
    fn hostile_fields_stay_inside_the_literal() {
        let script = render_script(&args(
            r#"a" & (do shell script "rm -rf ~")"#,
            "line1\nline2",
        ));
        // The quote is escaped, so the injection never closes the literal
        assert!(script.contains(r#"name:"a\" & (do shell script \"rm -rf ~\")""#));
        assert!(script.contains(r#"body:"line1\nline2""#));
    }

    #[test]
    fn backslashes_survive_escaping() {
        let script = render_script(&args(r"C:\path", "ok"));
        assert!(script.contains(r#"name:"C:\\path""#));
    }
}
