//! AppleScript bridge - the one interface to the OS automation interpreter
//!
//! Higher-level tools (notes, calendar, free-form scripts) render script text
//! and hand it to `run_script`; nothing else in the crate spawns osascript.

use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Timeout applied to template-generated scripts (note/event creation).
pub const SCRIPT_TIMEOUT: Duration = Duration::from_secs(30);

/// Captured result of one interpreter run.
#[derive(Debug)]
pub struct ScriptOutput {
    pub stdout: String,
    pub stderr: String,
    pub status: i32,
}

impl ScriptOutput {
    pub fn success(&self) -> bool {
        self.status == 0
    }
}

/// Escape a free-text field for an AppleScript string literal.
///
/// Backslashes must be escaped before quotes; the reverse order would
/// double-escape the quote markers and corrupt the script.
pub fn escape_literal(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

/// Execute a script via `osascript -e`, waiting up to `limit`.
pub async fn run_script(script: &str, limit: Duration) -> Result<ScriptOutput, String> {
    let mut cmd = Command::new("osascript");
    cmd.arg("-e").arg(script);
    run_with_timeout(cmd, limit).await
}

/// Spawn `cmd` and wait up to `limit` for it to finish, capturing output.
/// `kill_on_drop` reaps the child if the timeout fires first.
pub(crate) async fn run_with_timeout(
    mut cmd: Command,
    limit: Duration,
) -> Result<ScriptOutput, String> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = cmd.spawn().map_err(|e| format!("Failed to spawn: {e}"))?;

    match tokio::time::timeout(limit, child.wait_with_output()).await {
        Ok(Ok(output)) => Ok(ScriptOutput {
            stdout: String::from_utf8_lossy(&output.stdout).trim_end().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim_end().to_string(),
            status: output.status.code().unwrap_or(-1),
        }),
        Ok(Err(e)) => Err(format!("Exec failed: {e}")),
        Err(_) => Err(format!("Timeout after {}s", limit.as_secs())),
    }
}
