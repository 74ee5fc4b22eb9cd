//! Create calendar event tool - Calendar.app via the AppleScript bridge

use crate::tools::osa;
use crate::{BoxFuture, Tool, ToolResult};
use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::Deserialize;
use serde_json::{json, Value};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Clone, Deserialize)]
pub struct EventArgs {
    pub title: String,
    /// Start time, `YYYY-MM-DD HH:MM`
    pub start: String,
    /// End time, same format. Defaults to start + 1 hour.
    pub end: Option<String>,
    #[serde(default = "default_calendar")]
    pub calendar: String,
}

fn default_calendar() -> String {
    "个人".to_string()
}

fn parse_timestamp(s: &str) -> Result<NaiveDateTime, String> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .map_err(|e| format!("Invalid timestamp '{s}' (expected YYYY-MM-DD HH:MM): {e}"))
}

// AppleScript date literals are locale-dependent, so the script assigns
// year/month/day/hours/minutes as discrete fields on a fresh date value.
// `%B` month names are what the AppleScript `month` property accepts.
fn render_date_setup(var: &str, dt: NaiveDateTime) -> String {
    format!(
        r#"set {var} to current date
set year of {var} to {year}
set month of {var} to {month}
set day of {var} to {day}
set hours of {var} to {hours}
set minutes of {var} to {minutes}
set seconds of {var} to 0"#,
        year = dt.year(),
        month = dt.format("%B"),
        day = dt.day(),
        hours = dt.hour(),
        minutes = dt.minute(),
    )
}

fn render_script(title: &str, calendar: &str, start: NaiveDateTime, end: NaiveDateTime) -> String {
    format!(
        r#"{start_setup}
{end_setup}
tell application "Calendar"
    tell calendar "{calendar}"
        make new event with properties {{summary:"{title}", start date:startDate, end date:endDate}}
    end tell
end tell"#,
        start_setup = render_date_setup("startDate", start),
        end_setup = render_date_setup("endDate", end),
        calendar = osa::escape_literal(calendar),
        title = osa::escape_literal(title),
    )
}

pub struct CreateCalendarEventTool;

impl Tool for CreateCalendarEventTool {
    fn name(&self) -> &'static str { "create_calendar_event" }
    fn description(&self) -> &'static str { "Create an event in Calendar.app" }

    fn schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "title": {"type": "string", "description": "Event title"},
                "start": {"type": "string", "description": "Start time, YYYY-MM-DD HH:MM"},
                "end": {"type": "string", "description": "End time, same format (default: start + 1h)"},
                "calendar": {"type": "string", "description": "Calendar name", "default": "个人"}
            },
            "required": ["title", "start"]
        })
    }

    fn execute(&self, args: Value) -> BoxFuture<'_, ToolResult> {
        Box::pin(async move {
            let args: EventArgs = match serde_json::from_value(args) {
                Ok(a) => a,
                Err(e) => return ToolResult::err(format!("Invalid args: {e}")),
            };

            // Validate before any subprocess is launched
            let start = match parse_timestamp(&args.start) {
                Ok(dt) => dt,
                Err(e) => return ToolResult::err(e),
            };
            let end = match &args.end {
                Some(s) => match parse_timestamp(s) {
                    Ok(dt) => dt,
                    Err(e) => return ToolResult::err(e),
                },
                None => start + chrono::Duration::hours(1),
            };

            let script = render_script(&args.title, &args.calendar, start, end);
            match osa::run_script(&script, osa::SCRIPT_TIMEOUT).await {
                Ok(out) if out.success() => {
                    tracing::info!("event '{}' added to calendar '{}'", args.title, args.calendar);
                    ToolResult::ok(json!({
                        "message": format!(
                            "Event '{}' added to calendar '{}'.",
                            args.title, args.calendar
                        )
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

    #[test]
    fn parses_the_literal_format_only() {
        assert!(parse_timestamp("2024-01-01 10:00").is_ok());
        assert!(parse_timestamp("not-a-date").is_err());
        assert!(parse_timestamp("2024/01/01 10:00").is_err());
        assert!(parse_timestamp("2024-01-01").is_err());
    }

    #[test]
    fn end_defaults_to_start_plus_one_hour() {
        let start = parse_timestamp("2024-01-01 10:00").unwrap();
        let end = start + chrono::Duration::hours(1);
        let script = render_script("Sync", "Work", start, end);
        assert!(script.contains("set hours of startDate to 10"));
        assert!(script.contains("set hours of endDate to 11"));
        assert!(script.contains("set month of startDate to January"));
        assert!(script.contains("set day of startDate to 1"));
    }

    #[test]
    fn hour_rollover_crosses_midnight() {
        let start = parse_timestamp("2024-03-31 23:30").unwrap();
        let end = start + chrono::Duration::hours(1);
        let script = render_script("Late", "Work", start, end);
        assert!(script.contains("set day of endDate to 1"));
        assert!(script.contains("set month of endDate to April"));
        assert!(script.contains("set minutes of endDate to 30"));
    }

    #[test]
    fn title_and_calendar_are_escaped() {
        let start = parse_timestamp("2024-01-01 10:00").unwrap();
        let script = render_script(r#"1:1 "prep""#, "Work", start, start);
        assert!(script.contains(r#"summary:"1:1 \"prep\"""#));
        assert_eq!(script.matches(r#"tell calendar "Work""#).count(), 1);
    }
}
