//! Tests for macbridge tools

#[cfg(test)]
mod tests {
    use macbridge::config::Config;
    use macbridge::tools::*;
    use macbridge::Tool;
    use serde_json::json;

    // ==================== Datetime Tool ====================

    #[tokio::test]
    async fn test_datetime_format() {
        let result = DatetimeTool.execute(json!({})).await;

        assert!(result.success);
        let datetime = result.payload["datetime"].as_str().unwrap();
        assert!(
            chrono::NaiveDateTime::parse_from_str(datetime, "%Y-%m-%d %H:%M:%S").is_ok(),
            "unexpected datetime shape: {datetime}"
        );
    }

    // ==================== Calculate Tool ====================

    #[tokio::test]
    async fn test_calculate_simple() {
        let result = CalcTool.execute(json!({"expression": "2+2"})).await;

        assert!(result.success);
        assert_eq!(result.payload["result"], json!(4));
    }

    #[tokio::test]
    async fn test_calculate_math_functions() {
        let result = CalcTool.execute(json!({"expression": "sqrt(16) + min(1, 2)"})).await;

        assert!(result.success);
        assert_eq!(result.payload["result"], json!(5));
    }

    #[tokio::test]
    async fn test_calculate_fractional() {
        let result = CalcTool.execute(json!({"expression": "7 / 2"})).await;

        assert!(result.success);
        assert_eq!(result.payload["result"], json!(3.5));
    }

    #[tokio::test]
    async fn test_calculate_comparison() {
        let result = CalcTool.execute(json!({"expression": "2 < 3"})).await;

        assert!(result.success);
        assert_eq!(result.payload["result"], json!(true));
    }

    #[tokio::test]
    async fn test_calculate_rejects_non_whitelisted_symbols() {
        for expression in [
            "__import__('os').system('id')",
            "open('/etc/passwd')",
            "eval(1)",
            "subprocess",
        ] {
            let result = CalcTool.execute(json!({"expression": expression})).await;
            assert!(!result.success, "should reject: {expression}");
            assert!(result.error.is_some());
        }
    }

    #[tokio::test]
    async fn test_calculate_parse_error() {
        let result = CalcTool.execute(json!({"expression": "2 +"})).await;

        assert!(!result.success);
        assert!(result.error.is_some());
    }

    #[tokio::test]
    async fn test_calculate_missing_args() {
        let result = CalcTool.execute(json!({})).await;

        assert!(!result.success);
        assert!(result.error.unwrap().contains("Invalid args"));
    }

    // ==================== Note Tool ====================

    #[tokio::test]
    async fn test_note_missing_args() {
        let result = CreateNoteTool.execute(json!({"title": "only a title"})).await;

        assert!(!result.success);
        assert!(result.error.unwrap().contains("Invalid args"));
    }

    // ==================== Calendar Tool ====================

    #[tokio::test]
    async fn test_event_malformed_start_fails_without_subprocess() {
        let result = CreateCalendarEventTool
            .execute(json!({"title": "Sync", "start": "not-a-date"}))
            .await;

        assert!(!result.success);
        assert!(result.error.unwrap().contains("Invalid timestamp"));
    }

    #[tokio::test]
    async fn test_event_malformed_end_fails_without_subprocess() {
        let result = CreateCalendarEventTool
            .execute(json!({"title": "Sync", "start": "2024-01-01 10:00", "end": "tomorrow"}))
            .await;

        assert!(!result.success);
        assert!(result.error.unwrap().contains("Invalid timestamp"));
    }

    // ==================== Email Tool ====================

    #[tokio::test]
    async fn test_email_unknown_account() {
        let tool = SendEmailTool::new(&Config::default());
        let result = tool
            .execute(json!({
                "to": "someone@example.com",
                "subject": "hi",
                "body": "hello",
                "account": "nonexistent"
            }))
            .await;

        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("Unknown account 'nonexistent'"));
    }

    #[tokio::test]
    async fn test_email_missing_args() {
        let tool = SendEmailTool::new(&Config::default());
        let result = tool.execute(json!({"to": "someone@example.com"})).await;

        assert!(!result.success);
        assert!(result.error.unwrap().contains("Invalid args"));
    }

    // ==================== Script Tool ====================

    #[tokio::test]
    async fn test_script_missing_args() {
        let result = RunScriptTool.execute(json!({})).await;

        assert!(!result.success);
        assert!(result.error.unwrap().contains("Invalid args"));
    }

    #[cfg(target_os = "macos")]
    #[tokio::test]
    async fn test_script_captures_output() {
        let result = RunScriptTool.execute(json!({"script": "return \"pong\""})).await;

        assert!(result.success, "osascript failed: {:?}", result.error);
        assert_eq!(result.payload["stdout"], json!("pong"));
        assert_eq!(result.payload["returncode"], json!(0));
    }

    #[cfg(target_os = "macos")]
    #[tokio::test]
    async fn test_script_timeout_terminates_child() {
        let started = std::time::Instant::now();
        let result = RunScriptTool
            .execute(json!({"script": "delay 30", "timeout_secs": 1}))
            .await;

        assert!(!result.success);
        assert!(result.error.unwrap().contains("Timeout"));
        assert!(started.elapsed() < std::time::Duration::from_secs(10));
    }

    // ==================== Registry ====================

    #[tokio::test]
    async fn test_registry_has_unique_names() {
        let tools = all_tools(&Config::default());
        let mut names: Vec<&str> = tools.iter().map(|t| t.name()).collect();
        assert_eq!(names.len(), 6);
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 6);
    }

    #[tokio::test]
    async fn test_find_tool() {
        let config = Config::default();
        assert!(find_tool(&config, "calculate").is_some());
        assert!(find_tool(&config, "create_calendar_event").is_some());
        assert!(find_tool(&config, "no_such_tool").is_none());
    }

    #[tokio::test]
    async fn test_schemas_are_objects() {
        for tool in all_tools(&Config::default()) {
            let schema = tool.schema();
            assert_eq!(schema["type"], json!("object"), "{} schema", tool.name());
            assert!(schema["properties"].is_object(), "{} schema", tool.name());
        }
    }
}
