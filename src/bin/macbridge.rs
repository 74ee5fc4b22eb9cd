//! macbridge CLI

use clap::Parser;
use macbridge::cli::{Cli, Commands, OutputFormat};
use macbridge::config::Config;
use macbridge::{tools, Tool, ToolResult};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref()).map_err(|e| anyhow::anyhow!(e))?;

    let result = match cli.command {
        Commands::Now => tools::DatetimeTool.execute(serde_json::json!({})).await,

        Commands::Calc { expression } => {
            tools::CalcTool.execute(serde_json::json!({"expression": expression})).await
        }

        Commands::Note { title, content, account } => {
            tools::CreateNoteTool.execute(serde_json::json!({
                "title": title, "content": content, "account": account
            })).await
        }

        Commands::Event { title, start, end, calendar } => {
            tools::CreateCalendarEventTool.execute(serde_json::json!({
                "title": title, "start": start, "end": end, "calendar": calendar
            })).await
        }

        Commands::Email { to, subject, body, account } => {
            tools::SendEmailTool::new(&config).execute(serde_json::json!({
                "to": to, "subject": subject, "body": body, "account": account
            })).await
        }

        Commands::Script { script, timeout } => {
            tools::RunScriptTool.execute(serde_json::json!({
                "script": script, "timeout_secs": timeout
            })).await
        }

        Commands::Tools => {
            for tool in tools::all_tools(&config) {
                println!("{}: {}", tool.name(), tool.description());
            }
            return Ok(());
        }
    };

    match cli.output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Text => print_text(result),
    }

    Ok(())
}

fn print_text(result: ToolResult) {
    if !result.success {
        eprintln!("Error: {}", result.error.unwrap_or_default());
        std::process::exit(1);
    }

    // Script runs get their captured streams back as-is
    if let Some(stdout) = result.payload.get("stdout").and_then(|v| v.as_str()) {
        if !stdout.is_empty() {
            println!("{stdout}");
        }
        if let Some(stderr) = result.payload.get("stderr").and_then(|v| v.as_str()) {
            if !stderr.is_empty() {
                eprintln!("[stderr]\n{stderr}");
            }
        }
        return;
    }

    for key in ["message", "datetime", "result"] {
        if let Some(value) = result.payload.get(key) {
            match value.as_str() {
                Some(s) => println!("{s}"),
                None => println!("{value}"),
            }
            return;
        }
    }

    println!("{}", serde_json::to_string_pretty(&result.payload).unwrap_or_default());
}
