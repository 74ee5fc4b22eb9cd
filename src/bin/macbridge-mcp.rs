//! macbridge-mcp - MCP Server using the same tools as the macbridge CLI
//!
//! JSON-RPC over stdio; logging goes to stderr so stdout stays clean for
//! the protocol.

use clap::Parser;
use macbridge::config::Config;
use macbridge::mcp::McpServer;
use macbridge::tools;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "macbridge-mcp")]
#[command(about = "MCP Server - same tools as the macbridge CLI")]
#[command(version)]
struct Cli {
    /// Config file path (default: platform config dir, or $MACBRIDGE_CONFIG)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).map_err(|e| anyhow::anyhow!(e))?;

    let server = McpServer::new(tools::all_tools(&config));
    server.run().await?;

    Ok(())
}
