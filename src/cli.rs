// CLI definitions for macbridge — shared between the binary and build.rs.
//
// This module contains ONLY clap-derived types with no dependencies on
// the macbridge library internals. This allows build.rs to `include!()`
// this file for build-time man page and shell completion generation.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "macbridge")]
#[command(about = "macOS automation tools - shared CLI & MCP server")]
#[command(version)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format
    #[arg(short, long, default_value = "text", global = true)]
    pub output: OutputFormat,

    /// Config file path (default: platform config dir, or $MACBRIDGE_CONFIG)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the current local date and time
    Now,

    /// Evaluate a mathematical expression
    Calc {
        /// Expression, e.g. 'sqrt(2) * 10'
        expression: String,
    },

    /// Create a note in Notes.app
    Note {
        title: String,
        content: String,
        /// Notes account
        #[arg(short, long, default_value = "iCloud")]
        account: String,
    },

    /// Create an event in Calendar.app
    Event {
        title: String,
        /// Start time, YYYY-MM-DD HH:MM
        start: String,
        /// End time, same format (default: start + 1h)
        #[arg(short, long)]
        end: Option<String>,
        /// Calendar name
        #[arg(short, long, default_value = "个人")]
        calendar: String,
    },

    /// Send an email via a configured SMTP account
    Email {
        to: String,
        subject: String,
        body: String,
        /// Configured account name
        #[arg(short, long, default_value = "default")]
        account: String,
    },

    /// Run an AppleScript and capture its output
    Script {
        script: String,
        #[arg(short, long, default_value = "10")]
        timeout: u64,
    },

    /// List all available tools
    Tools,
}
