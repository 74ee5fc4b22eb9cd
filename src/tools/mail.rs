//! Send email tool - one authenticated SMTP session per send

use crate::config::{Config, MailAccount};
use crate::{BoxFuture, Tool, ToolResult};
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;

const SMTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Deserialize)]
pub struct EmailArgs {
    pub to: String,
    pub subject: String,
    pub body: String,
    #[serde(default = "default_account")]
    pub account: String,
}

fn default_account() -> String {
    "default".to_string()
}

/// The account table is injected at construction; there is no global
/// credential state.
pub struct SendEmailTool {
    accounts: HashMap<String, MailAccount>,
}

impl SendEmailTool {
    pub fn new(config: &Config) -> Self {
        Self { accounts: config.accounts.clone() }
    }

    async fn send(&self, args: &EmailArgs) -> Result<(), String> {
        let cfg = self
            .accounts
            .get(&args.account)
            .ok_or_else(|| format!("Unknown account '{}'", args.account))?;
        let secret = cfg
            .secret
            .clone()
            .ok_or_else(|| format!("No credential configured for account '{}'", args.account))?;

        let from: Mailbox = cfg
            .username
            .parse()
            .map_err(|e| format!("Invalid sender address '{}': {e}", cfg.username))?;
        let to: Mailbox = args
            .to
            .parse()
            .map_err(|e| format!("Invalid recipient address '{}': {e}", args.to))?;

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(args.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(args.body.clone())
            .map_err(|e| format!("Failed to build message: {e}"))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&cfg.server)
            .map_err(|e| format!("SMTP setup failed: {e}"))?
            .port(cfg.port)
            .credentials(Credentials::new(cfg.username.clone(), secret))
            .timeout(Some(SMTP_TIMEOUT))
            .build();

        transport.send(message).await.map_err(|e| e.to_string())?;
        Ok(())
    }
}

impl Tool for SendEmailTool {
    fn name(&self) -> &'static str { "send_email" }
    fn description(&self) -> &'static str { "Send an email via a configured SMTP account" }

    fn schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "to": {"type": "string", "description": "Recipient address"},
                "subject": {"type": "string", "description": "Subject line"},
                "body": {"type": "string", "description": "Plain-text body"},
                "account": {"type": "string", "description": "Configured account name", "default": "default"}
            },
            "required": ["to", "subject", "body"]
        })
    }

    fn execute(&self, args: Value) -> BoxFuture<'_, ToolResult> {
        Box::pin(async move {
            let args: EmailArgs = match serde_json::from_value(args) {
                Ok(a) => a,
                Err(e) => return ToolResult::err(format!("Invalid args: {e}")),
            };

            match self.send(&args).await {
                Ok(()) => {
                    tracing::info!("email sent to {} via account '{}'", args.to, args.account);
                    ToolResult::ok(json!({"message": format!("Email sent to {}.", args.to)}))
                }
                Err(e) => ToolResult::err(e),
            }
        })
    }
}
