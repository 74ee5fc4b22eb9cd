//! Mail account configuration
//!
//! Accounts are loaded once at startup from a JSON config file and injected
//! into the tools that need them. Secrets are never stored in the file: each
//! account names an environment variable that holds its SMTP password, and the
//! variable is read at load time.

use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Connection settings for one named SMTP account.
#[derive(Clone, Deserialize)]
pub struct MailAccount {
    pub server: String,
    pub port: u16,
    pub username: String,
    /// Environment variable holding the password. Defaults to
    /// `SMTP_PASSWORD_<ACCOUNT>` (account name uppercased).
    #[serde(default)]
    pub password_env: Option<String>,
    #[serde(skip)]
    pub secret: Option<String>,
}

// Manual impl so a secret can never leak through debug logging.
impl fmt::Debug for MailAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailAccount")
            .field("server", &self.server)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("secret", &self.secret.as_ref().map(|_| "***"))
            .finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub accounts: HashMap<String, MailAccount>,
}

fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("macbridge")
        .join("config.json")
}

impl Config {
    /// Load from an explicit path, `MACBRIDGE_CONFIG`, or the default
    /// location. A missing file yields an empty config (the tools that need
    /// accounts report the gap per call); a malformed file is a startup error.
    pub fn load(path: Option<&Path>) -> Result<Config, String> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => std::env::var_os("MACBRIDGE_CONFIG")
                .map(PathBuf::from)
                .unwrap_or_else(default_config_path),
        };

        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Config::default());
            }
            Err(e) => return Err(format!("Failed to read {}: {e}", path.display())),
        };

        let mut config: Config = serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse {}: {e}", path.display()))?;
        config.resolve_secrets();
        Ok(config)
    }

    fn resolve_secrets(&mut self) {
        for (name, account) in self.accounts.iter_mut() {
            let var = account.password_env.clone().unwrap_or_else(|| {
                format!("SMTP_PASSWORD_{}", name.to_uppercase().replace('-', "_"))
            });
            account.secret = std::env::var(&var).ok();
        }
    }
}
