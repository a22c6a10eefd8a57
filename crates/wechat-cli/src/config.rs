//! Client configuration at `~/.wechat/config.toml`.
//!
//! Supplies account defaults; CLI flags always override config file values.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;
use wechat_core::{CallbackHandler, Platform, SecurityMode};

/// Top-level config file structure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub account: Account,
}

/// Account credentials. Every field is optional so partial files work.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Account {
    #[serde(default)]
    pub platform: Option<Platform>,
    /// App id (official) or corp id (work).
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub secret: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub encoding_aes_key: Option<String>,
    #[serde(default)]
    pub agent_id: Option<i64>,
}

impl Config {
    /// Load configuration from a TOML file, returning defaults if the file
    /// does not exist.
    pub fn load(path: &str) -> Result<Self> {
        let path = Path::new(path);
        if !path.exists() {
            debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("failed to parse config at {}", path.display()))?;

        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }
}

impl Account {
    /// Fill unset fields from `fallback`.
    pub fn or(self, fallback: Account) -> Account {
        Account {
            platform: self.platform.or(fallback.platform),
            id: self.id.or(fallback.id),
            secret: self.secret.or(fallback.secret),
            token: self.token.or(fallback.token),
            encoding_aes_key: self.encoding_aes_key.or(fallback.encoding_aes_key),
            agent_id: self.agent_id.or(fallback.agent_id),
        }
    }

    pub fn platform(&self) -> Platform {
        self.platform.unwrap_or(Platform::Official)
    }

    pub fn id(&self) -> Result<&str> {
        require(&self.id, "--id", "id")
    }

    pub fn secret(&self) -> Result<&str> {
        require(&self.secret, "--secret", "secret")
    }

    pub fn token(&self) -> Result<&str> {
        require(&self.token, "--token", "token")
    }

    pub fn encoding_aes_key(&self) -> Result<&str> {
        require(&self.encoding_aes_key, "--key", "encoding_aes_key")
    }

    /// Callback pipeline for the handshake and reply commands.
    pub fn handler(&self) -> Result<CallbackHandler> {
        let mode = if self.encoding_aes_key.is_some() {
            SecurityMode::Compatible
        } else {
            SecurityMode::Plaintext
        };
        CallbackHandler::new(
            self.platform(),
            self.id()?,
            self.token()?,
            self.encoding_aes_key.as_deref(),
            mode,
        )
        .context("invalid account configuration")
    }
}

fn require<'a>(value: &'a Option<String>, flag: &str, key: &str) -> Result<&'a str> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .with_context(|| format!("missing {flag} (or account.{key} in the config file)"))
}
