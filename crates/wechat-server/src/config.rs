//! Server configuration: TOML file + CLI overrides.

use serde::Deserialize;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use tracing::info;
use wechat_core::{CallbackHandler, Platform, SecurityMode, WechatError, WechatResult};

/// Top-level config file structure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub account: Option<AccountSection>,
    #[serde(default)]
    pub reply: ReplySection,
}

/// `[server]` section of the config TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_path")]
    pub path: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            path: default_path(),
        }
    }
}

/// `[account]` section: the account whose callbacks this server receives.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountSection {
    #[serde(default = "default_platform")]
    pub platform: Platform,
    /// App id (official) or corp id (work).
    pub id: String,
    pub token: String,
    #[serde(default)]
    pub encoding_aes_key: Option<String>,
    #[serde(default)]
    pub mode: SecurityMode,
}

/// `[reply]` section: auto-reply behaviour.
#[derive(Debug, Clone, Deserialize)]
pub struct ReplySection {
    #[serde(default = "default_welcome")]
    pub welcome: String,
    #[serde(default = "default_true")]
    pub echo: bool,
}

impl Default for ReplySection {
    fn default() -> Self {
        Self {
            welcome: default_welcome(),
            echo: true,
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_path() -> String {
    "/wechat".to_string()
}
fn default_platform() -> Platform {
    Platform::Official
}
fn default_welcome() -> String {
    "Thanks for following!".to_string()
}
fn default_true() -> bool {
    true
}

/// Resolved server configuration (paths expanded, CLI overrides applied).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: IpAddr,
    pub port: u16,
    pub path: String,
    pub account: AccountSection,
    pub reply: ReplySection,
}

impl ServerConfig {
    /// Load config from TOML file, then apply CLI overrides.
    pub fn load(
        config_path: &Path,
        cli_bind: Option<&str>,
        cli_port: Option<u16>,
        cli_path: Option<&str>,
    ) -> WechatResult<Self> {
        let expanded = expand_tilde(config_path);
        let file_config = if expanded.exists() {
            info!(path = %expanded.display(), "loading config file");
            let content = std::fs::read_to_string(&expanded)?;
            parse(&content)?
        } else {
            info!(path = %expanded.display(), "config file not found, using defaults");
            ConfigFile::default()
        };

        let account = file_config.account.ok_or_else(|| {
            WechatError::Config(format!(
                "no [account] section in {}",
                expanded.display()
            ))
        })?;

        let bind_str = cli_bind
            .map(|s| s.to_string())
            .unwrap_or(file_config.server.bind);
        let bind = bind_str
            .parse::<IpAddr>()
            .map_err(|e| WechatError::Config(format!("invalid bind address {bind_str:?}: {e}")))?;
        let port = cli_port.unwrap_or(file_config.server.port);
        let path = normalize_path(cli_path.unwrap_or(&file_config.server.path));

        Ok(Self {
            bind,
            port,
            path,
            account,
            reply: file_config.reply,
        })
    }

    /// Build the callback pipeline for the configured account.
    pub fn handler(&self) -> WechatResult<CallbackHandler> {
        CallbackHandler::new(
            self.account.platform,
            &self.account.id,
            &self.account.token,
            self.account.encoding_aes_key.as_deref(),
            self.account.mode,
        )
    }
}

fn parse(content: &str) -> WechatResult<ConfigFile> {
    toml::from_str(content).map_err(|e| WechatError::Config(format!("config parse error: {e}")))
}

fn normalize_path(path: &str) -> String {
    let trimmed = path.trim().trim_end_matches('/');
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// Expand `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
    let s = path.to_string_lossy();
    if let Some(rest) = s.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}
