//! `wechat menu <file.json>`: upload a custom menu.

use crate::config::Account;
use anyhow::{Context, Result};
use std::path::Path;
use wechat_client::{Client, Menu};

pub async fn run(account: &Account, file: &Path, access_token: Option<&str>) -> Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let menu: Menu = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse menu in {}", file.display()))?;
    menu.validate().context("menu rejected")?;

    let client = Client::new(account.platform());
    let token = super::token::obtain(&client, account, access_token).await?;
    client
        .create_menu(&token, &menu, account.agent_id)
        .await
        .context("failed to create menu")?;
    println!("menu created ({} top-level buttons)", menu.button.len());
    Ok(())
}
