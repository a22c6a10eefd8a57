//! `wechat token`: fetch an access token.

use crate::config::Account;
use anyhow::{Context, Result};
use wechat_client::Client;

pub async fn run(account: &Account) -> Result<()> {
    let client = Client::new(account.platform());
    let token = client
        .fetch_access_token(account.id()?, account.secret()?)
        .await
        .context("failed to fetch access token")?;
    let out = serde_json::json!({
        "access_token": token.access_token,
        "expires_in": token.expires_in,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

/// Use an explicit `--access-token` or fetch a fresh one.
pub(crate) async fn obtain(
    client: &Client,
    account: &Account,
    explicit: Option<&str>,
) -> Result<String> {
    if let Some(token) = explicit {
        return Ok(token.to_string());
    }
    let token = client
        .fetch_access_token(account.id()?, account.secret()?)
        .await
        .context("failed to fetch access token")?;
    Ok(token.access_token)
}
