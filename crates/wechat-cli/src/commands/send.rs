//! `wechat send --to <user> <text>`: push a text message.

use crate::config::Account;
use anyhow::{Context, Result};
use wechat_client::{Client, OutboundMessage};
use wechat_core::Platform;

pub async fn run(account: &Account, to: &str, text: &str, access_token: Option<&str>) -> Result<()> {
    let client = Client::new(account.platform());
    let mut message = OutboundMessage::text(to, text);
    if account.platform() == Platform::Work {
        let agent_id = account
            .agent_id
            .context("work accounts need --agent-id (or account.agent_id in the config file)")?;
        message = message.with_agent(agent_id);
    }

    let token = super::token::obtain(&client, account, access_token).await?;
    client
        .send_message(&token, &message)
        .await
        .with_context(|| format!("failed to send message to {to}"))?;
    println!("sent");
    Ok(())
}
