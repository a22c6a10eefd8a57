//! `wechat verify-url`: answer a URL verification handshake offline.

use crate::config::Account;
use anyhow::{Context, Result};
use wechat_core::CallbackQuery;

pub struct Params {
    pub signature: Option<String>,
    pub msg_signature: Option<String>,
    pub timestamp: String,
    pub nonce: String,
    pub echostr: String,
}

/// Print the body the endpoint should answer with.
pub fn run(account: &Account, params: Params) -> Result<()> {
    let handler = account.handler()?;
    let query = CallbackQuery {
        signature: params.signature,
        msg_signature: params.msg_signature,
        timestamp: Some(params.timestamp),
        nonce: Some(params.nonce),
        echostr: Some(params.echostr),
        encrypt_type: None,
    };
    let echo = handler
        .verify_url(&query)
        .context("url verification failed")?;
    println!("{echo}");
    Ok(())
}
