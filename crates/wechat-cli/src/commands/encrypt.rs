//! `wechat encrypt [message]`: encrypt a payload for the configured account.
//!
//! Prints the bare base64 ciphertext, or with `--reply` the signed response
//! envelope a callback endpoint would return.

use crate::config::Account;
use anyhow::{Context, Result};
use tracing::info;
use wechat_core::{CallbackQuery, EncodingKey, EnvelopeCipher};

pub fn run(
    account: &Account,
    message: Option<&str>,
    reply: bool,
    timestamp: Option<u64>,
    nonce: Option<&str>,
) -> Result<()> {
    let message = super::arg_or_stdin(message)?;

    let output = if reply {
        let handler = account.handler()?;
        let sealed = match (timestamp, nonce) {
            (Some(ts), Some(nonce)) => handler.seal_with(&message, ts, nonce),
            _ => {
                let query = CallbackQuery {
                    encrypt_type: Some("aes".into()),
                    ..CallbackQuery::default()
                };
                handler.seal(&query, &message)
            }
        };
        sealed.context("failed to seal reply")?
    } else {
        let key = EncodingKey::parse(account.encoding_aes_key()?).context("invalid --key")?;
        EnvelopeCipher::new(key)
            .encrypt(message.as_bytes(), account.id()?)
            .context("encryption failed")?
    };

    info!(bytes = message.len(), reply, "encrypted");
    println!("{output}");
    Ok(())
}
