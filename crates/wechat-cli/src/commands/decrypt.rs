//! `wechat decrypt [ciphertext]`: recover the plaintext of a callback.
//!
//! Accepts a bare base64 ciphertext or a whole `<xml><Encrypt>…</Encrypt></xml>` body.

use crate::config::Account;
use anyhow::{Context, Result};
use tracing::info;
use wechat_core::{probe, EncodingKey, Envelope, EnvelopeCipher};

pub fn run(account: &Account, input: Option<&str>, kind_only: bool) -> Result<()> {
    let input = super::arg_or_stdin(input)?;
    let input = input.trim();
    let ciphertext = if input.starts_with('<') {
        Envelope::parse(input)
            .context("failed to read envelope")?
            .encrypt
    } else {
        input.to_string()
    };

    let key = EncodingKey::parse(account.encoding_aes_key()?).context("invalid --key")?;
    let cipher = EnvelopeCipher::new(key);

    // check the tenant only when one is configured
    let message = match account.id.as_deref() {
        Some(id) => cipher.decrypt_for(&ciphertext, id).context("decryption failed")?,
        None => {
            let frame = cipher.decrypt(&ciphertext).context("decryption failed")?;
            info!(tenant = %frame.tenant_id_lossy(), "decrypted without tenant check");
            frame.message
        }
    };
    let text = String::from_utf8(message).context("payload is not utf-8")?;

    if kind_only {
        let kind = probe(&text).context("unrecognized payload")?;
        println!("{kind:?}");
    } else {
        println!("{text}");
    }
    Ok(())
}
