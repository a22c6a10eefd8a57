//! `wechat sign <part>...`: compute a callback signature.

use anyhow::{bail, Result};
use tracing::debug;
use wechat_core::signature;

/// Print the signature over `parts` (order does not matter).
pub fn run(parts: &[String]) -> Result<()> {
    if parts.is_empty() {
        bail!("nothing to sign");
    }
    let refs: Vec<&str> = parts.iter().map(String::as_str).collect();
    let sig = signature::sign(&refs);
    debug!(parts = refs.len(), "signed");
    println!("{sig}");
    Ok(())
}
