//! CLI subcommand implementations.

pub mod decrypt;
pub mod encrypt;
pub mod menu;
pub mod send;
pub mod sign;
pub mod token;
pub mod verify_url;

use anyhow::{Context, Result};
use std::io::Read;

/// Use `arg` when given, otherwise read all of stdin (trailing newline stripped).
pub(crate) fn arg_or_stdin(arg: Option<&str>) -> Result<String> {
    if let Some(value) = arg {
        return Ok(value.to_string());
    }
    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .context("failed to read stdin")?;
    Ok(buf.trim_end_matches(['\r', '\n']).to_string())
}
