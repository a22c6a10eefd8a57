//! The account's `EncodingAESKey`.
//!
//! The platform hands out the 32-byte AES key as 43 base64 characters with
//! the trailing `=` stripped. Its last character usually carries non-zero
//! trailing bits, so the decoder must not insist on canonical encoding.

use crate::error::{WechatError, WechatResult};
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use std::fmt;
use std::str::FromStr;

/// AES-256 key length in bytes.
pub const KEY_LEN: usize = 32;

const KEY_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_allow_trailing_bits(true)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// A decoded 32-byte AES key.
#[derive(Clone, PartialEq, Eq)]
pub struct EncodingKey([u8; KEY_LEN]);

impl EncodingKey {
    /// Decode the 43-character configuration string.
    pub fn parse(encoded: &str) -> WechatResult<Self> {
        let trimmed = encoded.trim().trim_end_matches('=');
        let raw = KEY_ENGINE
            .decode(trimmed.as_bytes())
            .map_err(|e| WechatError::KeyEncoding(e.to_string()))?;
        Self::from_bytes(&raw)
    }

    /// Wrap raw key bytes, checking the length.
    pub fn from_bytes(raw: &[u8]) -> WechatResult<Self> {
        let key: [u8; KEY_LEN] = raw
            .try_into()
            .map_err(|_| WechatError::KeyLengthInvalid(raw.len()))?;
        Ok(Self(key))
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    /// CBC initialization vector: the first 16 key bytes.
    pub fn iv(&self) -> &[u8] {
        &self.0[..16]
    }
}

impl FromStr for EncodingKey {
    type Err = WechatError;

    fn from_str(s: &str) -> WechatResult<Self> {
        Self::parse(s)
    }
}

// Never print key material.
impl fmt::Debug for EncodingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EncodingKey(..)")
    }
}
