//! Plaintext framing for encrypted callbacks.
//!
//! Wire format: `[16-byte nonce][4-byte big-endian length][message][tenant id]`,
//! then PKCS#7 padded to a multiple of [`PAD_UNIT`] before encryption.

use crate::error::{WechatError, WechatResult};

pub const NONCE_LEN: usize = 16;
const HEADER_LEN: usize = NONCE_LEN + 4;

/// PKCS#7 padding unit used by the platform (the key size, not the AES block size).
pub const PAD_UNIT: usize = 32;

/// A decrypted, unpadded plaintext frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub nonce: [u8; NONCE_LEN],
    pub message: Vec<u8>,
    pub tenant_id: Vec<u8>,
}

impl Frame {
    /// Serialize into `nonce || len || message || tenant_id` (unpadded).
    pub fn encode(&self) -> WechatResult<Vec<u8>> {
        let len = u32::try_from(self.message.len()).map_err(|_| {
            WechatError::MalformedCiphertext(format!(
                "message too large to frame: {} bytes",
                self.message.len()
            ))
        })?;
        let mut out = Vec::with_capacity(HEADER_LEN + self.message.len() + self.tenant_id.len());
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&len.to_be_bytes());
        out.extend_from_slice(&self.message);
        out.extend_from_slice(&self.tenant_id);
        Ok(out)
    }

    /// Parse an unpadded frame.
    pub fn decode(data: &[u8]) -> WechatResult<Self> {
        if data.len() < HEADER_LEN {
            return Err(WechatError::MalformedCiphertext(format!(
                "frame too short: {} bytes",
                data.len()
            )));
        }
        let len = u32::from_be_bytes([data[16], data[17], data[18], data[19]]) as usize;
        let end = HEADER_LEN
            .checked_add(len)
            .filter(|&end| end <= data.len())
            .ok_or_else(|| {
                WechatError::MalformedCiphertext(format!(
                    "declared message length {len} exceeds frame of {} bytes",
                    data.len()
                ))
            })?;

        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(&data[..NONCE_LEN]);
        Ok(Self {
            nonce,
            message: data[HEADER_LEN..end].to_vec(),
            tenant_id: data[end..].to_vec(),
        })
    }

    /// Tenant id as text, for diagnostics.
    pub fn tenant_id_lossy(&self) -> String {
        String::from_utf8_lossy(&self.tenant_id).into_owned()
    }
}

/// Append PKCS#7 padding up to the next multiple of `unit`. Always adds at least one byte.
pub fn pad(data: &mut Vec<u8>, unit: usize) {
    debug_assert!((1..=255).contains(&unit));
    let n = unit - data.len() % unit;
    data.resize(data.len() + n, n as u8);
}

/// Strip PKCS#7 padding, rejecting anything not produced by [`pad`].
pub fn unpad(data: &[u8], unit: usize) -> WechatResult<&[u8]> {
    let &last = data.last().ok_or(WechatError::PaddingInvalid)?;
    let n = last as usize;
    if n == 0 || n > unit || n > data.len() {
        return Err(WechatError::PaddingInvalid);
    }
    let (body, padding) = data.split_at(data.len() - n);
    if padding.iter().any(|&b| b != last) {
        return Err(WechatError::PaddingInvalid);
    }
    Ok(body)
}
