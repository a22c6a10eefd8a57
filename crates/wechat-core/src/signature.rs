//! Callback signatures.
//!
//! `signature = hex(SHA-1(concat(sort(parts))))`, lowercase. The handshake
//! and cleartext callbacks sign `{token, timestamp, nonce}`; encrypted
//! callbacks and replies add the base64 ciphertext as a fourth part.

use ring::digest::{digest, SHA1_FOR_LEGACY_USE_ONLY};
use subtle::ConstantTimeEq;

/// Compute the signature over an unordered set of parts.
pub fn sign(parts: &[&str]) -> String {
    let mut sorted = parts.to_vec();
    sorted.sort_unstable();
    let hash = digest(&SHA1_FOR_LEGACY_USE_ONLY, sorted.concat().as_bytes());
    hex::encode(hash.as_ref())
}

/// Check a received signature against the parts it should cover.
///
/// The comparison runs in constant time over the hex text.
pub fn validate(signature: &str, parts: &[&str]) -> bool {
    let expected = sign(parts);
    expected.as_bytes().ct_eq(signature.as_bytes()).into()
}
