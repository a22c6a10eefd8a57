//! AES-256-CBC envelope cipher.
//!
//! `ciphertext = base64(AES-256-CBC(key, iv = key[..16], pkcs7_32(frame)))`
//! where `frame = nonce(16) || len(4, BE) || message || tenant_id`.

use crate::error::{WechatError, WechatResult};
use crate::frame::{self, Frame, NONCE_LEN, PAD_UNIT};
use crate::key::EncodingKey;
use aes::Aes256;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use cbc::cipher::block_padding::NoPadding;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use ring::rand::{SecureRandom, SystemRandom};

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// AES block size in bytes.
pub const BLOCK_LEN: usize = 16;

/// Encrypts and decrypts callback frames with one account key.
///
/// Holds no mutable state; share it across request handlers freely.
#[derive(Debug, Clone)]
pub struct EnvelopeCipher {
    key: EncodingKey,
    rng: SystemRandom,
}

impl EnvelopeCipher {
    pub fn new(key: EncodingKey) -> Self {
        Self {
            key,
            rng: SystemRandom::new(),
        }
    }

    /// Frame `message` for `tenant_id` with a fresh nonce and encrypt it.
    pub fn encrypt(&self, message: &[u8], tenant_id: &str) -> WechatResult<String> {
        let mut nonce = [0u8; NONCE_LEN];
        self.rng
            .fill(&mut nonce)
            .map_err(|_| WechatError::InsufficientRandomness)?;

        self.seal_frame(&Frame {
            nonce,
            message: message.to_vec(),
            tenant_id: tenant_id.as_bytes().to_vec(),
        })
    }

    /// Encrypt an already-built frame.
    pub fn seal_frame(&self, frame: &Frame) -> WechatResult<String> {
        let mut buf = frame.encode()?;
        frame::pad(&mut buf, PAD_UNIT);
        let len = buf.len();

        let ciphertext = Aes256CbcEnc::new_from_slices(self.key.as_bytes(), self.key.iv())
            .map_err(|_| WechatError::KeyLengthInvalid(self.key.as_bytes().len()))?
            .encrypt_padded_mut::<NoPadding>(&mut buf, len)
            .map_err(|_| WechatError::PaddingInvalid)?;

        Ok(STANDARD.encode(ciphertext))
    }

    /// Decrypt a base64 ciphertext into its frame. Does not check the tenant.
    pub fn decrypt(&self, ciphertext: &str) -> WechatResult<Frame> {
        let mut buf = STANDARD
            .decode(ciphertext.trim())
            .map_err(|e| WechatError::MalformedCiphertext(format!("invalid base64: {e}")))?;

        if buf.is_empty() || buf.len() % BLOCK_LEN != 0 {
            return Err(WechatError::MalformedCiphertext(format!(
                "ciphertext length {} is not a positive multiple of {BLOCK_LEN}",
                buf.len()
            )));
        }

        let plain = Aes256CbcDec::new_from_slices(self.key.as_bytes(), self.key.iv())
            .map_err(|_| WechatError::KeyLengthInvalid(self.key.as_bytes().len()))?
            .decrypt_padded_mut::<NoPadding>(&mut buf)
            .map_err(|_| WechatError::PaddingInvalid)?;

        Frame::decode(frame::unpad(plain, PAD_UNIT)?)
    }

    /// Decrypt and require the frame to belong to `tenant_id`. Returns the message.
    pub fn decrypt_for(&self, ciphertext: &str, tenant_id: &str) -> WechatResult<Vec<u8>> {
        let frame = self.decrypt(ciphertext)?;
        if frame.tenant_id != tenant_id.as_bytes() {
            return Err(WechatError::TenantMismatch {
                expected: tenant_id.to_string(),
                actual: frame.tenant_id_lossy(),
            });
        }
        Ok(frame.message)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const KEY: &str = "jRwY6v82amVaTB4eXdjG775NH8ubF6AwauNed88UfGK";
    pub(crate) const TENANT: &str = "wx2f6d0a549c129f06";

    /// Encrypted text message with `<Content><![CDATA[hello body]]></Content>`.
    pub(crate) const HELLO_BODY: &str = "sq1d1sgR6C39QKNRJk21zIwWZrVY4EJrpX3cVJznqSqeNJjbzbjUOMnrFAHGREBizLgVU68/IOWNE5VVzQH7cYG9CVHVtS10SJepGDXhvPjXxdsyRkoxX9YJcEsxQkV4u8niGDDSfUW69d93u2V1/gMfnkxo+0yHMZcS6rvRhMYA0O8TiE2W3K092ELdfWsLxNy2Gd/+Uv9D6IcyQ8uO/1Vu6x0KhuG9EtVSooEfdqqdpkOKyiaXn4bf/Umn0PQTurrO6Fh6ghgxPxpMIcSEzhfAMMCn14pojlt113yjrh6x1vYj3gElWGeMiOm3fpjuplOVwoDSVzcPaR5zLPgizAO3WQj0ho0JQh4RJ6ZRpmaDaPlHHBX7hAiOFOyc3bScUQQfk6tOfwAOAn4x44og+INaKJqtFhsJ6Wavr+H5mYo=";

    /// Handshake echostr that decrypts to `4362985891886127916`.
    pub(crate) const ECHOSTR: &str = "esO4Svu/v89CuQ07sXQVHN9alKpivaxlO++FrgwNaIC+oeFMQa6FC0u5OtiNb+GjRo352TIvlTjiN/xEsRaX0Q==";

    const REST: &str = "8xkfcZ4H50bmdMXxUh1fi9sPYboKROAgPN9Obyvjxs/q9CGjRoVJJpGUz3A4XzXSI/faqOZClv0Y+aHlYMqhBpyzO6wd9iIPNcShnPTet/lUisLiz4moEeqEnLrJo25slK5j7zuI0lrLu9EnMArdYFNHd4J/rr+SK3hNh3zyXin+wEC+RuLJG+TG32AizGCcuPfe0db9/jvID8pqWjE/+Q08aaecMWhSDFk2VbWT8I5TKdo/MUsj+NQMg3c5Z4WB0fkSF8JWGz8VDnIofo9FvsFUCc3BvjLqcTldYTHE/65Qn9COdsd9qwAsPZoPdjpFRB5pl3lPjeoSW/WzT+lL5V+Y/5VfcvniZAzVKDoCdtV8Ufzs+H7JRDa/yGGMYT48AY1skYdFA00aUAOJkeTPDEtz8CtZcREYsiSnGMpgFTY=";

    const OTHER_KEY: &str = "jWmYm7qr5nMoAUwZRjGtBxmz3KA1tkAj3ykkR6q2B2C";
    const OTHER_TENANT: &str = "wx5823bf96d3bd56c7";
    const OTHER: &str = "RypEvHKD8QQKFhvQ6QleEB4J58tiPdvo+rtK1I9qca6aM/wvqnLSV5zEPeusUiX5L5X/0lWfrf0QADHHhGd3QczcdCUpj911L3vg3W/sYYvuJTs3TUUkSUXxaccAS0qhxchrRYt66wiSpGLYL42aM6A8dTT+6k4aSknmPj48kzJs8qLjvd4Xgpue06DOdnLxAUHzM6+kDZ+HMZfJYuR+LtwGc2hgf5gsijff0ekUNXZiqATP7PF5mZxZ3Izoun1s4zG4LUMnvw2r+KqCKIw+3IQH03v+BCA9nMELNqbSf6tiWSrXJB3LAVGUcallcrw8V2t9EL4EhzJWrQUax5wLVMNS0+rUPA3k22Ncx4XXZS9o0MBH27Bo6BpNelZpS+/uh9KsNlY6bHCmJU9p8g7m3fVKn28H3KDYA5Pl/T8Z1ptDAVe0lXdQ2YoyyH2uyPIGHBZZIs2pDBS8R07+qN+E7Q==";

    pub(crate) fn cipher() -> EnvelopeCipher {
        EnvelopeCipher::new(EncodingKey::parse(KEY).unwrap())
    }

    #[test]
    fn decrypts_reference_vector() {
        let frame = cipher().decrypt(REST).unwrap();
        assert_eq!(frame.tenant_id, TENANT.as_bytes());
        assert_eq!(frame.message.len(), 277);
        let text = String::from_utf8(frame.message).unwrap();
        assert!(text.contains("<Content><![CDATA[rest]]></Content>"));
    }

    #[test]
    fn decrypts_full_pad_unit_vector() {
        // this vector carries 30 bytes of padding
        let cipher = EnvelopeCipher::new(EncodingKey::parse(OTHER_KEY).unwrap());
        let message = cipher.decrypt_for(OTHER, OTHER_TENANT).unwrap();
        let text = String::from_utf8(message).unwrap();
        assert!(text.contains("<Content><![CDATA[hello]]></Content>"));
        assert!(text.ends_with("</xml>"));
    }

    #[test]
    fn key_prefix_iv_recovers_nonce() {
        let frame = cipher().decrypt(HELLO_BODY).unwrap();
        assert_eq!(&frame.nonce, b"83a58ca034531ca7");
        assert_eq!(frame.message.len(), 271);
    }

    #[test]
    fn decrypts_echostr() {
        let message = cipher().decrypt_for(ECHOSTR, TENANT).unwrap();
        assert_eq!(message, b"4362985891886127916");
    }

    #[test]
    fn round_trip_all_sizes() {
        let cipher = cipher();
        let payload: Vec<u8> = (0..=4096u32).map(|i| (i * 31 % 251) as u8).collect();
        for n in 0..=4096 {
            let ct = cipher.encrypt(&payload[..n], TENANT).unwrap();
            let frame = cipher.decrypt(&ct).unwrap();
            assert_eq!(frame.message, &payload[..n], "size {n}");
            assert_eq!(frame.tenant_id, TENANT.as_bytes(), "size {n}");
        }
    }

    #[test]
    fn length_field_at_boundaries() {
        let cipher = cipher();
        for n in [0usize, 1, 15, 16, 17, 4096] {
            let message = vec![b'x'; n];
            let ct = cipher.encrypt(&message, TENANT).unwrap();
            let raw = STANDARD.decode(&ct).unwrap();
            assert_eq!(raw.len() % PAD_UNIT, 0);

            let mut buf = raw.clone();
            let plain = Aes256CbcDec::new_from_slices(
                cipher.key.as_bytes(),
                cipher.key.iv(),
            )
            .unwrap()
            .decrypt_padded_mut::<NoPadding>(&mut buf)
            .unwrap();
            let declared = u32::from_be_bytes([plain[16], plain[17], plain[18], plain[19]]);
            assert_eq!(declared as usize, n);
            assert_eq!(cipher.decrypt(&ct).unwrap().message.len(), n);
        }
    }

    #[test]
    fn hello_body_round_trip_reports_length() {
        let msg = "<xml>\n<ToUserName><![CDATA[wx2f6d0a549c129f06]]></ToUserName>\n<FromUserName><![CDATA[baim]]></FromUserName>\n<CreateTime>1426498001</CreateTime>\n<MsgType><![CDATA[text]]></MsgType>\n<Content><![CDATA[hello body]]></Content>\n<MsgId>000001</MsgId>\n<AgentID>3</AgentID>\n</xml>";
        let cipher = cipher();
        let ct = cipher.encrypt(msg.as_bytes(), TENANT).unwrap();
        let frame = cipher.decrypt(&ct).unwrap();
        assert_eq!(frame.message.len(), msg.len());
        assert_eq!(frame.message, msg.as_bytes());
    }

    #[test]
    fn nonces_are_fresh() {
        let cipher = cipher();
        let a = cipher.encrypt(b"same", TENANT).unwrap();
        let b = cipher.encrypt(b"same", TENANT).unwrap();
        assert_ne!(a, b);
        assert_ne!(cipher.decrypt(&a).unwrap().nonce, cipher.decrypt(&b).unwrap().nonce);
    }

    #[test]
    fn single_bit_flips_never_reproduce_plaintext() {
        let cipher = cipher();
        let message = b"<xml><Content><![CDATA[flip me]]></Content></xml>";
        let raw = STANDARD.decode(cipher.encrypt(message, TENANT).unwrap()).unwrap();

        for bit in 0..raw.len() * 8 {
            let mut tampered = raw.clone();
            tampered[bit / 8] ^= 1 << (bit % 8);
            let outcome = cipher.decrypt_for(&STANDARD.encode(&tampered), TENANT);
            if let Ok(recovered) = outcome {
                assert_ne!(recovered, message, "bit {bit} reproduced the plaintext");
            }
        }
    }

    #[test]
    fn flipping_last_block_breaks_padding() {
        let cipher = cipher();
        let raw = STANDARD.decode(cipher.encrypt(b"x", TENANT).unwrap()).unwrap();
        // flipping the low bit of the second-to-last block's final byte
        // flips the low bit of the pad length byte
        let mut tampered = raw.clone();
        let idx = raw.len() - BLOCK_LEN - 1;
        tampered[idx] ^= 0x01;
        let err = cipher.decrypt(&STANDARD.encode(&tampered)).unwrap_err();
        assert!(matches!(err, WechatError::PaddingInvalid));
    }

    #[test]
    fn wrong_tenant() {
        let err = cipher().decrypt_for(HELLO_BODY, "wx-someone-else").unwrap_err();
        match err {
            WechatError::TenantMismatch { expected, actual } => {
                assert_eq!(expected, "wx-someone-else");
                assert_eq!(actual, TENANT);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn wrong_key_fails_padding() {
        let cipher = EnvelopeCipher::new(EncodingKey::parse(OTHER_KEY).unwrap());
        assert!(matches!(
            cipher.decrypt(HELLO_BODY),
            Err(WechatError::PaddingInvalid)
        ));
    }

    #[test]
    fn malformed_inputs() {
        let cipher = cipher();
        for input in ["", "!!!not base64!!!", "AAAA", "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA"] {
            assert!(
                matches!(cipher.decrypt(input), Err(WechatError::MalformedCiphertext(_))),
                "input {input:?}"
            );
        }
    }
}
