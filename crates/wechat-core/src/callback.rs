//! The inbound/outbound callback pipeline for one account.
//!
//! ```text
//! GET  ?signature|msg_signature&timestamp&nonce&echostr   -> verify_url
//! POST ?msg_signature&timestamp&nonce&encrypt_type=aes    -> open -> Message
//!      reply payload                                      -> seal -> response body
//! ```

use crate::cipher::EnvelopeCipher;
use crate::envelope::{Envelope, ResponseEnvelope};
use crate::error::{WechatError, WechatResult};
use crate::key::EncodingKey;
use crate::messages::Message;
use crate::parse;
use crate::reply::{unix_now, Reply};
use crate::signature;
use ring::rand::{SecureRandom, SystemRandom};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Which flavor of the platform the account lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Official (public) accounts. Handshake echoes `echostr` verbatim.
    Official,
    /// Work (enterprise) accounts. Every callback is encrypted.
    Work,
}

impl FromStr for Platform {
    type Err = WechatError;
    fn from_str(s: &str) -> WechatResult<Self> {
        match s {
            "official" => Ok(Self::Official),
            "work" => Ok(Self::Work),
            other => Err(WechatError::Config(format!("unknown platform: {other}"))),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Official => "official",
            Self::Work => "work",
        })
    }
}

/// Message encryption setting of an official account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurityMode {
    /// Cleartext only.
    Plaintext,
    /// Cleartext and encrypted callbacks both accepted.
    Compatible,
    /// Encrypted callbacks only.
    #[default]
    Safe,
}

impl FromStr for SecurityMode {
    type Err = WechatError;
    fn from_str(s: &str) -> WechatResult<Self> {
        match s {
            "plaintext" => Ok(Self::Plaintext),
            "compatible" => Ok(Self::Compatible),
            "safe" => Ok(Self::Safe),
            other => Err(WechatError::Config(format!("unknown security mode: {other}"))),
        }
    }
}

/// Query string of a callback request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CallbackQuery {
    #[serde(default)]
    pub signature: Option<String>,
    #[serde(default)]
    pub msg_signature: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub nonce: Option<String>,
    #[serde(default)]
    pub echostr: Option<String>,
    #[serde(default)]
    pub encrypt_type: Option<String>,
}

fn required<'a>(value: &'a Option<String>, name: &'static str) -> WechatResult<&'a str> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or(WechatError::MissingParameter(name))
}

/// Account configuration plus the codec. Read-only; share behind an `Arc`.
#[derive(Debug, Clone)]
pub struct CallbackHandler {
    platform: Platform,
    tenant_id: String,
    token: String,
    mode: SecurityMode,
    cipher: Option<EnvelopeCipher>,
    rng: SystemRandom,
}

impl CallbackHandler {
    /// `tenant_id` is the app id (official) or corp id (work).
    ///
    /// An `encoding_aes_key` is required unless the account runs in
    /// [`SecurityMode::Plaintext`]; work accounts always need one.
    pub fn new(
        platform: Platform,
        tenant_id: impl Into<String>,
        token: impl Into<String>,
        encoding_aes_key: Option<&str>,
        mode: SecurityMode,
    ) -> WechatResult<Self> {
        let mode = match platform {
            Platform::Work => SecurityMode::Safe,
            Platform::Official => mode,
        };
        let cipher = match encoding_aes_key.map(str::trim).filter(|k| !k.is_empty()) {
            Some(key) => Some(EnvelopeCipher::new(EncodingKey::parse(key)?)),
            None if mode == SecurityMode::Plaintext => None,
            None => {
                return Err(WechatError::Config(format!(
                    "encoding_aes_key is required for {platform} accounts in {mode:?} mode"
                )))
            }
        };
        let token = token.into();
        if token.is_empty() {
            return Err(WechatError::Config("token must not be empty".into()));
        }

        Ok(Self {
            platform,
            tenant_id: tenant_id.into(),
            token,
            mode,
            cipher,
            rng: SystemRandom::new(),
        })
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    pub fn mode(&self) -> SecurityMode {
        self.mode
    }

    fn cipher(&self) -> WechatResult<&EnvelopeCipher> {
        self.cipher
            .as_ref()
            .ok_or_else(|| WechatError::Config("no encoding_aes_key configured".into()))
    }

    /// Whether a request with this query carries an encrypted body.
    pub fn is_encrypted(&self, query: &CallbackQuery) -> bool {
        self.platform == Platform::Work || query.encrypt_type.as_deref() == Some("aes")
    }

    /// Answer the URL verification handshake. Returns the response body.
    pub fn verify_url(&self, query: &CallbackQuery) -> WechatResult<String> {
        let timestamp = required(&query.timestamp, "timestamp")?;
        let nonce = required(&query.nonce, "nonce")?;
        let echostr = required(&query.echostr, "echostr")?;

        match self.platform {
            Platform::Official => {
                let sig = required(&query.signature, "signature")?;
                if !signature::validate(sig, &[self.token.as_str(), timestamp, nonce]) {
                    return Err(WechatError::SignatureMismatch);
                }
                Ok(echostr.to_string())
            }
            Platform::Work => {
                let sig = required(&query.msg_signature, "msg_signature")?;
                if !signature::validate(sig, &[self.token.as_str(), timestamp, nonce, echostr]) {
                    return Err(WechatError::SignatureMismatch);
                }
                let message = self.cipher()?.decrypt_for(echostr, &self.tenant_id)?;
                String::from_utf8(message).map_err(|_| {
                    WechatError::MalformedCiphertext("echostr payload is not utf-8".into())
                })
            }
        }
    }

    /// Authenticate and, when encrypted, decrypt a callback body. Returns the plaintext XML.
    pub fn open_raw(&self, query: &CallbackQuery, body: &str) -> WechatResult<String> {
        let timestamp = required(&query.timestamp, "timestamp")?;
        let nonce = required(&query.nonce, "nonce")?;

        if !self.is_encrypted(query) {
            if self.mode == SecurityMode::Safe {
                return Err(WechatError::CleartextRejected);
            }
            let sig = required(&query.signature, "signature")?;
            if !signature::validate(sig, &[self.token.as_str(), timestamp, nonce]) {
                return Err(WechatError::SignatureMismatch);
            }
            return Ok(body.to_string());
        }

        let sig = required(&query.msg_signature, "msg_signature")?;
        let envelope = Envelope::parse(body)?;
        if !signature::validate(sig, &[self.token.as_str(), timestamp, nonce, &envelope.encrypt]) {
            return Err(WechatError::SignatureMismatch);
        }
        let message = self.cipher()?.decrypt_for(&envelope.encrypt, &self.tenant_id)?;
        Ok(String::from_utf8(message)?)
    }

    /// [`open_raw`](Self::open_raw), then probe and parse.
    pub fn open(&self, query: &CallbackQuery, body: &str) -> WechatResult<Message> {
        parse::parse(&self.open_raw(query, body)?)
    }

    /// Build the response body for `payload`: encrypted when the request
    /// was, unchanged otherwise.
    pub fn seal(&self, query: &CallbackQuery, payload: &str) -> WechatResult<String> {
        if !self.is_encrypted(query) {
            return Ok(payload.to_string());
        }
        let nonce = self.fresh_nonce()?;
        self.seal_with(payload, unix_now(), &nonce)
    }

    /// Encrypt and sign `payload` with an explicit timestamp and nonce.
    pub fn seal_with(&self, payload: &str, timestamp: u64, nonce: &str) -> WechatResult<String> {
        let encrypt = self.cipher()?.encrypt(payload.as_bytes(), &self.tenant_id)?;
        let timestamp_text = timestamp.to_string();
        let msg_signature = signature::sign(&[self.token.as_str(), &timestamp_text, nonce, &encrypt]);
        ResponseEnvelope {
            encrypt,
            msg_signature,
            timestamp,
            nonce: nonce.to_string(),
        }
        .to_xml()
    }

    /// Serialize and [`seal`](Self::seal) a passive reply.
    pub fn reply(&self, query: &CallbackQuery, reply: &Reply) -> WechatResult<String> {
        self.seal(query, &reply.to_xml()?)
    }

    fn fresh_nonce(&self) -> WechatResult<String> {
        let mut raw = [0u8; 8];
        self.rng
            .fill(&mut raw)
            .map_err(|_| WechatError::InsufficientRandomness)?;
        Ok(hex::encode(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher::tests::{cipher, ECHOSTR, HELLO_BODY, KEY, TENANT};
    use crate::messages::MessageKind;

    const TOKEN: &str = "wechat4go";

    fn work() -> CallbackHandler {
        CallbackHandler::new(Platform::Work, TENANT, TOKEN, Some(KEY), SecurityMode::Safe).unwrap()
    }

    fn official(mode: SecurityMode) -> CallbackHandler {
        CallbackHandler::new(Platform::Official, TENANT, TOKEN, Some(KEY), mode).unwrap()
    }

    fn query(pairs: &[(&str, &str)]) -> CallbackQuery {
        let mut q = CallbackQuery::default();
        for &(k, v) in pairs {
            let v = Some(v.to_string());
            match k {
                "signature" => q.signature = v,
                "msg_signature" => q.msg_signature = v,
                "timestamp" => q.timestamp = v,
                "nonce" => q.nonce = v,
                "echostr" => q.echostr = v,
                "encrypt_type" => q.encrypt_type = v,
                _ => unreachable!("{k}"),
            }
        }
        q
    }

    fn encrypted_body(ciphertext: &str) -> String {
        Envelope {
            to_user_name: TENANT.into(),
            agent_id: Some("3".into()),
            encrypt: ciphertext.into(),
        }
        .to_xml()
        .unwrap()
    }

    #[test]
    fn work_handshake_decrypts_echostr() {
        let q = query(&[
            ("msg_signature", "61b23841affc32e28a339764e43a9679f38ad17d"),
            ("timestamp", "1426129452"),
            ("nonce", "1019369511"),
            ("echostr", ECHOSTR),
        ]);
        assert_eq!(work().verify_url(&q).unwrap(), "4362985891886127916");
    }

    #[test]
    fn work_handshake_checks_signature_and_tenant() {
        let mut q = query(&[
            ("msg_signature", "61b23841affc32e28a339764e43a9679f38ad17e"),
            ("timestamp", "1426129452"),
            ("nonce", "1019369511"),
            ("echostr", ECHOSTR),
        ]);
        assert!(matches!(work().verify_url(&q), Err(WechatError::SignatureMismatch)));

        q.msg_signature = Some("61b23841affc32e28a339764e43a9679f38ad17d".into());
        let other =
            CallbackHandler::new(Platform::Work, "wx-other", TOKEN, Some(KEY), SecurityMode::Safe)
                .unwrap();
        assert!(matches!(
            other.verify_url(&q),
            Err(WechatError::TenantMismatch { .. })
        ));
    }

    #[test]
    fn official_handshake_echoes() {
        let q = query(&[
            ("signature", "78d6123977c8e5ecb255b74ecef385c5a1b5823f"),
            ("timestamp", "1426139593"),
            ("nonce", "1326298654"),
            ("echostr", "5837397520665436492"),
        ]);
        let handler = official(SecurityMode::Plaintext);
        assert_eq!(handler.verify_url(&q).unwrap(), "5837397520665436492");

        let mut bad = q.clone();
        bad.timestamp = Some("1426139594".into());
        assert!(matches!(handler.verify_url(&bad), Err(WechatError::SignatureMismatch)));
    }

    #[test]
    fn handshake_requires_parameters() {
        let q = query(&[("signature", "x"), ("timestamp", "1"), ("nonce", "2")]);
        assert!(matches!(
            official(SecurityMode::Safe).verify_url(&q),
            Err(WechatError::MissingParameter("echostr"))
        ));
        let q = query(&[("timestamp", "1"), ("nonce", "2"), ("echostr", "e")]);
        assert!(matches!(
            work().verify_url(&q),
            Err(WechatError::MissingParameter("msg_signature"))
        ));
    }

    #[test]
    fn opens_encrypted_callback() {
        let (timestamp, nonce) = ("1426498001", "1580437497");
        let sig = signature::sign(&[TOKEN, timestamp, nonce, HELLO_BODY]);
        let q = query(&[
            ("msg_signature", sig.as_str()),
            ("timestamp", timestamp),
            ("nonce", nonce),
            ("encrypt_type", "aes"),
        ]);
        let msg = official(SecurityMode::Safe)
            .open(&q, &encrypted_body(HELLO_BODY))
            .unwrap();
        let Message::Text(text) = msg else { panic!() };
        assert_eq!(text.body.content, "hello body");

        // work accounts need no encrypt_type
        let mut q = q;
        q.encrypt_type = None;
        let msg = work().open(&q, &encrypted_body(HELLO_BODY)).unwrap();
        assert_eq!(msg.kind(), MessageKind::Text);
    }

    #[test]
    fn encrypted_callback_rejects_tampering() {
        let sig = signature::sign(&[TOKEN, "1", "2", HELLO_BODY]);
        let q = query(&[("msg_signature", sig.as_str()), ("timestamp", "1"), ("nonce", "3")]);
        assert!(matches!(
            work().open(&q, &encrypted_body(HELLO_BODY)),
            Err(WechatError::SignatureMismatch)
        ));

        let q = query(&[("msg_signature", sig.as_str()), ("timestamp", "1"), ("nonce", "2")]);
        assert!(matches!(
            work().open(&q, "<xml><ToUserName>x</ToUserName></xml>"),
            Err(WechatError::XmlMalformed(_))
        ));
    }

    #[test]
    fn cleartext_callbacks_follow_mode() {
        let body = "<xml><ToUserName><![CDATA[gh_account]]></ToUserName>\
                    <FromUserName><![CDATA[user]]></FromUserName>\
                    <CreateTime>1</CreateTime><MsgType><![CDATA[event]]></MsgType>\
                    <Event><![CDATA[subscribe]]></Event></xml>";
        let q = query(&[
            ("signature", "78d6123977c8e5ecb255b74ecef385c5a1b5823f"),
            ("timestamp", "1426139593"),
            ("nonce", "1326298654"),
        ]);

        for mode in [SecurityMode::Plaintext, SecurityMode::Compatible] {
            let msg = official(mode).open(&q, body).unwrap();
            assert_eq!(msg.kind(), MessageKind::Subscribe);
        }
        assert!(matches!(
            official(SecurityMode::Safe).open(&q, body),
            Err(WechatError::CleartextRejected)
        ));

        // cleartext replies pass through
        let handler = official(SecurityMode::Compatible);
        assert_eq!(handler.seal(&q, "<xml/>").unwrap(), "<xml/>");
    }

    #[test]
    fn sealed_reply_verifies_and_decrypts() {
        let handler = work();
        let payload = "<xml><Content><![CDATA[pong]]></Content></xml>";
        let body = handler.seal_with(payload, 1409659813, "1372623149").unwrap();

        let env = ResponseEnvelope::parse(&body).unwrap();
        assert_eq!(env.timestamp, 1409659813);
        assert_eq!(env.nonce, "1372623149");
        assert!(signature::validate(
            &env.msg_signature,
            &[TOKEN, "1409659813", "1372623149", &env.encrypt]
        ));
        let message = cipher().decrypt_for(&env.encrypt, TENANT).unwrap();
        assert_eq!(message, payload.as_bytes());
    }

    #[test]
    fn seal_uses_fresh_nonce() {
        let handler = work();
        let q = CallbackQuery::default();
        let a = ResponseEnvelope::parse(&handler.seal(&q, "<xml/>").unwrap()).unwrap();
        let b = ResponseEnvelope::parse(&handler.seal(&q, "<xml/>").unwrap()).unwrap();
        assert_eq!(a.nonce.len(), 16);
        assert_ne!(a.nonce, b.nonce);
    }

    #[test]
    fn constructor_checks_configuration() {
        assert!(matches!(
            CallbackHandler::new(Platform::Work, TENANT, TOKEN, None, SecurityMode::Plaintext),
            Err(WechatError::Config(_))
        ));
        assert!(matches!(
            CallbackHandler::new(Platform::Official, TENANT, TOKEN, None, SecurityMode::Compatible),
            Err(WechatError::Config(_))
        ));
        assert!(matches!(
            CallbackHandler::new(Platform::Official, TENANT, TOKEN, Some("short"), SecurityMode::Safe),
            Err(WechatError::KeyEncoding(_) | WechatError::KeyLengthInvalid(_))
        ));
        assert!(matches!(
            CallbackHandler::new(Platform::Official, TENANT, "", None, SecurityMode::Plaintext),
            Err(WechatError::Config(_))
        ));

        let plain =
            CallbackHandler::new(Platform::Official, TENANT, TOKEN, None, SecurityMode::Plaintext)
                .unwrap();
        assert!(matches!(
            plain.seal_with("<xml/>", 1, "n"),
            Err(WechatError::Config(_))
        ));
        assert_eq!(work().mode(), SecurityMode::Safe);
    }

    #[test]
    fn mode_and_platform_from_str() {
        assert_eq!("work".parse::<Platform>().unwrap(), Platform::Work);
        assert_eq!("compatible".parse::<SecurityMode>().unwrap(), SecurityMode::Compatible);
        assert!("enterprise".parse::<Platform>().is_err());
        assert_eq!(Platform::Official.to_string(), "official");
    }
}
