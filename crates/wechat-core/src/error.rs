use thiserror::Error;

/// Errors produced by the callback codec and the API wrappers built on it.
#[derive(Debug, Error)]
pub enum WechatError {
    #[error("signature mismatch")]
    SignatureMismatch,

    #[error("malformed ciphertext: {0}")]
    MalformedCiphertext(String),

    #[error("invalid PKCS#7 padding")]
    PaddingInvalid,

    #[error("tenant mismatch: expected {expected}, got {actual}")]
    TenantMismatch { expected: String, actual: String },

    #[error("unknown message type: {0}")]
    UnknownMessageType(String),

    #[error("unknown event type: {0}")]
    UnknownEventType(String),

    #[error("malformed xml: {0}")]
    XmlMalformed(String),

    #[error("secure random source could not supply enough bytes")]
    InsufficientRandomness,

    #[error("invalid key length: expected 32 bytes, got {0}")]
    KeyLengthInvalid(usize),

    #[error("invalid key encoding: {0}")]
    KeyEncoding(String),

    #[error("missing parameter: {0}")]
    MissingParameter(&'static str),

    #[error("cleartext callbacks are disabled for this account")]
    CleartextRejected,

    #[error("http error: {0}")]
    Http(String),

    #[error("api error {code}: {message}")]
    Api { code: i64, message: String },

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl WechatError {
    /// Whether this error only means the platform sent a message or event
    /// shape we do not model. Such callbacks should be acknowledged, not failed.
    pub fn is_unrecognized(&self) -> bool {
        matches!(
            self,
            WechatError::UnknownMessageType(_) | WechatError::UnknownEventType(_)
        )
    }
}

impl From<quick_xml::DeError> for WechatError {
    fn from(e: quick_xml::DeError) -> Self {
        WechatError::XmlMalformed(e.to_string())
    }
}

impl From<quick_xml::Error> for WechatError {
    fn from(e: quick_xml::Error) -> Self {
        WechatError::XmlMalformed(e.to_string())
    }
}

impl From<std::str::Utf8Error> for WechatError {
    fn from(e: std::str::Utf8Error) -> Self {
        WechatError::XmlMalformed(format!("payload is not utf-8: {e}"))
    }
}

impl From<std::string::FromUtf8Error> for WechatError {
    fn from(e: std::string::FromUtf8Error) -> Self {
        WechatError::XmlMalformed(format!("payload is not utf-8: {e}"))
    }
}

pub type WechatResult<T> = Result<T, WechatError>;
