//! wechat-core: Secure callback codec for WeChat official and work accounts.
//!
//! Provides SHA-1 callback signatures, the AES-256-CBC envelope cipher and
//! its plaintext framing, the probe-then-parse message decoder, passive reply
//! serialization, and the per-account callback pipeline tying them together.

pub mod callback;
pub mod cipher;
pub mod envelope;
pub mod error;
pub mod frame;
pub mod key;
pub mod messages;
pub mod parse;
pub mod reply;
pub mod signature;

// Re-export commonly used items at crate root.
pub use callback::{CallbackHandler, CallbackQuery, Platform, SecurityMode};
pub use cipher::EnvelopeCipher;
pub use envelope::{Envelope, ResponseEnvelope};
pub use error::{WechatError, WechatResult};
pub use frame::Frame;
pub use key::EncodingKey;
pub use messages::{EventType, Header, Message, MessageKind, MsgType, Received};
pub use parse::{parse, probe};
pub use reply::{Reply, ReplyContent};
