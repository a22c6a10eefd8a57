//! wechat-client: HTTP wrappers for the WeChat platform APIs.
//!
//! Access tokens, OAuth web auth, outbound messages and menu creation for
//! official and work accounts. Each call is a single request; callers own
//! token caching and retry policy.

pub mod api;
pub mod client;
pub mod menu;
pub mod message;

pub use api::{AccessToken, ApiStatus, Endpoints, WebAuth};
pub use client::Client;
pub use menu::{Button, Menu};
pub use message::{OutboundContent, OutboundMessage};
