//! Custom menu definitions.

use serde::{Deserialize, Serialize};
use wechat_core::{WechatError, WechatResult};

const MAX_TOP_LEVEL: usize = 3;
const MAX_SUB_BUTTONS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Menu {
    pub button: Vec<Button>,
}

/// A menu button. Leaf buttons have a `type`; groups only have `sub_button`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Button {
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_button: Vec<Button>,
}

impl Button {
    fn leaf(kind: &str, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: Some(kind.to_string()),
            key: None,
            url: None,
            sub_button: Vec::new(),
        }
    }

    /// Sends a `CLICK` event carrying `key`.
    pub fn click(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            ..Self::leaf("click", name)
        }
    }

    /// Opens `url`; sends a `VIEW` event.
    pub fn view(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::leaf("view", name)
        }
    }

    /// Any other leaf type keyed by `key` (`scancode_push`, `pic_weixin`, ...).
    pub fn keyed(kind: &str, name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            ..Self::leaf(kind, name)
        }
    }

    pub fn group(name: impl Into<String>, sub_button: Vec<Button>) -> Self {
        Self {
            name: name.into(),
            kind: None,
            key: None,
            url: None,
            sub_button,
        }
    }
}

impl Menu {
    pub fn new(button: Vec<Button>) -> Self {
        Self { button }
    }

    /// Check the platform's size limits before uploading.
    pub fn validate(&self) -> WechatResult<()> {
        if self.button.is_empty() || self.button.len() > MAX_TOP_LEVEL {
            return Err(WechatError::Config(format!(
                "menu needs 1 to {MAX_TOP_LEVEL} top-level buttons, got {}",
                self.button.len()
            )));
        }
        for b in &self.button {
            if b.sub_button.len() > MAX_SUB_BUTTONS {
                return Err(WechatError::Config(format!(
                    "menu group {:?} has {} entries, at most {MAX_SUB_BUTTONS} allowed",
                    b.name,
                    b.sub_button.len()
                )));
            }
            if b.kind.is_none() && b.sub_button.is_empty() {
                return Err(WechatError::Config(format!(
                    "menu button {:?} has neither a type nor sub buttons",
                    b.name
                )));
            }
        }
        Ok(())
    }
}
