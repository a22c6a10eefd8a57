//! Rule-based auto-replies.

use crate::config::ReplySection;
use wechat_core::{Message, Reply};

/// Picks a passive reply for an inbound message, if any.
#[derive(Debug, Clone)]
pub struct AutoReply {
    welcome: String,
    echo: bool,
}

impl AutoReply {
    pub fn new(config: &ReplySection) -> Self {
        Self {
            welcome: config.welcome.clone(),
            echo: config.echo,
        }
    }

    pub fn respond(&self, message: &Message) -> Option<Reply> {
        let text = match message {
            Message::Subscribe(_) => self.welcome.clone(),
            Message::ScanSubscribe(m) => format!("{} (scene {})", self.welcome, m.body.scene()),
            Message::Text(m) if self.echo => m.body.content.clone(),
            Message::VoiceRecognition(m) if self.echo => m.body.recognition.clone(),
            Message::Location(m) => format!(
                "Location received: {:.6}, {:.6} {}",
                m.body.latitude, m.body.longitude, m.body.label
            )
            .trim_end()
            .to_string(),
            Message::MenuClick(m) => format!("You clicked {}", m.body.event_key),
            _ => return None,
        };
        Some(Reply::text(message, text))
    }
}
