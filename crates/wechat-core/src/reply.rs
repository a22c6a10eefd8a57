//! Passive replies: the XML a callback handler returns in its HTTP response.

use crate::envelope::XmlWriter;
use crate::error::WechatResult;
use crate::messages::Message;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyContent {
    Text {
        content: String,
    },
    Image {
        media_id: String,
    },
    Voice {
        media_id: String,
    },
    Video {
        media_id: String,
        title: String,
        description: String,
    },
}

impl ReplyContent {
    pub fn msg_type(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::Image { .. } => "image",
            Self::Voice { .. } => "voice",
            Self::Video { .. } => "video",
        }
    }
}

/// A reply addressed back to the sender of an inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub to_user: String,
    pub from_user: String,
    pub create_time: u64,
    pub content: ReplyContent,
}

impl Reply {
    /// Reply to `message`, swapping sender and receiver, stamped with the current time.
    pub fn to(message: &Message, content: ReplyContent) -> Self {
        let header = message.header();
        Self {
            to_user: header.from_user_name.clone(),
            from_user: header.to_user_name.clone(),
            create_time: unix_now(),
            content,
        }
    }

    pub fn text(message: &Message, content: impl Into<String>) -> Self {
        Self::to(
            message,
            ReplyContent::Text {
                content: content.into(),
            },
        )
    }

    pub fn to_xml(&self) -> WechatResult<String> {
        let mut w = XmlWriter::new()?;
        w.cdata("ToUserName", &self.to_user)?;
        w.cdata("FromUserName", &self.from_user)?;
        w.text("CreateTime", &self.create_time.to_string())?;
        w.cdata("MsgType", self.content.msg_type())?;

        match &self.content {
            ReplyContent::Text { content } => w.cdata("Content", content)?,
            ReplyContent::Image { media_id } => {
                w.open("Image")?;
                w.cdata("MediaId", media_id)?;
                w.close("Image")?;
            }
            ReplyContent::Voice { media_id } => {
                w.open("Voice")?;
                w.cdata("MediaId", media_id)?;
                w.close("Voice")?;
            }
            ReplyContent::Video {
                media_id,
                title,
                description,
            } => {
                w.open("Video")?;
                w.cdata("MediaId", media_id)?;
                w.cdata("Title", title)?;
                w.cdata("Description", description)?;
                w.close("Video")?;
            }
        }
        w.finish()
    }
}

pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
