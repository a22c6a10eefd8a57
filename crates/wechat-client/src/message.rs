//! Outbound (customer service / application) messages.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextContent {
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaContent {
    pub media_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoContent {
    pub media_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumb_media_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Article {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picurl: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewsContent {
    pub articles: Vec<Article>,
}

/// Message body, tagged by `msgtype`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "msgtype", rename_all = "lowercase")]
pub enum OutboundContent {
    Text { text: TextContent },
    Image { image: MediaContent },
    Voice { voice: MediaContent },
    Video { video: VideoContent },
    News { news: NewsContent },
}

/// A message pushed to a user outside the passive reply window.
///
/// Work accounts address users with `|`-separated ids and need `agentid`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboundMessage {
    pub touser: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub toparty: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agentid: Option<i64>,
    #[serde(flatten)]
    pub content: OutboundContent,
}

impl OutboundMessage {
    pub fn text(touser: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            touser: touser.into(),
            toparty: None,
            agentid: None,
            content: OutboundContent::Text {
                text: TextContent {
                    content: content.into(),
                },
            },
        }
    }

    pub fn image(touser: impl Into<String>, media_id: impl Into<String>) -> Self {
        Self {
            touser: touser.into(),
            toparty: None,
            agentid: None,
            content: OutboundContent::Image {
                image: MediaContent {
                    media_id: media_id.into(),
                },
            },
        }
    }

    pub fn with_agent(mut self, agent_id: i64) -> Self {
        self.agentid = Some(agent_id);
        self
    }
}
