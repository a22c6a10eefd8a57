//! Inbound message and event types.
//!
//! Tag mapping (`MsgType` / `Event` element → variant):
//!
//! | MsgType      | Event                | Variant                                   |
//! |--------------|----------------------|-------------------------------------------|
//! | `text`       |                      | [`Message::Text`]                         |
//! | `image`      |                      | [`Message::Image`]                        |
//! | `voice`      |                      | [`Message::Voice`] / [`Message::VoiceRecognition`] |
//! | `video`      |                      | [`Message::Video`]                        |
//! | `shortvideo` |                      | [`Message::ShortVideo`]                   |
//! | `location`   |                      | [`Message::Location`]                     |
//! | `link`       |                      | [`Message::Link`]                         |
//! | `event`      | `subscribe`          | [`Message::Subscribe`] / [`Message::ScanSubscribe`] |
//! | `event`      | `unsubscribe`        | [`Message::Unsubscribe`]                  |
//! | `event`      | `SCAN`               | [`Message::Scan`]                         |
//! | `event`      | `LOCATION`           | [`Message::LocationReport`]               |
//! | `event`      | `CLICK` / `click`    | [`Message::MenuClick`]                    |
//! | `event`      | `VIEW` / `view`      | [`Message::MenuView`]                     |
//! | `event`      | `enter_agent`        | [`Message::EnterAgent`]                   |
//! | `event`      | `scancode_push`      | [`Message::ScanCodePush`]                 |
//! | `event`      | `scancode_waitmsg`   | [`Message::ScanCodeWait`]                 |
//! | `event`      | `pic_sysphoto`       | [`Message::PicSysPhoto`]                  |
//! | `event`      | `pic_photo_or_album` | [`Message::PicAlbum`]                     |
//! | `event`      | `pic_weixin`         | [`Message::PicWeChat`]                    |
//! | `event`      | `location_select`    | [`Message::LocationSelect`]               |

use serde::Deserialize;

/// `MsgType` element values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MsgType {
    Text,
    Image,
    Voice,
    Video,
    ShortVideo,
    Location,
    Link,
    Event,
}

impl MsgType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Voice => "voice",
            Self::Video => "video",
            Self::ShortVideo => "shortvideo",
            Self::Location => "location",
            Self::Link => "link",
            Self::Event => "event",
        }
    }
}

impl TryFrom<&str> for MsgType {
    type Error = String;
    fn try_from(v: &str) -> Result<Self, String> {
        match v {
            "text" => Ok(Self::Text),
            "image" => Ok(Self::Image),
            "voice" => Ok(Self::Voice),
            "video" => Ok(Self::Video),
            "shortvideo" => Ok(Self::ShortVideo),
            "location" => Ok(Self::Location),
            "link" => Ok(Self::Link),
            "event" => Ok(Self::Event),
            _ => Err(v.to_string()),
        }
    }
}

/// `Event` element values for `MsgType = event`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    Subscribe,
    Unsubscribe,
    Scan,
    Location,
    Click,
    View,
    EnterAgent,
    ScanCodePush,
    ScanCodeWaitMsg,
    PicSysPhoto,
    PicPhotoOrAlbum,
    PicWeixin,
    LocationSelect,
}

impl EventType {
    /// Canonical tag as sent to official accounts.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Subscribe => "subscribe",
            Self::Unsubscribe => "unsubscribe",
            Self::Scan => "SCAN",
            Self::Location => "LOCATION",
            Self::Click => "CLICK",
            Self::View => "VIEW",
            Self::EnterAgent => "enter_agent",
            Self::ScanCodePush => "scancode_push",
            Self::ScanCodeWaitMsg => "scancode_waitmsg",
            Self::PicSysPhoto => "pic_sysphoto",
            Self::PicPhotoOrAlbum => "pic_photo_or_album",
            Self::PicWeixin => "pic_weixin",
            Self::LocationSelect => "location_select",
        }
    }
}

impl TryFrom<&str> for EventType {
    type Error = String;
    fn try_from(v: &str) -> Result<Self, String> {
        match v {
            "subscribe" => Ok(Self::Subscribe),
            "unsubscribe" => Ok(Self::Unsubscribe),
            "SCAN" => Ok(Self::Scan),
            "LOCATION" => Ok(Self::Location),
            // work accounts send menu events in lowercase
            "CLICK" | "click" => Ok(Self::Click),
            "VIEW" | "view" => Ok(Self::View),
            "enter_agent" => Ok(Self::EnterAgent),
            "scancode_push" => Ok(Self::ScanCodePush),
            "scancode_waitmsg" => Ok(Self::ScanCodeWaitMsg),
            "pic_sysphoto" => Ok(Self::PicSysPhoto),
            "pic_photo_or_album" => Ok(Self::PicPhotoOrAlbum),
            "pic_weixin" => Ok(Self::PicWeixin),
            "location_select" => Ok(Self::LocationSelect),
            _ => Err(v.to_string()),
        }
    }
}

/// Prefix on `EventKey` of a subscribe event triggered by a QR code scan.
pub const QR_SCENE_PREFIX: &str = "qrscene_";

/// Discriminant of [`Message`]; the output of the type probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Text,
    Image,
    Voice,
    VoiceRecognition,
    Video,
    ShortVideo,
    Location,
    Link,
    Subscribe,
    Unsubscribe,
    ScanSubscribe,
    Scan,
    LocationReport,
    MenuClick,
    MenuView,
    EnterAgent,
    ScanCodePush,
    ScanCodeWait,
    PicSysPhoto,
    PicAlbum,
    PicWeChat,
    LocationSelect,
}

impl MessageKind {
    pub fn is_event(self) -> bool {
        !matches!(
            self,
            Self::Text
                | Self::Image
                | Self::Voice
                | Self::VoiceRecognition
                | Self::Video
                | Self::ShortVideo
                | Self::Location
                | Self::Link
        )
    }
}

// ── Common header ─────────────────────────────────────────────────────

/// Fields every inbound message and event carries.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Header {
    /// Receiver: the account's own id.
    #[serde(rename = "ToUserName")]
    pub to_user_name: String,
    /// Sender: the user's open id (or user id on work accounts).
    #[serde(rename = "FromUserName")]
    pub from_user_name: String,
    #[serde(rename = "CreateTime")]
    pub create_time: u64,
    /// The raw `MsgType` tag.
    #[serde(rename = "MsgType")]
    pub msg_type: String,
    /// Work accounts only.
    #[serde(rename = "AgentID", default)]
    pub agent_id: Option<String>,
}

/// A message or event with a body beyond the header.
#[derive(Debug, Clone, PartialEq)]
pub struct Received<B> {
    pub header: Header,
    pub body: B,
}

// ── Message bodies ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TextBody {
    #[serde(rename = "Content")]
    pub content: String,
    #[serde(rename = "MsgId", default)]
    pub msg_id: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ImageBody {
    #[serde(rename = "PicUrl", default)]
    pub pic_url: String,
    #[serde(rename = "MediaId")]
    pub media_id: String,
    #[serde(rename = "MsgId", default)]
    pub msg_id: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VoiceBody {
    #[serde(rename = "MediaId")]
    pub media_id: String,
    #[serde(rename = "Format", default)]
    pub format: String,
    #[serde(rename = "MsgId", default)]
    pub msg_id: u64,
}

/// Voice message with the platform's speech-to-text result.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VoiceRecognitionBody {
    #[serde(rename = "MediaId")]
    pub media_id: String,
    #[serde(rename = "Format", default)]
    pub format: String,
    #[serde(rename = "Recognition")]
    pub recognition: String,
    #[serde(rename = "MsgId", default)]
    pub msg_id: u64,
}

/// Shared by `video` and `shortvideo`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VideoBody {
    #[serde(rename = "MediaId")]
    pub media_id: String,
    #[serde(rename = "ThumbMediaId", default)]
    pub thumb_media_id: String,
    #[serde(rename = "MsgId", default)]
    pub msg_id: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LocationBody {
    #[serde(rename = "Location_X")]
    pub latitude: f64,
    #[serde(rename = "Location_Y")]
    pub longitude: f64,
    #[serde(rename = "Scale", default)]
    pub scale: u32,
    #[serde(rename = "Label", default)]
    pub label: String,
    #[serde(rename = "MsgId", default)]
    pub msg_id: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LinkBody {
    #[serde(rename = "Title", default)]
    pub title: String,
    #[serde(rename = "Description", default)]
    pub description: String,
    #[serde(rename = "Url")]
    pub url: String,
    #[serde(rename = "MsgId", default)]
    pub msg_id: u64,
}

// ── Event bodies ──────────────────────────────────────────────────────

/// QR code scene: `subscribe` with a `qrscene_` key, or `SCAN`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SceneBody {
    #[serde(rename = "EventKey")]
    pub event_key: String,
    #[serde(rename = "Ticket", default)]
    pub ticket: String,
}

impl SceneBody {
    /// The scene value with any `qrscene_` prefix removed.
    pub fn scene(&self) -> &str {
        self.event_key
            .strip_prefix(QR_SCENE_PREFIX)
            .unwrap_or(&self.event_key)
    }
}

/// Periodic location report (`LOCATION` event).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LocationReportBody {
    #[serde(rename = "Latitude")]
    pub latitude: f64,
    #[serde(rename = "Longitude")]
    pub longitude: f64,
    #[serde(rename = "Precision", default)]
    pub precision: f64,
}

/// Menu click / view and agent entry: the menu key or URL.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MenuBody {
    #[serde(rename = "EventKey", default)]
    pub event_key: String,
}

// ── The sum type ──────────────────────────────────────────────────────

/// A fully parsed inbound callback payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Text(Received<TextBody>),
    Image(Received<ImageBody>),
    Voice(Received<VoiceBody>),
    VoiceRecognition(Received<VoiceRecognitionBody>),
    Video(Received<VideoBody>),
    ShortVideo(Received<VideoBody>),
    Location(Received<LocationBody>),
    Link(Received<LinkBody>),
    Subscribe(Header),
    Unsubscribe(Header),
    ScanSubscribe(Received<SceneBody>),
    Scan(Received<SceneBody>),
    LocationReport(Received<LocationReportBody>),
    MenuClick(Received<MenuBody>),
    MenuView(Received<MenuBody>),
    EnterAgent(Received<MenuBody>),
    ScanCodePush(Header),
    ScanCodeWait(Header),
    PicSysPhoto(Header),
    PicAlbum(Header),
    PicWeChat(Header),
    LocationSelect(Header),
}

impl Message {
    pub fn header(&self) -> &Header {
        match self {
            Self::Text(m) => &m.header,
            Self::Image(m) => &m.header,
            Self::Voice(m) => &m.header,
            Self::VoiceRecognition(m) => &m.header,
            Self::Video(m) | Self::ShortVideo(m) => &m.header,
            Self::Location(m) => &m.header,
            Self::Link(m) => &m.header,
            Self::ScanSubscribe(m) | Self::Scan(m) => &m.header,
            Self::LocationReport(m) => &m.header,
            Self::MenuClick(m) | Self::MenuView(m) | Self::EnterAgent(m) => &m.header,
            Self::Subscribe(h)
            | Self::Unsubscribe(h)
            | Self::ScanCodePush(h)
            | Self::ScanCodeWait(h)
            | Self::PicSysPhoto(h)
            | Self::PicAlbum(h)
            | Self::PicWeChat(h)
            | Self::LocationSelect(h) => h,
        }
    }

    pub fn kind(&self) -> MessageKind {
        match self {
            Self::Text(_) => MessageKind::Text,
            Self::Image(_) => MessageKind::Image,
            Self::Voice(_) => MessageKind::Voice,
            Self::VoiceRecognition(_) => MessageKind::VoiceRecognition,
            Self::Video(_) => MessageKind::Video,
            Self::ShortVideo(_) => MessageKind::ShortVideo,
            Self::Location(_) => MessageKind::Location,
            Self::Link(_) => MessageKind::Link,
            Self::Subscribe(_) => MessageKind::Subscribe,
            Self::Unsubscribe(_) => MessageKind::Unsubscribe,
            Self::ScanSubscribe(_) => MessageKind::ScanSubscribe,
            Self::Scan(_) => MessageKind::Scan,
            Self::LocationReport(_) => MessageKind::LocationReport,
            Self::MenuClick(_) => MessageKind::MenuClick,
            Self::MenuView(_) => MessageKind::MenuView,
            Self::EnterAgent(_) => MessageKind::EnterAgent,
            Self::ScanCodePush(_) => MessageKind::ScanCodePush,
            Self::ScanCodeWait(_) => MessageKind::ScanCodeWait,
            Self::PicSysPhoto(_) => MessageKind::PicSysPhoto,
            Self::PicAlbum(_) => MessageKind::PicAlbum,
            Self::PicWeChat(_) => MessageKind::PicWeChat,
            Self::LocationSelect(_) => MessageKind::LocationSelect,
        }
    }

    /// Sender id.
    pub fn from_user(&self) -> &str {
        &self.header().from_user_name
    }

    /// Receiver id.
    pub fn to_user(&self) -> &str {
        &self.header().to_user_name
    }
}
