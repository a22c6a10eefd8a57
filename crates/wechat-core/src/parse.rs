//! Type probe and variant parser.
//!
//! Decoding happens twice: a shallow pass reads only the discriminating
//! fields to pick a [`MessageKind`], then the payload is decoded again into
//! the chosen variant's body.

use crate::error::{WechatError, WechatResult};
use crate::messages::{
    EventType, Header, Message, MessageKind, MsgType, Received, QR_SCENE_PREFIX,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// The discriminating fields of a payload.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Probe {
    #[serde(rename = "MsgType")]
    pub msg_type: String,
    #[serde(rename = "Event", default)]
    pub event: String,
    #[serde(rename = "EventKey", default)]
    pub event_key: String,
    #[serde(rename = "Recognition", default)]
    pub recognition: String,
}

impl Probe {
    pub fn read(xml: &str) -> WechatResult<Self> {
        Ok(quick_xml::de::from_str(xml)?)
    }

    /// Map the probed fields onto a variant.
    pub fn kind(&self) -> WechatResult<MessageKind> {
        let msg_type = MsgType::try_from(self.msg_type.as_str())
            .map_err(WechatError::UnknownMessageType)?;

        Ok(match msg_type {
            MsgType::Text => MessageKind::Text,
            MsgType::Image => MessageKind::Image,
            MsgType::Voice if self.recognition.is_empty() => MessageKind::Voice,
            MsgType::Voice => MessageKind::VoiceRecognition,
            MsgType::Video => MessageKind::Video,
            MsgType::ShortVideo => MessageKind::ShortVideo,
            MsgType::Location => MessageKind::Location,
            MsgType::Link => MessageKind::Link,
            MsgType::Event => self.event_kind()?,
        })
    }

    fn event_kind(&self) -> WechatResult<MessageKind> {
        let event =
            EventType::try_from(self.event.as_str()).map_err(WechatError::UnknownEventType)?;

        Ok(match event {
            EventType::Subscribe if self.event_key.starts_with(QR_SCENE_PREFIX) => {
                MessageKind::ScanSubscribe
            }
            EventType::Subscribe => MessageKind::Subscribe,
            EventType::Unsubscribe => MessageKind::Unsubscribe,
            EventType::Scan => MessageKind::Scan,
            EventType::Location => MessageKind::LocationReport,
            EventType::Click => MessageKind::MenuClick,
            EventType::View => MessageKind::MenuView,
            EventType::EnterAgent => MessageKind::EnterAgent,
            EventType::ScanCodePush => MessageKind::ScanCodePush,
            EventType::ScanCodeWaitMsg => MessageKind::ScanCodeWait,
            EventType::PicSysPhoto => MessageKind::PicSysPhoto,
            EventType::PicPhotoOrAlbum => MessageKind::PicAlbum,
            EventType::PicWeixin => MessageKind::PicWeChat,
            EventType::LocationSelect => MessageKind::LocationSelect,
        })
    }
}

/// Classify a plaintext payload without decoding its body.
pub fn probe(xml: &str) -> WechatResult<MessageKind> {
    Probe::read(xml)?.kind()
}

/// Classify and fully decode a plaintext payload.
pub fn parse(xml: &str) -> WechatResult<Message> {
    let kind = probe(xml)?;
    let header: Header = quick_xml::de::from_str(xml)?;

    Ok(match kind {
        MessageKind::Text => Message::Text(received(header, xml)?),
        MessageKind::Image => Message::Image(received(header, xml)?),
        MessageKind::Voice => Message::Voice(received(header, xml)?),
        MessageKind::VoiceRecognition => Message::VoiceRecognition(received(header, xml)?),
        MessageKind::Video => Message::Video(received(header, xml)?),
        MessageKind::ShortVideo => Message::ShortVideo(received(header, xml)?),
        MessageKind::Location => Message::Location(received(header, xml)?),
        MessageKind::Link => Message::Link(received(header, xml)?),
        MessageKind::Subscribe => Message::Subscribe(header),
        MessageKind::Unsubscribe => Message::Unsubscribe(header),
        MessageKind::ScanSubscribe => Message::ScanSubscribe(received(header, xml)?),
        MessageKind::Scan => Message::Scan(received(header, xml)?),
        MessageKind::LocationReport => Message::LocationReport(received(header, xml)?),
        MessageKind::MenuClick => Message::MenuClick(received(header, xml)?),
        MessageKind::MenuView => Message::MenuView(received(header, xml)?),
        MessageKind::EnterAgent => Message::EnterAgent(received(header, xml)?),
        MessageKind::ScanCodePush => Message::ScanCodePush(header),
        MessageKind::ScanCodeWait => Message::ScanCodeWait(header),
        MessageKind::PicSysPhoto => Message::PicSysPhoto(header),
        MessageKind::PicAlbum => Message::PicAlbum(header),
        MessageKind::PicWeChat => Message::PicWeChat(header),
        MessageKind::LocationSelect => Message::LocationSelect(header),
    })
}

/// [`parse`] over raw decrypted bytes.
pub fn parse_bytes(payload: &[u8]) -> WechatResult<Message> {
    parse(std::str::from_utf8(payload)?)
}

fn received<B: DeserializeOwned>(header: Header, xml: &str) -> WechatResult<Received<B>> {
    let body = quick_xml::de::from_str(xml)?;
    Ok(Received { header, body })
}
