//! Outer XML envelopes of encrypted callbacks and replies.

use crate::error::WechatResult;
use quick_xml::events::{BytesCData, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde::Deserialize;

/// Inbound encrypted callback body.
///
/// `<xml><ToUserName>…</ToUserName>[<AgentID>…</AgentID>]<Encrypt>…</Encrypt></xml>`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Envelope {
    #[serde(rename = "ToUserName", default)]
    pub to_user_name: String,
    #[serde(rename = "AgentID", default)]
    pub agent_id: Option<String>,
    #[serde(rename = "Encrypt")]
    pub encrypt: String,
}

impl Envelope {
    pub fn parse(xml: &str) -> WechatResult<Self> {
        Ok(quick_xml::de::from_str(xml)?)
    }

    pub fn to_xml(&self) -> WechatResult<String> {
        let mut w = XmlWriter::new()?;
        w.cdata("ToUserName", &self.to_user_name)?;
        if let Some(agent_id) = &self.agent_id {
            w.cdata("AgentID", agent_id)?;
        }
        w.cdata("Encrypt", &self.encrypt)?;
        w.finish()
    }
}

/// Encrypted reply body.
///
/// `<xml><Encrypt/><MsgSignature/><TimeStamp/><Nonce/></xml>`, element order fixed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResponseEnvelope {
    #[serde(rename = "Encrypt")]
    pub encrypt: String,
    #[serde(rename = "MsgSignature")]
    pub msg_signature: String,
    #[serde(rename = "TimeStamp")]
    pub timestamp: u64,
    #[serde(rename = "Nonce")]
    pub nonce: String,
}

impl ResponseEnvelope {
    pub fn parse(xml: &str) -> WechatResult<Self> {
        Ok(quick_xml::de::from_str(xml)?)
    }

    pub fn to_xml(&self) -> WechatResult<String> {
        let mut w = XmlWriter::new()?;
        w.cdata("Encrypt", &self.encrypt)?;
        w.cdata("MsgSignature", &self.msg_signature)?;
        w.text("TimeStamp", &self.timestamp.to_string())?;
        w.cdata("Nonce", &self.nonce)?;
        w.finish()
    }
}

/// Flat `<xml>` document writer. Elements are written in call order, no indentation.
pub(crate) struct XmlWriter {
    inner: Writer<Vec<u8>>,
}

impl XmlWriter {
    pub(crate) fn new() -> WechatResult<Self> {
        let mut inner = Writer::new(Vec::new());
        inner.write_event(Event::Start(BytesStart::new("xml")))?;
        Ok(Self { inner })
    }

    pub(crate) fn open(&mut self, name: &str) -> WechatResult<()> {
        self.inner.write_event(Event::Start(BytesStart::new(name)))?;
        Ok(())
    }

    pub(crate) fn close(&mut self, name: &str) -> WechatResult<()> {
        self.inner.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }

    /// `<name><![CDATA[value]]></name>`; a `]]>` inside `value` splits the section.
    pub(crate) fn cdata(&mut self, name: &str, value: &str) -> WechatResult<()> {
        self.open(name)?;
        let mut rest = value;
        while let Some(at) = rest.find("]]>") {
            // keep "]]" in this section, start the next one with ">"
            let (head, tail) = rest.split_at(at + 2);
            self.inner.write_event(Event::CData(BytesCData::new(head)))?;
            rest = tail;
        }
        self.inner.write_event(Event::CData(BytesCData::new(rest)))?;
        self.close(name)
    }

    /// `<name>value</name>` with XML escaping.
    pub(crate) fn text(&mut self, name: &str, value: &str) -> WechatResult<()> {
        self.open(name)?;
        self.inner.write_event(Event::Text(BytesText::new(value)))?;
        self.close(name)
    }

    pub(crate) fn finish(mut self) -> WechatResult<String> {
        self.close("xml")?;
        Ok(String::from_utf8(self.inner.into_inner())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_envelope_exact_layout() {
        let env = ResponseEnvelope {
            encrypt: "Q0lQSEVS".into(),
            msg_signature: "abc123".into(),
            timestamp: 1409659813,
            nonce: "1372623149".into(),
        };
        assert_eq!(
            env.to_xml().unwrap(),
            "<xml><Encrypt><![CDATA[Q0lQSEVS]]></Encrypt>\
             <MsgSignature><![CDATA[abc123]]></MsgSignature>\
             <TimeStamp>1409659813</TimeStamp>\
             <Nonce><![CDATA[1372623149]]></Nonce></xml>"
        );
        assert_eq!(ResponseEnvelope::parse(&env.to_xml().unwrap()).unwrap(), env);
    }

    #[test]
    fn parses_inbound_envelope() {
        let env = Envelope::parse(
            "<xml><ToUserName><![CDATA[wx5823bf96d3bd56c7]]></ToUserName>\
             <Encrypt><![CDATA[RypEvHKD8QQKFhvQ6QleEB4J58tiPdvo+rtK1I9qca6aM/wvqnLSV5zEPeusUiX5L5X/0lWfrf0QADHHhGd3QczcdCUpj911L3vg3W/sYYvuJTs3TUUkSUXxaccAS0qhxchrRYt66wiSpGLYL42aM6A8dTT+6k4aSknmPj48kzJs8qLjvd4Xgpue06DOdnLxAUHzM6+kDZ+HMZfJYuR+LtwGc2hgf5gsijff0ekUNXZiqATP7PF5mZxZ3Izoun1s4zG4LUMnvw2r+KqCKIw+3IQH03v+BCA9nMELNqbSf6tiWSrXJB3LAVGUcallcrw8V2t9EL4EhzJWrQUax5wLVMNS0+rUPA3k22Ncx4XXZS9o0MBH27Bo6BpNelZpS+/uh9KsNlY6bHCmJU9p8g7m3fVKn28H3KDYA5Pl/T8Z1ptDAVe0lXdQ2YoyyH2uyPIGHBZZIs2pDBS8R07+qN+E7Q==]]></Encrypt>\
             <AgentID><![CDATA[218]]></AgentID></xml>",
        )
        .unwrap();
        assert_eq!(env.to_user_name, "wx5823bf96d3bd56c7");
        assert_eq!(env.agent_id.as_deref(), Some("218"));
        assert!(env.encrypt.starts_with("RypEvHKD8QQK"));
        assert!(env.encrypt.ends_with("E7Q=="));
    }

    #[test]
    fn inbound_envelope_requires_encrypt() {
        assert!(Envelope::parse("<xml><ToUserName>wx</ToUserName></xml>").is_err());
    }

    #[test]
    fn envelope_round_trip_without_agent() {
        let env = Envelope {
            to_user_name: "gh_1".into(),
            agent_id: None,
            encrypt: "AAAA".into(),
        };
        let xml = env.to_xml().unwrap();
        assert_eq!(
            xml,
            "<xml><ToUserName><![CDATA[gh_1]]></ToUserName><Encrypt><![CDATA[AAAA]]></Encrypt></xml>"
        );
        assert_eq!(Envelope::parse(&xml).unwrap(), env);
    }

    #[test]
    fn cdata_terminator_is_split() {
        let mut w = XmlWriter::new().unwrap();
        w.cdata("Content", "a]]>b").unwrap();
        assert_eq!(
            w.finish().unwrap(),
            "<xml><Content><![CDATA[a]]]]><![CDATA[>b]]></Content></xml>"
        );

        let mut w = XmlWriter::new().unwrap();
        w.cdata("Content", "]]>]]>").unwrap();
        assert_eq!(
            w.finish().unwrap(),
            "<xml><Content><![CDATA[]]]]><![CDATA[>]]]]><![CDATA[>]]></Content></xml>"
        );
    }

    #[test]
    fn text_is_escaped() {
        let mut w = XmlWriter::new().unwrap();
        w.text("Title", "a < b & c").unwrap();
        assert_eq!(
            w.finish().unwrap(),
            "<xml><Title>a &lt; b &amp; c</Title></xml>"
        );
    }
}
