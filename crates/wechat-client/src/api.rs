//! Platform endpoints and the JSON shapes they return.

use reqwest::Url;
use serde::Deserialize;
use wechat_core::{Platform, WechatError, WechatResult};

pub const OFFICIAL_BASE: &str = "https://api.weixin.qq.com";
pub const WORK_BASE: &str = "https://qyapi.weixin.qq.com";

/// URL builder for one platform flavor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    platform: Platform,
    base: String,
}

impl Endpoints {
    pub fn new(platform: Platform) -> Self {
        let base = match platform {
            Platform::Official => OFFICIAL_BASE,
            Platform::Work => WORK_BASE,
        };
        Self::with_base(platform, base)
    }

    /// Point at a different host, e.g. a local stub or an egress proxy.
    pub fn with_base(platform: Platform, base: &str) -> Self {
        Self {
            platform,
            base: base.trim_end_matches('/').to_string(),
        }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    fn url(&self, path: &str, params: &[(&str, &str)]) -> WechatResult<Url> {
        Url::parse_with_params(&format!("{}{path}", self.base), params)
            .map_err(|e| WechatError::Http(format!("invalid url: {e}")))
    }

    /// Access token for an app id / corp id and its secret.
    pub fn access_token(&self, id: &str, secret: &str) -> WechatResult<Url> {
        match self.platform {
            Platform::Official => self.url(
                "/cgi-bin/token",
                &[
                    ("grant_type", "client_credential"),
                    ("appid", id),
                    ("secret", secret),
                ],
            ),
            Platform::Work => self.url("/cgi-bin/gettoken", &[("corpid", id), ("corpsecret", secret)]),
        }
    }

    /// OAuth code exchange. Official accounts only.
    pub fn web_auth(&self, app_id: &str, secret: &str, code: &str) -> WechatResult<Url> {
        if self.platform != Platform::Official {
            return Err(WechatError::Config(
                "web auth is only available to official accounts".into(),
            ));
        }
        self.url(
            "/sns/oauth2/access_token",
            &[
                ("appid", app_id),
                ("secret", secret),
                ("code", code),
                ("grant_type", "authorization_code"),
            ],
        )
    }

    pub fn send_message(&self, access_token: &str) -> WechatResult<Url> {
        let path = match self.platform {
            Platform::Official => "/cgi-bin/message/custom/send",
            Platform::Work => "/cgi-bin/message/send",
        };
        self.url(path, &[("access_token", access_token)])
    }

    pub fn create_menu(&self, access_token: &str, agent_id: Option<i64>) -> WechatResult<Url> {
        match (self.platform, agent_id) {
            (Platform::Official, _) => {
                self.url("/cgi-bin/menu/create", &[("access_token", access_token)])
            }
            (Platform::Work, Some(agent_id)) => {
                let agent_id = agent_id.to_string();
                self.url(
                    "/cgi-bin/menu/create",
                    &[("access_token", access_token), ("agentid", agent_id.as_str())],
                )
            }
            (Platform::Work, None) => Err(WechatError::MissingParameter("agentid")),
        }
    }
}

/// `errcode` / `errmsg` carried by every response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ApiStatus {
    #[serde(default)]
    pub errcode: i64,
    #[serde(default)]
    pub errmsg: String,
}

impl ApiStatus {
    pub fn check(self) -> WechatResult<()> {
        if self.errcode == 0 {
            Ok(())
        } else {
            Err(WechatError::Api {
                code: self.errcode,
                message: self.errmsg,
            })
        }
    }
}

/// An access token and its lifetime in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    pub expires_in: u64,
}

/// Result of an OAuth code exchange.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WebAuth {
    pub access_token: String,
    pub expires_in: u64,
    pub refresh_token: String,
    pub openid: String,
    pub scope: String,
    #[serde(default)]
    pub unionid: Option<String>,
}

/// Decode a response body into `T`, turning a non-zero `errcode` into [`WechatError::Api`].
pub fn decode<T: serde::de::DeserializeOwned>(body: &str) -> WechatResult<T> {
    let status: ApiStatus = serde_json::from_str(body)
        .map_err(|e| WechatError::Http(format!("invalid response body: {e}")))?;
    status.check()?;
    serde_json::from_str(body).map_err(|e| WechatError::Http(format!("unexpected response: {e}")))
}
