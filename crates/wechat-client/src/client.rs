//! Async HTTP client for the platform APIs.
//!
//! One request per call: no token caching, no retries.

use crate::api::{decode, AccessToken, ApiStatus, Endpoints, WebAuth};
use crate::menu::Menu;
use crate::message::OutboundMessage;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, warn};
use wechat_core::{Platform, WechatError, WechatResult};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

fn http_error(e: reqwest::Error) -> WechatError {
    WechatError::Http(e.to_string())
}

/// Platform API client.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    endpoints: Endpoints,
}

impl Client {
    pub fn new(platform: Platform) -> Self {
        Self::with_endpoints(Endpoints::new(platform))
    }

    pub fn with_endpoints(endpoints: Endpoints) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
            endpoints,
        }
    }

    /// Exchange an app id / corp id and secret for an access token.
    pub async fn fetch_access_token(&self, id: &str, secret: &str) -> WechatResult<AccessToken> {
        let url = self.endpoints.access_token(id, secret)?;
        let token: AccessToken = self.get(url).await?;
        info!(id, expires_in = token.expires_in, "fetched access token");
        Ok(token)
    }

    /// Exchange an OAuth `code` for a user's web access token.
    pub async fn fetch_web_auth(
        &self,
        app_id: &str,
        secret: &str,
        code: &str,
    ) -> WechatResult<WebAuth> {
        let url = self.endpoints.web_auth(app_id, secret, code)?;
        let auth: WebAuth = self.get(url).await?;
        debug!(openid = %auth.openid, scope = %auth.scope, "web auth exchanged");
        Ok(auth)
    }

    pub async fn send_message(
        &self,
        access_token: &str,
        message: &OutboundMessage,
    ) -> WechatResult<()> {
        if self.endpoints.platform() == Platform::Work && message.agentid.is_none() {
            return Err(WechatError::MissingParameter("agentid"));
        }
        let url = self.endpoints.send_message(access_token)?;
        let status: ApiStatus = self.post(url, message).await?;
        status.check()?;
        info!(touser = %message.touser, "message sent");
        Ok(())
    }

    pub async fn create_menu(
        &self,
        access_token: &str,
        menu: &Menu,
        agent_id: Option<i64>,
    ) -> WechatResult<()> {
        menu.validate()?;
        let url = self.endpoints.create_menu(access_token, agent_id)?;
        let status: ApiStatus = self.post(url, menu).await?;
        status.check()?;
        info!(buttons = menu.button.len(), "menu created");
        Ok(())
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> WechatResult<T> {
        debug!(path = url.path(), "GET");
        let response = self.http.get(url).send().await.map_err(http_error)?;
        Self::read(response).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: Url,
        body: &B,
    ) -> WechatResult<T> {
        debug!(path = url.path(), "POST");
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(http_error)?;
        Self::read(response).await
    }

    async fn read<T: DeserializeOwned>(response: reqwest::Response) -> WechatResult<T> {
        let status = response.status();
        let body = response.text().await.map_err(http_error)?;
        if !status.is_success() {
            warn!(%status, "platform API returned non-success status");
            return Err(WechatError::Http(format!("status {status}")));
        }
        let parsed = decode(&body);
        if let Err(WechatError::Api { code, message }) = &parsed {
            warn!(code, %message, "platform API error");
        }
        parsed
    }
}
