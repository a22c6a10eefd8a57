//! HTTP endpoint: `GET` answers the URL handshake, `POST` receives callbacks.

use crate::bot::AutoReply;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tracing::{debug, info, warn};
use wechat_core::{CallbackHandler, CallbackQuery, WechatError};

/// Body the platform expects when there is nothing to reply.
const ACK: &str = "success";

#[derive(Debug, Clone)]
pub struct AppState {
    pub handler: Arc<CallbackHandler>,
    pub bot: Arc<AutoReply>,
}

pub fn router(state: AppState, path: &str) -> Router {
    Router::new()
        .route(path, get(verify).post(callback))
        .with_state(state)
}

async fn verify(State(state): State<AppState>, Query(query): Query<CallbackQuery>) -> Response {
    match state.handler.verify_url(&query) {
        Ok(echo) => {
            info!(platform = %state.handler.platform(), "url verification succeeded");
            (StatusCode::OK, echo).into_response()
        }
        Err(e) => error_response("url verification", e),
    }
}

async fn callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
    body: String,
) -> Response {
    let message = match state.handler.open(&query, &body) {
        Ok(message) => message,
        Err(e) => return error_response("callback", e),
    };
    debug!(
        kind = ?message.kind(),
        event = message.kind().is_event(),
        from = %message.from_user(),
        "callback received"
    );

    let Some(reply) = state.bot.respond(&message) else {
        return (StatusCode::OK, ACK).into_response();
    };
    match state.handler.reply(&query, &reply) {
        Ok(xml) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/xml; charset=utf-8")],
            xml,
        )
            .into_response(),
        Err(e) => error_response("reply", e),
    }
}

fn error_response(stage: &str, e: WechatError) -> Response {
    if e.is_unrecognized() {
        debug!(stage, error = %e, "ignoring unrecognized payload");
        return (StatusCode::OK, ACK).into_response();
    }
    let status = match e {
        WechatError::SignatureMismatch => StatusCode::UNAUTHORIZED,
        WechatError::MissingParameter(_)
        | WechatError::MalformedCiphertext(_)
        | WechatError::PaddingInvalid
        | WechatError::TenantMismatch { .. }
        | WechatError::XmlMalformed(_)
        | WechatError::CleartextRejected => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    warn!(stage, status = status.as_u16(), error = %e, "request rejected");
    (status, status.canonical_reason().unwrap_or("error")).into_response()
}
