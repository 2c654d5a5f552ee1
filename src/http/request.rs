//! Request extractors.
//!
//! - [`Payload`]: JSON, urlencoded form, or `{"raw": ...}` for anything else
//! - [`ClientId`]: who is asking, for rate limiting and submission stamps

use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;

use axum::{
    body::Bytes,
    extract::{ConnectInfo, FromRequest, FromRequestParts, Request},
    http::{header, request::Parts, HeaderMap, StatusCode},
    Form,
};
use serde_json::{json, Map, Value};

use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::security::resolve_client_id;

/// A request body decoded into a JSON value.
#[derive(Debug, Clone, PartialEq)]
pub struct Payload(pub Value);

impl<S> FromRequest<S> for Payload
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(fields) = Form::<HashMap<String, String>>::from_request(req, state)
                .await
                .map_err(|r| body_rejection(r.status()))?;
            let object: Map<String, Value> = fields
                .into_iter()
                .map(|(k, v)| (k, Value::String(v)))
                .collect();
            return Ok(Payload(Value::Object(object)));
        }

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|r| body_rejection(r.status()))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Payload(Value::Object(Map::new())));
        }

        match serde_json::from_slice::<Value>(&bytes) {
            Ok(value) => Ok(Payload(value)),
            Err(_) if content_type.contains("json") => Err(ApiError::BadRequest),
            Err(_) => Ok(Payload(json!({ "raw": String::from_utf8_lossy(&bytes) }))),
        }
    }
}

fn body_rejection(status: StatusCode) -> ApiError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge
    } else {
        ApiError::BadRequest
    }
}

/// Client identifier resolved per the configured trust policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientId(pub String);

impl ClientId {
    pub fn from_parts(headers: &HeaderMap, extensions: &axum::http::Extensions, trust_forwarded_for: bool) -> Self {
        let peer = extensions.get::<ConnectInfo<SocketAddr>>().map(|c| c.0);
        ClientId(resolve_client_id(headers, peer, trust_forwarded_for))
    }
}

impl FromRequestParts<AppState> for ClientId {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // Already resolved by the rate limit guard.
        if let Some(client) = parts.extensions.get::<ClientId>() {
            return Ok(client.clone());
        }
        Ok(ClientId::from_parts(
            &parts.headers,
            &parts.extensions,
            state.config.rate_limit.trust_forwarded_for,
        ))
    }
}
