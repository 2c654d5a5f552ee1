//! Public endpoints plus login/logout.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use tower_http::services::ServeDir;

use crate::admin::auth::{cleared_cookie, session_cookie, session_token};
use crate::catalog::{validation::accept_lead, Document};
use crate::http::request::{ClientId, Payload};
use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::observability::metrics;

const PIN_KEYS: [&str; 4] = ["pin", "PIN", "passcode", "password"];

pub async fn root(State(state): State<AppState>) -> String {
    format!(
        "{} connector is running. Try /api/gpts/public or /api/health",
        state.config.storage.default_title
    )
}

pub async fn health() -> Json<Value> {
    Json(json!({ "ok": true }))
}

pub async fn login(
    State(state): State<AppState>,
    ClientId(client): ClientId,
    Payload(payload): Payload,
) -> Result<Response, ApiError> {
    let supplied = PIN_KEYS
        .iter()
        .find_map(|key| payload.get(*key))
        .map(|v| match v {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => String::new(),
        })
        .unwrap_or_default();

    if !state.sessions.check_credential(&supplied) {
        metrics::record_login("rejected");
        tracing::warn!(client = %client, "Admin login rejected");
        return Err(ApiError::InvalidCredential);
    }

    let token = state.sessions.issue();
    metrics::record_login("accepted");
    tracing::info!(client = %client, "Admin login");

    let auth = &state.config.auth;
    let cookie = session_cookie(&auth.cookie_name, &token, auth.session_ttl_secs, auth.secure_cookie);
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(json!({ "success": true, "token": token })),
    )
        .into_response())
}

pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let auth = &state.config.auth;
    if let Some(token) = session_token(&headers, &auth.cookie_name) {
        if state.sessions.revoke(&token) {
            tracing::info!("Admin logout");
        }
    }
    (
        [(header::SET_COOKIE, cleared_cookie(&auth.cookie_name, auth.secure_cookie))],
        Json(json!({ "success": true })),
    )
        .into_response()
}

pub async fn public_items(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let doc = state.store.load().await?;
    Ok(Json(json!({
        "settings": doc.settings,
        "items": doc.live_items(),
    })))
}

pub async fn submit_item(
    State(state): State<AppState>,
    ClientId(client): ClientId,
    Payload(payload): Payload,
) -> Result<impl IntoResponse, ApiError> {
    let item = state.policy.accept_submission(&payload, &client)?;
    let id = item.id.clone();
    state
        .store
        .mutate(|doc: &mut Document| {
            doc.items.push(item);
            Ok::<_, ApiError>(())
        })
        .await?;

    metrics::record_submission("item");
    tracing::info!(item_id = %id, client = %client, "Item submitted for review");
    Ok((StatusCode::CREATED, Json(json!({ "success": true, "id": id }))))
}

pub async fn submit_lead(
    State(state): State<AppState>,
    ClientId(client): ClientId,
    headers: HeaderMap,
    Payload(payload): Payload,
) -> Result<impl IntoResponse, ApiError> {
    let user_agent = headers.get(header::USER_AGENT).and_then(|v| v.to_str().ok());
    let lead = accept_lead(&payload, &client, user_agent)?;
    let id = lead.id.clone();
    state
        .store
        .mutate(|doc: &mut Document| {
            doc.leads.push(lead);
            Ok::<_, ApiError>(())
        })
        .await?;

    metrics::record_submission("lead");
    tracing::info!(lead_id = %id, "Lead received");
    Ok((StatusCode::CREATED, Json(json!({ "ok": true }))))
}

/// Unknown `/api` paths get the JSON envelope; anything else goes to the
/// static directory when one is configured.
pub async fn fallback(State(state): State<AppState>, req: Request) -> Response {
    let path = req.uri().path();
    if path == "/api" || path.starts_with("/api/") {
        return ApiError::UnknownRoute.into_response();
    }

    match &state.config.listener.static_dir {
        Some(dir) => match ServeDir::new(dir).oneshot(req).await {
            Ok(res) => res.into_response(),
            Err(never) => match never {},
        },
        None => (StatusCode::NOT_FOUND, "Not found").into_response(),
    }
}
