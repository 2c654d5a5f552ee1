//! Per-route rate limit guard.
//! Runs before body extraction, so throttled clients never cost a parse.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::http::request::ClientId;
use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::security::Category;

/// Middleware state: the app plus the category this route draws from.
#[derive(Clone)]
pub struct RateLimitGuard {
    pub state: AppState,
    pub category: Category,
}

impl RateLimitGuard {
    pub fn new(state: &AppState, category: Category) -> Self {
        Self {
            state: state.clone(),
            category,
        }
    }
}

pub async fn rate_limit_middleware(
    State(guard): State<RateLimitGuard>,
    mut req: Request,
    next: Next,
) -> Response {
    let client = ClientId::from_parts(
        req.headers(),
        req.extensions(),
        guard.state.config.rate_limit.trust_forwarded_for,
    );

    if !guard.state.limiter.try_admit(guard.category, &client.0) {
        return ApiError::RateLimited(guard.category).into_response();
    }

    req.extensions_mut().insert(client);
    next.run(req).await
}
