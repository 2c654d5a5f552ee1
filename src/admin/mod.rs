//! Admin subsystem: PIN login, session tokens, and the moderation API.

pub mod auth;
pub mod handlers;
pub mod session;

use axum::{
    middleware,
    routing::{delete, put},
    Router,
};

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::http::server::{bounded_get, AppState};

pub use session::{Role, SessionStore};

/// Routes that require a valid session. Merged into the public router, so
/// paths may share a method router with public handlers (`/api/leads`).
pub fn setup_admin_router(state: AppState) -> Router<AppState> {
    let limit = state.config.timeouts.request_timeout();
    Router::new()
        .route("/api/gpts", bounded_get(list_items, limit).post(create_item))
        .route("/api/gpts/{id}", put(update_item).delete(delete_item))
        .route("/api/leads", bounded_get(list_leads, limit))
        .route("/api/leads/export", bounded_get(export_leads, limit))
        .route("/api/leads/{id}", delete(delete_lead))
        .route("/api/settings", bounded_get(get_settings, limit).put(update_settings))
        .route_layer(middleware::from_fn_with_state(state, admin_auth_middleware))
}
