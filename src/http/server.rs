//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build shared state (store, sessions, limiter, submission policy)
//! - Create the Axum router: public routes, admin routes, fallback
//! - Wire up middleware (tracing, request ID, CORS, body limit)
//! - Bound read-only routes with a timeout; writes always run to completion
//! - Serve until the shutdown signal, then drain

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    handler::Handler,
    http::{header, HeaderValue, Method, Request},
    middleware,
    routing::{get, post, MethodRouter},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin::{setup_admin_router, SessionStore};
use crate::catalog::SubmissionPolicy;
use crate::config::{CorsConfig, ServiceConfig};
use crate::http::handlers::*;
use crate::http::middleware::{rate_limit_middleware, track_requests, RateLimitGuard};
use crate::lifecycle::maintenance;
use crate::security::{headers::security_header_layers, Category, RateLimiter};
use crate::storage::DocumentStore;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServiceConfig>,
    pub store: Arc<DocumentStore>,
    pub sessions: Arc<SessionStore>,
    pub limiter: Arc<RateLimiter>,
    pub policy: Arc<SubmissionPolicy>,
}

impl AppState {
    pub fn new(config: ServiceConfig, store: Arc<DocumentStore>) -> Self {
        let sessions = SessionStore::new(&config.auth.admin_pin, config.auth.session_ttl());
        let limiter = RateLimiter::new(&config.rate_limit);
        let policy = SubmissionPolicy::new(config.catalog.link_prefix.clone());
        Self {
            config: Arc::new(config),
            store,
            sessions: Arc::new(sessions),
            limiter: Arc::new(limiter),
            policy: Arc::new(policy),
        }
    }
}

pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    pub fn new(config: ServiceConfig, store: Arc<DocumentStore>) -> Self {
        let state = AppState::new(config, store);
        let router = Self::build_router(state.clone());
        Self { router, state }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// The fully layered router, for serving or driving in tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    fn build_router(state: AppState) -> Router {
        let config = state.config.clone();
        let limit = config.timeouts.request_timeout();
        let limited = |category| {
            middleware::from_fn_with_state(RateLimitGuard::new(&state, category), rate_limit_middleware)
        };

        let mut router = Router::new()
            .route("/", bounded_get(root, limit))
            .route("/api/health", bounded_get(health, limit))
            .route("/api/login", post(login).layer(limited(Category::Login)))
            .route("/api/logout", post(logout))
            .route("/api/gpts/public", bounded_get(public_items, limit))
            .route("/api/gpts/submit", post(submit_item).layer(limited(Category::Submission)))
            .route("/api/leads", post(submit_lead).layer(limited(Category::Lead)))
            .merge(setup_admin_router(state.clone()))
            .fallback(fallback)
            .layer(middleware::from_fn(track_requests))
            .layer(DefaultBodyLimit::max(config.security.max_body_size))
            .with_state(state);

        if config.security.enable_headers {
            for layer in security_header_layers() {
                router = router.layer(layer);
            }
        }

        router
            .layer(cors_layer(&config.cors))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                let request_id = req
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("-");
                tracing::info_span!(
                    "request",
                    method = %req.method(),
                    path = %req.uri().path(),
                    request_id = %request_id,
                )
            }))
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Serve on `listener` until `shutdown` fires. The maintenance sweep
    /// runs alongside and stops with it.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let sweeper = maintenance::spawn(
            self.state.sessions.clone(),
            self.state.limiter.clone(),
            self.state.config.rate_limit.sweep_interval(),
            shutdown.resubscribe(),
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        sweeper.abort();
        tracing::info!(
            pending_writes = self.state.store.pending_writes(),
            "HTTP server stopped"
        );
        Ok(())
    }
}

/// A GET route cut off with 408 after `limit`.
///
/// Only read-only handlers get one: a handler dropped after its write was
/// queued would report a timeout for a change that still lands.
#[allow(deprecated)]
pub(crate) fn bounded_get<H, T, S>(handler: H, limit: Duration) -> MethodRouter<S>
where
    H: Handler<T, S>,
    T: 'static,
    S: Clone + Send + Sync + 'static,
{
    get(handler).layer(TimeoutLayer::new(limit))
}

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let origin = if config.allowed_origins.is_empty() {
        AllowOrigin::mirror_request()
    } else {
        AllowOrigin::list(
            config
                .allowed_origins
                .iter()
                .filter_map(|o| HeaderValue::from_str(o).ok()),
        )
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}
