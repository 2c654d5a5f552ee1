//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize subsystems in dependency order
//! - Bootstrap the document before any traffic arrives
//! - Bind the listener last and serve until shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Logging is installed by the caller, so config errors still reach stderr

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::ServiceConfig;
use crate::http::HttpServer;
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::storage::{DocumentStore, StoreError};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid metrics address {0}")]
    MetricsAddress(String),

    #[error("failed to start metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("failed to open document store: {0}")]
    Store(#[from] StoreError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

pub async fn run(config: ServiceConfig) -> Result<(), StartupError> {
    if config.observability.metrics_enabled {
        let addr: SocketAddr = config
            .observability
            .metrics_address
            .parse()
            .map_err(|_| StartupError::MetricsAddress(config.observability.metrics_address.clone()))?;
        metrics::init_metrics(addr)?;
    }

    let store = DocumentStore::open(&config.storage).await?;

    let address = config.listener.bind_address.clone();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind { address, source })?;

    tracing::info!(
        request_timeout_secs = config.timeouts.request_secs,
        session_ttl_secs = config.auth.session_ttl_secs,
        rate_limit_enabled = config.rate_limit.enabled,
        static_dir = config.listener.static_dir.as_deref().unwrap_or("-"),
        "Configuration loaded"
    );

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, Arc::new(store));
    let receiver = shutdown.subscribe();
    tokio::spawn(shutdown.trigger_on_signal());

    server.run(listener, receiver).await.map_err(StartupError::Serve)?;
    tracing::info!("Shutdown complete");
    Ok(())
}
