//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use catalog_connector::config::ServiceConfig;
use catalog_connector::lifecycle::Shutdown;
use catalog_connector::{DocumentStore, HttpServer};
use catalog_sdk::CatalogClient;
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub const PIN: &str = "4545";

/// A server on an ephemeral port with its own data directory.
pub struct TestServer {
    pub addr: SocketAddr,
    pub dir: TempDir,
    pub store: Arc<DocumentStore>,
    shutdown: Shutdown,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::start_with(|_| {}).await
    }

    pub async fn start_with<F>(tweak: F) -> Self
    where
        F: FnOnce(&mut ServiceConfig),
    {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ServiceConfig::default();
        config.listener.bind_address = "127.0.0.1:0".into();
        config.storage.data_dir = dir.path().to_string_lossy().into_owned();
        config.auth.admin_pin = PIN.into();
        tweak(&mut config);

        let store = Arc::new(DocumentStore::open(&config.storage).await.unwrap());
        let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
        let addr = listener.local_addr().unwrap();

        let shutdown = Shutdown::new();
        let server = HttpServer::new(config, store.clone());
        let rx = shutdown.subscribe();
        let handle = tokio::spawn(async move {
            let _ = server.run(listener, rx).await;
        });

        Self {
            addr,
            dir,
            store,
            shutdown,
            handle,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn client(&self) -> CatalogClient {
        CatalogClient::new(&format!("http://{}", self.addr))
    }

    pub async fn admin(&self) -> CatalogClient {
        let mut client = self.client();
        client.login(PIN).await.unwrap();
        client
    }

    pub fn document(&self) -> Value {
        let bytes = std::fs::read(self.dir.path().join("db.json")).unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    pub async fn stop(self) {
        self.shutdown.trigger();
        let _ = self.handle.await;
    }
}

/// A submission that passes validation.
pub fn valid_item(title: &str) -> Value {
    json!({
        "title": title,
        "url": "https://chatgpt.com/g/g-abc123-helper",
        "desc": "Answers questions",
        "categories": "Writing, Research",
        "tags": ["fast", "free"],
    })
}

pub fn http() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
