//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the catalog service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (bind address, static assets).
    pub listener: ListenerConfig,

    /// Document storage location and bootstrap values.
    pub storage: StorageConfig,

    /// Admin credential and session settings.
    pub auth: AuthConfig,

    /// Per-client rate limiting for anonymous write endpoints.
    pub rate_limit: RateLimitConfig,

    /// Item submission policy.
    pub catalog: CatalogConfig,

    /// Cross-origin settings.
    pub cors: CorsConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Request hardening.
    pub security: SecurityConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,

    /// Directory served for non-API paths. Disabled when unset.
    pub static_dir: Option<String>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            static_dir: None,
        }
    }
}

/// Where the document lives and what a fresh one looks like.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the document file.
    pub data_dir: String,

    /// Document file name inside `data_dir`.
    pub file_name: String,

    /// Site title written into a freshly created document.
    pub default_title: String,
}

impl StorageConfig {
    pub fn document_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(&self.file_name)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: ".".to_string(),
            file_name: "db.json".to_string(),
            default_title: "GPTMart".to_string(),
        }
    }
}

/// Admin authentication.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Shared secret gating the admin role.
    pub admin_pin: String,

    /// Lifetime of an issued session token in seconds.
    pub session_ttl_secs: u64,

    /// Cookie carrying the session token.
    pub cookie_name: String,

    /// Mark the session cookie `Secure; SameSite=None`.
    pub secure_cookie: bool,
}

impl AuthConfig {
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            // WARNING: This is a placeholder! Change this in production.
            admin_pin: "4545".to_string(),
            session_ttl_secs: 3600,
            cookie_name: "session".to_string(),
            secure_cookie: true,
        }
    }
}

/// A sliding window: at most `max_requests` per `window_secs`.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub struct WindowConfig {
    pub max_requests: usize,
    pub window_secs: u64,
}

impl WindowConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    /// Use the first `X-Forwarded-For` entry as the client id.
    pub trust_forwarded_for: bool,

    /// Public item submissions.
    pub submissions: WindowConfig,

    /// Public contact (lead) submissions.
    pub leads: WindowConfig,

    /// Admin login attempts.
    pub logins: WindowConfig,

    /// How often idle clients and expired sessions are swept, in seconds.
    pub sweep_interval_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            trust_forwarded_for: true,
            submissions: WindowConfig {
                max_requests: 5,
                window_secs: 300,
            },
            leads: WindowConfig {
                max_requests: 5,
                window_secs: 300,
            },
            logins: WindowConfig {
                max_requests: 10,
                window_secs: 300,
            },
            sweep_interval_secs: 600,
        }
    }
}

impl RateLimitConfig {
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

/// Item submission policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Every item link must start with this prefix (case-insensitive).
    pub link_prefix: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            link_prefix: "https://chatgpt.com/g/".to_string(),
        }
    }
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CorsConfig {
    /// Allowed origins. Empty reflects the request origin.
    pub allowed_origins: Vec<String>,
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Handler time limit for read-only (GET) routes, in seconds. Routes
    /// that write the document run to completion.
    pub request_secs: u64,
}

impl TimeoutConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_secs)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Enable security response headers.
    pub enable_headers: bool,
    /// Maximum body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enable_headers: true,
            max_body_size: 2_500_000,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format: "pretty" or "json".
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
