//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (windows > 0, TTL > 0, addresses parse)
//! - Reject an empty admin secret
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::{ServiceConfig, WindowConfig};

/// A single semantic problem with a configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.storage.data_dir.trim().is_empty() {
        errors.push(ValidationError::new("storage.data_dir", "must not be empty"));
    }
    if config.storage.file_name.trim().is_empty() || config.storage.file_name.contains('/') {
        errors.push(ValidationError::new(
            "storage.file_name",
            "must be a plain file name",
        ));
    }

    if config.auth.admin_pin.trim().is_empty() {
        errors.push(ValidationError::new("auth.admin_pin", "must not be empty"));
    }
    if config.auth.session_ttl_secs == 0 {
        errors.push(ValidationError::new("auth.session_ttl_secs", "must be greater than 0"));
    }
    if config.auth.cookie_name.is_empty()
        || !config.auth.cookie_name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        errors.push(ValidationError::new(
            "auth.cookie_name",
            "must be a non-empty token of [A-Za-z0-9_-]",
        ));
    }

    check_window(&mut errors, "rate_limit.submissions", &config.rate_limit.submissions);
    check_window(&mut errors, "rate_limit.leads", &config.rate_limit.leads);
    check_window(&mut errors, "rate_limit.logins", &config.rate_limit.logins);
    if config.rate_limit.sweep_interval_secs == 0 {
        errors.push(ValidationError::new(
            "rate_limit.sweep_interval_secs",
            "must be greater than 0",
        ));
    }

    let prefix = config.catalog.link_prefix.to_ascii_lowercase();
    if !(prefix.starts_with("https://") || prefix.starts_with("http://")) {
        errors.push(ValidationError::new(
            "catalog.link_prefix",
            "must start with http:// or https://",
        ));
    }

    for origin in &config.cors.allowed_origins {
        if axum::http::HeaderValue::from_str(origin).is_err() {
            errors.push(ValidationError::new(
                "cors.allowed_origins",
                format!("'{origin}' is not a valid header value"),
            ));
        }
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }
    if config.security.max_body_size == 0 {
        errors.push(ValidationError::new("security.max_body_size", "must be greater than 0"));
    }

    if !matches!(config.observability.log_format.as_str(), "pretty" | "json") {
        errors.push(ValidationError::new(
            "observability.log_format",
            "must be \"pretty\" or \"json\"",
        ));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_window(errors: &mut Vec<ValidationError>, field: &'static str, window: &WindowConfig) {
    if window.max_requests == 0 || window.window_secs == 0 {
        errors.push(ValidationError::new(
            field,
            "max_requests and window_secs must be greater than 0",
        ));
    }
}
