//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ServiceConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value {value:?} for environment variable {var}")]
    Env { var: &'static str, value: String },

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse a TOML file without validating it.
pub fn read_config(path: &Path) -> Result<ServiceConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Resolve the effective configuration: optional file, then environment
/// overrides, then validation.
pub fn resolve_config(path: Option<&Path>) -> Result<ServiceConfig, ConfigError> {
    resolve_config_with(path, |var| std::env::var(var).ok())
}

fn resolve_config_with<F>(path: Option<&Path>, lookup: F) -> Result<ServiceConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => read_config(path)?,
        None => ServiceConfig::default(),
    };
    apply_env_overrides(&mut config, lookup)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Apply the deployment environment variables on top of `config`.
///
/// `lookup` abstracts `std::env::var` so tests need not touch the real
/// process environment.
pub fn apply_env_overrides<F>(config: &mut ServiceConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(port) = lookup("PORT") {
        let port: u16 = parse_env("PORT", &port)?;
        config.listener.bind_address = format!("0.0.0.0:{port}");
    }
    if let Some(pin) = lookup("ADMIN_PIN") {
        config.auth.admin_pin = pin.trim().to_string();
    }
    if let Some(dir) = lookup("DATA_DIR") {
        config.storage.data_dir = dir;
    }
    if let Some(ttl) = lookup("SESSION_TTL_SECS") {
        config.auth.session_ttl_secs = parse_env("SESSION_TTL_SECS", &ttl)?;
    }
    if let Some(max) = lookup("SUBMIT_RATE_MAX") {
        config.rate_limit.submissions.max_requests = parse_env("SUBMIT_RATE_MAX", &max)?;
    }
    if let Some(secs) = lookup("SUBMIT_RATE_WINDOW_SECS") {
        config.rate_limit.submissions.window_secs = parse_env("SUBMIT_RATE_WINDOW_SECS", &secs)?;
    }
    if let Some(max) = lookup("LEAD_RATE_MAX") {
        config.rate_limit.leads.max_requests = parse_env("LEAD_RATE_MAX", &max)?;
    }
    if let Some(secs) = lookup("LEAD_RATE_WINDOW_SECS") {
        config.rate_limit.leads.window_secs = parse_env("LEAD_RATE_WINDOW_SECS", &secs)?;
    }
    if let Some(level) = lookup("LOG_LEVEL") {
        config.observability.log_level = level;
    }
    if let Some(format) = lookup("LOG_FORMAT") {
        config.observability.log_format = format;
    }
    if let Some(addr) = lookup("METRICS_ADDRESS") {
        config.observability.metrics_enabled = true;
        config.observability.metrics_address = addr;
    }
    Ok(())
}

fn parse_env<T: std::str::FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Env {
        var,
        value: value.to_string(),
    })
}
