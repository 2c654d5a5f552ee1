//! Metrics collection and exposition.
//!
//! # Metrics
//! - `catalog_requests_total` (counter): requests by method, route, status
//! - `catalog_request_duration_seconds` (histogram): handler latency
//! - `catalog_rate_limited_total` (counter): rejections by category
//! - `catalog_logins_total` (counter): login attempts by outcome
//! - `catalog_submissions_total` (counter): accepted public submissions by kind
//! - `catalog_document_writes_total` (counter): physical writes by outcome
//! - `catalog_document_write_duration_seconds` (histogram): temp write + rename
//! - `catalog_document_write_queue` (gauge): saves waiting for the writer
//! - `catalog_active_sessions` (gauge): tokens held in memory
//!
//! Recording is a no-op until a recorder is installed, so library users and
//! tests pay nothing for it.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram, Label};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_request(method: &str, route: &str, status: u16, start: Instant) {
    let labels = vec![
        Label::new("method", method.to_string()),
        Label::new("route", route.to_string()),
    ];
    let mut with_status = labels.clone();
    with_status.push(Label::new("status", status.to_string()));
    counter!("catalog_requests_total", with_status).increment(1);
    histogram!("catalog_request_duration_seconds", labels).record(start.elapsed().as_secs_f64());
}

pub fn record_rate_limited(category: &'static str) {
    counter!("catalog_rate_limited_total", "category" => category).increment(1);
}

pub fn record_login(outcome: &'static str) {
    counter!("catalog_logins_total", "outcome" => outcome).increment(1);
}

pub fn record_submission(kind: &'static str) {
    counter!("catalog_submissions_total", "kind" => kind).increment(1);
}

pub fn record_document_write(ok: bool, start: Instant) {
    let outcome = if ok { "ok" } else { "error" };
    counter!("catalog_document_writes_total", "outcome" => outcome).increment(1);
    histogram!("catalog_document_write_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_write_queue(depth: usize) {
    gauge!("catalog_document_write_queue").set(depth as f64);
}

pub fn record_active_sessions(count: usize) {
    gauge!("catalog_active_sessions").set(count as f64);
}
