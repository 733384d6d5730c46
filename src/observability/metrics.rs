//! Metrics collection and exposition.
//!
//! # Metrics
//! - `calculator_requests_total` (counter): requests by status
//! - `calculator_request_duration_seconds` (histogram): latency distribution
//! - `calculator_rate_limited_total` (counter): admissions refused
//! - `calculator_auth_rejections_total` (counter): gate rejections by reason
//! - `calculator_tokens_available` (gauge): bucket level seen at admission

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Count a finished request and record its latency.
pub fn record_request(status: u16, duration: Duration) {
    counter!("calculator_requests_total", "status" => status.to_string()).increment(1);
    histogram!("calculator_request_duration_seconds").record(duration.as_secs_f64());
}

/// Count a request refused by the admission bucket.
pub fn record_rate_limited() {
    counter!("calculator_rate_limited_total").increment(1);
}

/// Count an authentication gate rejection.
pub fn record_auth_rejection(reason: &'static str) {
    counter!("calculator_auth_rejections_total", "reason" => reason).increment(1);
}

/// Record the bucket level seen at admission.
pub fn record_tokens_available(tokens: usize) {
    gauge!("calculator_tokens_available").set(tokens as f64);
}
