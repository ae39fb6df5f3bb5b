//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define the sink interface request metrics are recorded into
//! - Forward observations to the `metrics` facade
//! - Expose a Prometheus-compatible scrape endpoint
//!
//! # Metrics
//! - `http_requests_total` (counter): requests by method, path, status
//! - `http_request_errors_total` (counter): responses with status >= 500
//! - `http_request_duration_seconds` (histogram): latency distribution
//!
//! # Design Decisions
//! - The sink is injected, never a hidden global, so tests can capture observations
//! - Label values are bounded by construction (route templates and sentinels)

use std::net::SocketAddr;
use std::time::Duration;

use metrics::Label;
use metrics_exporter_prometheus::PrometheusBuilder;

pub const REQUESTS_TOTAL: &str = "http_requests_total";
pub const REQUEST_ERRORS_TOTAL: &str = "http_request_errors_total";
pub const REQUEST_DURATION_SECONDS: &str = "http_request_duration_seconds";

/// Label set attached to one observation.
pub type Labels = [(&'static str, String)];

/// Destination for request observations. Must tolerate concurrent callers.
pub trait MetricsSink: Send + Sync + 'static {
    fn increment_counter(&self, name: &'static str, labels: &Labels);

    fn record_duration(&self, name: &'static str, labels: &Labels, duration: Duration);
}

/// Sink backed by the globally installed `metrics` recorder.
///
/// Without an installed recorder observations are silently dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecorderSink;

fn to_labels(labels: &Labels) -> Vec<Label> {
    labels
        .iter()
        .map(|(key, value)| Label::new(*key, value.clone()))
        .collect()
}

impl MetricsSink for RecorderSink {
    fn increment_counter(&self, name: &'static str, labels: &Labels) {
        metrics::counter!(name, to_labels(labels)).increment(1);
    }

    fn record_duration(&self, name: &'static str, labels: &Labels, duration: Duration) {
        metrics::histogram!(name, to_labels(labels)).record(duration.as_secs_f64());
    }
}

/// Install the Prometheus recorder and serve `/metrics` on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}
