//! Prometheus-compatible metrics endpoint

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::state::AppState;

/// Metrics collector
#[derive(Debug)]
pub struct Metrics {
    /// Server start time
    start_time: Instant,
    /// Total requests processed
    request_count: RwLock<u64>,
    /// Requests by endpoint
    requests_by_endpoint: RwLock<std::collections::HashMap<String, u64>>,
    /// Relay requests served
    relay_requests: RwLock<u64>,
    /// Redirect hops chased across all relay requests
    relay_hops: RwLock<u64>,
    /// Body bytes streamed through the relay
    relay_bytes: RwLock<u64>,
    /// Requests denied by the rate limiter
    rate_limited: RwLock<u64>,
    /// Errors by type
    errors_by_type: RwLock<std::collections::HashMap<String, u64>>,
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            request_count: RwLock::new(0),
            requests_by_endpoint: RwLock::new(std::collections::HashMap::new()),
            relay_requests: RwLock::new(0),
            relay_hops: RwLock::new(0),
            relay_bytes: RwLock::new(0),
            rate_limited: RwLock::new(0),
            errors_by_type: RwLock::new(std::collections::HashMap::new()),
        }
    }

    /// Record a request
    pub fn record_request(&self, endpoint: &str) {
        *self.request_count.write() += 1;
        *self
            .requests_by_endpoint
            .write()
            .entry(endpoint.to_string())
            .or_insert(0) += 1;
    }

    /// Record a served relay request and the hops it took
    pub fn record_relay(&self, hops: usize) {
        *self.relay_requests.write() += 1;
        *self.relay_hops.write() += hops as u64;
    }

    /// Record body bytes streamed through the relay
    pub fn record_relay_bytes(&self, bytes: u64) {
        *self.relay_bytes.write() += bytes;
    }

    /// Record a rate-limiter denial
    pub fn record_rate_limited(&self) {
        *self.rate_limited.write() += 1;
    }

    /// Record error
    pub fn record_error(&self, error_type: &str) {
        *self
            .errors_by_type
            .write()
            .entry(error_type.to_string())
            .or_insert(0) += 1;
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Export metrics in Prometheus format
    pub fn export_prometheus(&self) -> String {
        let mut output = String::new();

        output.push_str("# HELP catalog_server_uptime_seconds Server uptime in seconds\n");
        output.push_str("# TYPE catalog_server_uptime_seconds counter\n");
        output.push_str(&format!(
            "catalog_server_uptime_seconds {}\n",
            self.uptime_secs()
        ));

        output.push_str(
            "\n# HELP catalog_server_start_time_seconds Server start time as Unix timestamp\n",
        );
        output.push_str("# TYPE catalog_server_start_time_seconds gauge\n");
        output.push_str(&format!(
            "catalog_server_start_time_seconds {}\n",
            std::time::SystemTime::UNIX_EPOCH
                .elapsed()
                .unwrap_or(Duration::ZERO)
                .as_secs()
                - self.uptime_secs()
        ));

        output.push_str("\n# HELP catalog_requests_total Total number of HTTP requests\n");
        output.push_str("# TYPE catalog_requests_total counter\n");
        output.push_str(&format!(
            "catalog_requests_total {}\n",
            *self.request_count.read()
        ));

        output.push_str("\n# HELP catalog_requests_by_endpoint Requests by endpoint\n");
        output.push_str("# TYPE catalog_requests_by_endpoint counter\n");
        for (endpoint, count) in self.requests_by_endpoint.read().iter() {
            output.push_str(&format!(
                "catalog_requests_by_endpoint{{endpoint=\"{}\"}} {}\n",
                endpoint, count
            ));
        }

        output.push_str("\n# HELP relay_requests_total Relay requests served\n");
        output.push_str("# TYPE relay_requests_total counter\n");
        output.push_str(&format!(
            "relay_requests_total {}\n",
            *self.relay_requests.read()
        ));

        output.push_str("\n# HELP relay_hops_total Redirect hops chased by the relay\n");
        output.push_str("# TYPE relay_hops_total counter\n");
        output.push_str(&format!("relay_hops_total {}\n", *self.relay_hops.read()));

        output.push_str("\n# HELP relay_bytes_total Body bytes streamed through the relay\n");
        output.push_str("# TYPE relay_bytes_total counter\n");
        output.push_str(&format!("relay_bytes_total {}\n", *self.relay_bytes.read()));

        output.push_str("\n# HELP rate_limited_total Requests denied by the rate limiter\n");
        output.push_str("# TYPE rate_limited_total counter\n");
        output.push_str(&format!(
            "rate_limited_total {}\n",
            *self.rate_limited.read()
        ));

        output.push_str("\n# HELP catalog_errors_total Total errors by type\n");
        output.push_str("# TYPE catalog_errors_total counter\n");
        for (error_type, count) in self.errors_by_type.read().iter() {
            output.push_str(&format!(
                "catalog_errors_total{{type=\"{}\"}} {}\n",
                error_type, count
            ));
        }

        output
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Metrics endpoint handler
pub async fn metrics_handler(State(state): State<Arc<AppState>>) -> Response {
    let prometheus_output = state.metrics.export_prometheus();

    (
        StatusCode::OK,
        [("Content-Type", "text/plain; version=0.0.4")],
        prometheus_output,
    )
        .into_response()
}
