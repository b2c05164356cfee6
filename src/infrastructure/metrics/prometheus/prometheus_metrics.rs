//! Prometheus metrics implementation.
//!
//! Delegates to the sibling `counters.rs` and `recorder.rs` modules, which
//! talk to the global `metrics` crate registry. Metrics are registered on
//! first use and a single global handle renders them in Prometheus text format.

use crate::domain::Metrics;
use std::time::Instant;

/// Prometheus-based metrics implementation.
///
/// Empty because all state lives in the global registry behind the
/// `counter!()` and `histogram!()` macros.
pub struct PrometheusMetrics {
    // Empty - uses global metrics registry pattern
}

impl PrometheusMetrics {
    pub fn new() -> Self {
        tracing::info!("Creating Prometheus metrics");
        PrometheusMetrics {}
    }
}

impl Metrics for PrometheusMetrics {
    fn render(&self) -> String {
        super::render_metrics()
    }

    fn record_user_registered(&self) {
        tracing::debug!("Recording user registered event");
        super::increment_user_registered();
    }

    fn record_login(&self, success: bool) {
        super::increment_login(if success { "success" } else { "failure" });
    }

    fn record_rate_limited(&self, action: &str) {
        tracing::debug!("Recording rate-limit rejection for {}", action);
        super::increment_rate_limited(action);
    }

    fn record_http_request(&self, start: Instant, path: &str, method: &str, status: u16) {
        super::track_http_request(start, path, method, status);
    }
}
