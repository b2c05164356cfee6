use std::sync::Arc;
use std::time::Instant;

/// Abstraction for application metrics (counters, histograms).
pub trait Metrics: Send + Sync + 'static {
    // ---
    /// Render current metrics in Prometheus text format.
    fn render(&self) -> String;

    /// Record a successful registration.
    fn record_user_registered(&self);

    /// Record a login attempt that reached credential verification.
    fn record_login(&self, success: bool);

    /// Record a request rejected by the rate limiter for `action`.
    fn record_rate_limited(&self, action: &str);

    /// Record HTTP request duration and labels.
    fn record_http_request(&self, start: Instant, path: &str, method: &str, status: u16);
}

/// Type alias for any backend that implements Metrics.
pub type MetricsPtr = Arc<dyn Metrics>;
