use metrics::{counter, histogram};
use std::time::Instant;

/// Increment the registered-users counter.
pub fn increment_user_registered() {
    counter!("auth_registrations_total").increment(1);
}

/// Increment the login counter for the given outcome.
pub fn increment_login(outcome: &'static str) {
    counter!("auth_logins_total", "outcome" => outcome).increment(1);
}

/// Increment the rate-limit rejection counter for an action.
pub fn increment_rate_limited(action: &str) {
    counter!("rate_limit_rejections_total", "action" => action.to_string()).increment(1);
}

/// Track HTTP request latency using a histogram.
pub fn track_http_request(start: Instant, path: &str, method: &str, status: u16) {
    let elapsed = start.elapsed();
    histogram!(
        "http_request_duration_seconds",
        "path" => path.to_string(),
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .record(elapsed);
}
