use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use crate::app_state::AppState;

#[derive(serde::Serialize)]
pub struct HealthResponse {
    status: &'static str,
}

#[derive(Deserialize)]
pub struct HealthQuery {
    mode: Option<String>,
}

/// Responds with the health status of the server.
///
/// - By default (no query parameters), performs a light check to confirm the web server
///   is running.
///
/// - If `mode=full` is passed as a query parameter, also pings the user repository and
///   the rate-limit store.
///
/// # Responses
/// - `200 OK` with `{ "status": "ok" }` if the server (and backends, in full mode) are healthy.
/// - `503 SERVICE UNAVAILABLE` with `{ "status": "error" }` if a backend check fails.
pub async fn health_check(
    State(state): State<AppState>,
    Query(params): Query<HealthQuery>,
) -> (StatusCode, Json<HealthResponse>) {
    // ---
    if params.mode.as_deref() != Some("full") {
        return (StatusCode::OK, Json(HealthResponse { status: "ok" }));
    }

    let gateway = state.gateway();

    if let Err(err) = gateway.repository().ping().await {
        tracing::error!("Repository health check failed: {:#}", err);
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse { status: "error" }),
        );
    }

    if let Err(err) = gateway.limiter().ping().await {
        tracing::error!("Rate-limit store health check failed: {:#}", err);
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse { status: "error" }),
        );
    }

    (StatusCode::OK, Json(HealthResponse { status: "ok" }))
}
