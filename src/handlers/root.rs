use axum::response::IntoResponse;

pub async fn root_handler() -> impl IntoResponse {
    let version = env!("CARGO_PKG_VERSION");
    format!(
        r#"Turnos booking API is running 👋
Version: {version}

Available endpoints:
  - POST   /auth/register     - Create an account (email, password, full_name)
  - POST   /auth/login        - Exchange credentials for a bearer token
  - GET    /auth/me           - Current user profile (Authorization: Bearer <token>)
  - GET    /users/me          - Same as /auth/me
  - GET    /health            - Light health check
  - GET    /health?mode=full  - Full health check (includes storage backends)
  - GET    /metrics           - Prometheus metrics

Register and login are rate limited per client address; rejected requests
receive 429 with a Retry-After header.
"#
    )
}
