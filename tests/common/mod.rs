// Test helpers are intentionally partially used
#![allow(dead_code)]

use axum::body::{to_bytes, Body};
use axum::extract::ConnectInfo;
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use reqwest::Client;
use serde_json::Value;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::time::sleep;
use tower::ServiceExt;
use turnos_auth::{
    create_router_with_config, AppConfig, AuthConfig, RateLimitBackend, RateLimitConfig,
    ServerConfig,
};

pub const TEST_SECRET: &str = "integration-test-secret";

// ============================================================================
// Test Setup
// ============================================================================

/// In-memory backends, minimum bcrypt cost, one-hour tokens, five auth
/// attempts per minute.
pub fn test_config() -> AppConfig {
    // ---
    AppConfig {
        auth: AuthConfig {
            secret_key: TEST_SECRET.to_string(),
            access_token_ttl: Duration::from_secs(60 * 60),
            bcrypt_cost: 4,
        },
        rate_limit: RateLimitConfig {
            auth_per_window: 5,
            api_per_window: 60,
            window: Duration::from_secs(60),
            backend: RateLimitBackend::Memory,
        },
        database: None,
        server: ServerConfig::default(),
    }
}

pub async fn test_app() -> Router {
    // ---
    test_app_with(test_config()).await
}

pub async fn test_app_with(config: AppConfig) -> Router {
    // ---
    create_router_with_config(&config)
        .await
        .expect("Should be able to create router")
}

// ============================================================================
// In-process requests
// ============================================================================

/// Response parts collected for assertions. `body` is `Null` when the
/// response is not JSON.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
    pub text: String,
}

fn peer(ip: [u8; 4]) -> ConnectInfo<SocketAddr> {
    ConnectInfo(SocketAddr::from((ip, 40_000)))
}

pub fn json_request(method: Method, uri: &str, body: &Value, ip: [u8; 4]) -> Request<Body> {
    // ---
    let mut req = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    req.extensions_mut().insert(peer(ip));
    req
}

pub fn raw_request(uri: &str, body: &'static str, ip: [u8; 4]) -> Request<Body> {
    // ---
    let mut req = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap();
    req.extensions_mut().insert(peer(ip));
    req
}

pub fn get_request(uri: &str, authorization: Option<&str>, ip: [u8; 4]) -> Request<Body> {
    // ---
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    let mut req = builder.body(Body::empty()).unwrap();
    req.extensions_mut().insert(peer(ip));
    req
}

pub async fn send(app: &Router, req: Request<Body>) -> TestResponse {
    // ---
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8_lossy(&bytes).into_owned();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    TestResponse {
        status,
        headers,
        body,
        text,
    }
}

pub async fn register(app: &Router, email: &str, password: &str, ip: [u8; 4]) -> TestResponse {
    // ---
    let body = serde_json::json!({ "email": email, "password": password });
    send(app, json_request(Method::POST, "/auth/register", &body, ip)).await
}

pub async fn login(app: &Router, email: &str, password: &str, ip: [u8; 4]) -> TestResponse {
    // ---
    let body = serde_json::json!({ "email": email, "password": password });
    send(app, json_request(Method::POST, "/auth/login", &body, ip)).await
}

// ============================================================================
// Real socket server
// ============================================================================

pub struct TestServer {
    pub addr: SocketAddr,
    pub client: Client,
}

impl TestServer {
    // ---
    pub async fn new(config: AppConfig) -> Self {
        // --
        let app = test_app_with(config).await;
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        // Spawn the server in the background
        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .unwrap();
        });

        // Give the server a moment to start
        sleep(Duration::from_millis(100)).await;

        let client = Client::new();

        Self { addr, client }
    }

    pub fn url(&self, path: &str) -> String {
        // ---
        format!("http://{}{}", self.addr, path)
    }
}
