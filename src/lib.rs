// src/lib.rs
use anyhow::{Context, Result};
use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use handlers::{
    health_check, login, me, metrics_handler, register, root_handler, track_http_metrics,
};

// Public exports (visible outside this module)
pub mod domain;

// Internal-only exports (sibling access within this module)
mod app_state;
mod config;
mod credentials;
mod error;
mod gateway;
mod handlers;
mod infrastructure;
mod token;

// Hoist up only the public symbol(s)
pub use app_state::AppState;
pub use config::*;
pub use credentials::PasswordHasher;
pub use error::AppError;
pub use gateway::{
    AccessToken, AdmissionLimits, AuthGateway, LoginRequest, RegisterRequest, UserProfile,
    UserSummary,
};
pub use handlers::{ClientAddr, CurrentUser};
pub use token::{InvalidToken, IssuedToken, TokenService};

// Publicly expose the infrastructure creation functions
pub use infrastructure::{
    create_memory_rate_limiter, // ---
    create_memory_repository,
    create_noop_metrics,
    create_postgres_repository,
    create_prom_metrics,
    create_redis_rate_limiter,
    Clock,
    MemoryRateLimitStore,
    MemoryRepository,
    PostgresRepository,
    RedisRateLimitStore,
    SystemClock,
};

/// Install the global tracing subscriber, filtered by `RUST_LOG` (default `info`).
///
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing() {
    // ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).try_init().ok();
}

/// Build the HTTP router from environment configuration.
pub async fn create_router() -> Result<Router> {
    // ---
    init_tracing();

    let config = AppConfig::from_env()?;
    create_router_with_config(&config).await
}

/// Build the HTTP router from an explicit configuration.
pub async fn create_router_with_config(config: &AppConfig) -> Result<Router> {
    // ---
    let state = build_state(config).await?;
    build_router(state, &config.server)
}

/// Construct every backend named by `config` and wire them into an [`AppState`].
pub async fn build_state(config: &AppConfig) -> Result<AppState> {
    // ---
    let metrics = if config.server.metrics_type == "prom" {
        create_prom_metrics()?
    } else {
        create_noop_metrics()?
    };

    let repository = match &config.database {
        Some(db) => create_postgres_repository(db).await?,
        None => create_memory_repository(),
    };

    let limiter = match &config.rate_limit.backend {
        RateLimitBackend::Memory => create_memory_rate_limiter(),
        RateLimitBackend::Redis { url } => create_redis_rate_limiter(url)?,
    };

    let tokens = TokenService::new(&config.auth.secret_key, config.auth.access_token_ttl)?;
    let passwords = PasswordHasher::new(config.auth.bcrypt_cost);
    let limits = AdmissionLimits {
        auth_per_window: config.rate_limit.auth_per_window,
        api_per_window: config.rate_limit.api_per_window,
        window: config.rate_limit.window,
    };

    let gateway = AuthGateway::new(
        repository,
        limiter,
        tokens,
        passwords,
        limits,
        metrics.clone(),
    )?;

    tracing::info!(
        auth_limit = limits.auth_per_window,
        api_limit = limits.api_per_window,
        window_secs = limits.window.as_secs(),
        "Auth gateway ready"
    );

    Ok(AppState::new(gateway, metrics))
}

/// Assemble routes and middleware around an existing state.
pub fn build_router(app_state: AppState, server: &ServerConfig) -> Result<Router> {
    // ---
    let cors = cors_layer(&server.cors_origins)?;

    let router = Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .nest(
            "/auth",
            Router::new()
                .route("/register", post(register))
                .route("/login", post(login))
                .route("/me", get(me)),
        )
        .route("/users/me", get(me))
        .layer(middleware::from_fn_with_state(
            app_state.clone(),
            track_http_metrics,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(CatchPanicLayer::custom(error::handle_panic))
        .with_state(app_state);

    Ok(router)
}

fn cors_layer(origins: &[String]) -> Result<CorsLayer> {
    // ---
    let origins = origins
        .iter()
        .map(|o| {
            HeaderValue::from_str(o).with_context(|| format!("Invalid CORS origin: {o}"))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true))
}
