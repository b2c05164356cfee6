// src/config.rs

//! Application configuration loaded from environment variables.
//!
//! This module defines all startup-time configuration for the service.
//! Configuration is validated eagerly and failures are treated as
//! deployment errors rather than recoverable runtime conditions.

use anyhow::Result;
use std::time::Duration;

// ============================================================
// Local macros (config-only, intentionally explicit)
// ============================================================

/// Reads a required environment variable.
///
/// # Behavior
/// - Fails fast if the variable is missing
/// - Produces a clear, human-readable error message
/// - Intended for startup-time configuration validation
macro_rules! required_env {
    // ---
    ($key:literal) => {
        std::env::var($key)
            .map_err(|_| anyhow::anyhow!(concat!("Missing required configuration: ", $key)))?
    };
}

/// Reads an optional environment variable and attempts to parse it.
///
/// If the variable is missing or cannot be parsed, the provided
/// default value is used. This macro is appropriate for non-critical
/// tuning parameters where fallback behavior is acceptable.
macro_rules! optional_env_parse {
    // ---
    ($key:literal, $ty:ty, $default:expr) => {
        std::env::var($key)
            .ok()
            .and_then(|v| v.parse::<$ty>().ok())
            .unwrap_or($default)
    };
}

#[cfg(test)]
/// Asserts that a configuration constructor fails due to a missing
/// required environment variable.
macro_rules! assert_missing_config {
    // ---
    ($expr:expr, $key:literal) => {{
        let err = $expr.expect_err("expected configuration error");
        assert!(
            err.to_string()
                .contains(concat!("Missing required configuration: ", $key)),
            "unexpected error: {err}"
        );
    }};
}

// ============================================================
// Public configuration facade
// ============================================================

/// Aggregated application configuration.
///
/// This is the single source of truth for startup configuration.
/// All required configuration is validated eagerly during initialization.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub auth: auth::AuthConfig,
    pub rate_limit: rate_limit::RateLimitConfig,
    /// `None` selects the in-memory user repository.
    pub database: Option<database::DatabaseConfig>,
    pub server: server::ServerConfig,
}

impl AppConfig {
    /// Loads and validates all application configuration from the environment.
    ///
    /// # Errors
    /// Returns an error if any required configuration is missing or invalid.
    /// This function is intended to be called exactly once at startup.
    pub fn from_env() -> Result<Self> {
        // ---
        let database = match std::env::var("DATABASE_URL") {
            Ok(_) => Some(database::DatabaseConfig::from_env()?),
            Err(_) => None,
        };

        Ok(Self {
            auth: auth::AuthConfig::from_env()?,
            rate_limit: rate_limit::RateLimitConfig::from_env()?,
            database,
            server: server::ServerConfig::from_env(),
        })
    }
}

// ============================================================
// Auth configuration
// ============================================================

mod auth {
    // ---
    use super::*;

    /// Token signing and password hashing parameters.
    #[derive(Clone)]
    pub struct AuthConfig {
        /// HMAC secret for access tokens. Never rotated at runtime.
        pub secret_key: String,

        /// Access token lifetime. Defaults to 60 minutes.
        pub access_token_ttl: Duration,

        /// bcrypt work factor. Defaults to 12; clamped to bcrypt's 4..=31.
        pub bcrypt_cost: u32,
    }

    // Keeps the secret out of `{:?}` output.
    impl std::fmt::Debug for AuthConfig {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("AuthConfig")
                .field("secret_key", &"<redacted>")
                .field("access_token_ttl", &self.access_token_ttl)
                .field("bcrypt_cost", &self.bcrypt_cost)
                .finish()
        }
    }

    impl AuthConfig {
        /// Builds an [`AuthConfig`] from environment variables.
        ///
        /// # Errors
        /// Fails if `SECRET_KEY` is missing or empty.
        pub fn from_env() -> Result<Self> {
            // ---
            let secret_key = required_env!("SECRET_KEY");
            if secret_key.is_empty() {
                anyhow::bail!("Invalid configuration: SECRET_KEY must not be empty");
            }

            let ttl_minutes = optional_env_parse!("ACCESS_TOKEN_EXPIRE_MINUTES", u64, 60);
            let bcrypt_cost = optional_env_parse!("TURNOS_BCRYPT_COST", u32, bcrypt::DEFAULT_COST);

            let ttl_secs = ttl_minutes.checked_mul(60).ok_or_else(|| {
                anyhow::anyhow!("Invalid configuration: ACCESS_TOKEN_EXPIRE_MINUTES is too large")
            })?;

            Ok(Self {
                secret_key,
                access_token_ttl: Duration::from_secs(ttl_secs),
                bcrypt_cost: bcrypt_cost.clamp(4, 31),
            })
        }
    }
}
pub use auth::AuthConfig;

// ============================================================
// Rate-limit configuration
// ============================================================

mod rate_limit {
    // ---
    use super::*;

    /// Where rate-limit windows are kept.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum RateLimitBackend {
        /// Process-local map; lost on restart.
        Memory,
        /// Shared Redis server.
        Redis { url: String },
    }

    /// Admission thresholds for throttled endpoints.
    #[derive(Debug, Clone)]
    pub struct RateLimitConfig {
        /// Register and login requests per client per window. Defaults to 5.
        pub auth_per_window: u32,

        /// `/me` requests per client per window. Defaults to 60.
        pub api_per_window: u32,

        /// Fixed window length. Defaults to 60 seconds.
        pub window: Duration,

        pub backend: RateLimitBackend,
    }

    impl RateLimitConfig {
        /// Builds a [`RateLimitConfig`] from environment variables.
        ///
        /// # Errors
        /// Fails if the Redis backend is selected without `TURNOS_REDIS_URL`,
        /// or the backend name is unknown.
        pub fn from_env() -> Result<Self> {
            // ---
            let auth_per_window = optional_env_parse!("RATE_LIMIT_AUTH_PER_MIN", u32, 5);
            let api_per_window = optional_env_parse!("RATE_LIMIT_API_PER_MIN", u32, 60);
            let window_secs = optional_env_parse!("RATE_LIMIT_WINDOW_SEC", u64, 60);

            let backend = match std::env::var("TURNOS_RATE_LIMIT_STORE").as_deref() {
                Err(_) | Ok("memory") => RateLimitBackend::Memory,
                Ok("redis") => RateLimitBackend::Redis {
                    url: required_env!("TURNOS_REDIS_URL"),
                },
                Ok(other) => anyhow::bail!(
                    "Invalid configuration: TURNOS_RATE_LIMIT_STORE must be 'memory' or 'redis', got '{other}'"
                ),
            };

            Ok(Self {
                auth_per_window,
                api_per_window,
                window: Duration::from_secs(window_secs.max(1)),
                backend,
            })
        }
    }
}
pub use rate_limit::{RateLimitBackend, RateLimitConfig};

// ============================================================
// Database configuration
// ============================================================

mod database {
    // ---
    use super::*;

    /// Database-related configuration derived from environment variables.
    #[derive(Debug, Clone)]
    pub struct DatabaseConfig {
        /// PostgreSQL connection string.
        pub database_url: String,

        /// Number of retry attempts when initializing the database connection. Defaults to 50.
        pub retry_count: u32,

        /// Maximum time to wait when acquiring a connection from the pool. Defaults to 30 seconds.
        pub acquire_timeout: Duration,

        /// Minimum number of connections to keep in the pool, even when idle. Defaults to 2.
        pub min_connections: u32,

        /// Maximum number of connections to be open concurrently. Defaults to 15
        pub max_connections: u32,
    }

    impl DatabaseConfig {
        /// Builds a [`DatabaseConfig`] from environment variables.
        ///
        /// # Errors
        /// Returns an error if `DATABASE_URL` is missing.
        pub fn from_env() -> Result<Self> {
            // ---
            let database_url = required_env!("DATABASE_URL");
            let retry_count = optional_env_parse!("TURNOS_DB_RETRY_COUNT", u32, 50);
            let acquire_timeout_secs = optional_env_parse!("TURNOS_DB_ACQUIRE_TIMEOUT_SEC", u64, 30);
            let min_connections = optional_env_parse!("TURNOS_DB_MIN_CONNECTIONS", u32, 2);
            let max_connections = optional_env_parse!("TURNOS_DB_MAX_CONNECTIONS", u32, 15);

            Ok(Self {
                database_url,
                retry_count,
                acquire_timeout: Duration::from_secs(acquire_timeout_secs),
                min_connections,
                max_connections,
            })
        }
    }
}
pub use database::DatabaseConfig;

// ============================================================
// Server configuration
// ============================================================

mod server {
    // ---

    /// HTTP surface settings. Every field has a default.
    #[derive(Debug, Clone)]
    pub struct ServerConfig {
        /// Listen address. Defaults to `127.0.0.1:8080`.
        pub bind_addr: String,

        /// Origins allowed by CORS. Defaults to the Vite dev server.
        pub cors_origins: Vec<String>,

        /// `prom` or `noop`. Defaults to `noop`.
        pub metrics_type: String,
    }

    impl ServerConfig {
        pub fn from_env() -> Self {
            // ---
            let bind_addr = std::env::var("TURNOS_BIND_ADDR")
                .unwrap_or_else(|_| "127.0.0.1:8080".to_string());

            let cors_origins = std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:5173".to_string())
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect();

            let metrics_type =
                std::env::var("TURNOS_METRICS_TYPE").unwrap_or_else(|_| "noop".to_string());

            Self {
                bind_addr,
                cors_origins,
                metrics_type,
            }
        }
    }

    impl Default for ServerConfig {
        fn default() -> Self {
            Self {
                bind_addr: "127.0.0.1:8080".to_string(),
                cors_origins: vec!["http://localhost:5173".to_string()],
                metrics_type: "noop".to_string(),
            }
        }
    }
}
pub use server::ServerConfig;

// ============================================================
// Tests
// ============================================================
