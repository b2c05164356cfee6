//! Application state management.
//!
//! This module defines the shared state structure that gets passed to all
//! Axum handlers via the `State` extractor. The `AppState` contains the auth
//! gateway (which owns the repository, rate-limit store, and token service)
//! and the metrics implementation.
//!
//! The state is cheaply cloneable (using `Arc` internally) so it can be passed
//! to each request handler without copying resources.

use crate::domain::MetricsPtr;
use crate::gateway::{AuthGateway, AuthGatewayPtr};
use std::sync::Arc;

/// Shared application state passed to all Axum handlers.
///
/// This struct serves as the Dependency Injection container for the application.
///
/// # Design Principles
///
/// - **Dependency Inversion**: Handlers depend on abstractions (`Repository`,
///   `RateLimitStore`, `Metrics`), not concrete backends.
/// - **Immutable After Initialization**: State is built once at startup. The
///   only mutable state, rate-limit windows, lives behind the store's own lock.
/// - **Cheap Cloning**: Everything is behind `Arc`.
///
/// # Lifecycle
///
/// 1. Created once in `build_state()` during application startup
/// 2. Attached to the Axum router via `.with_state(app_state)`
/// 3. Cloned automatically by Axum for each incoming HTTP request
/// 4. Handlers extract via `State(state): State<AppState>`
#[derive(Clone)]
pub struct AppState {
    /// Registration, login, and token-to-user resolution.
    gateway: AuthGatewayPtr,

    /// Metrics implementation for recording application events.
    ///
    /// Either Prometheus-backed (production) or no-op (testing/development).
    metrics: MetricsPtr,
}

impl AppState {
    // ---

    pub fn new(gateway: AuthGateway, metrics: MetricsPtr) -> Self {
        // ---
        AppState {
            gateway: Arc::new(gateway),
            metrics,
        }
    }

    /// Get a reference to the auth gateway.
    pub(crate) fn gateway(&self) -> &AuthGateway {
        // ---
        &self.gateway
    }

    /// Get a reference to the metrics implementation.
    pub(crate) fn metrics(&self) -> &MetricsPtr {
        // ---
        &self.metrics
    }
}
