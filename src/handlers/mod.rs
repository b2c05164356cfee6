// Handlers module - controls public API for the router
// Modules are private, only exported symbols are public

mod auth;
mod extractors;
mod health;
mod metrics;
mod root;

// Core handlers
pub use health::health_check;
pub use metrics::{metrics_handler, track_http_metrics};
pub use root::root_handler;

// Auth handlers
pub use auth::{login, me, register};

// Extractors
pub use extractors::{ClientAddr, CurrentUser};
