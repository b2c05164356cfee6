pub(crate) mod database;
pub mod metrics;
pub(crate) mod rate_limit;

// Re-export the factory functions for easy access
pub use database::{create_memory_repository, create_postgres_repository};
pub use metrics::{create_noop_metrics, create_prom_metrics};
pub use rate_limit::{
    create_memory as create_memory_rate_limiter, create_redis as create_redis_rate_limiter,
};

// Concrete backends, for callers that wire state by hand
pub use database::{MemoryRepository, PostgresRepository};
pub use rate_limit::{Clock, MemoryRateLimitStore, RedisRateLimitStore, SystemClock};
