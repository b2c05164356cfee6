mod memory;
mod redis_store;

pub use memory::{Clock, MemoryRateLimitStore, SystemClock};
pub use redis_store::RedisRateLimitStore;

use crate::domain::RateLimitStorePtr;
use std::sync::Arc;

/// Creates the in-process rate-limit store.
///
/// Windows live for the lifetime of the process and are lost on restart.
pub fn create_memory() -> RateLimitStorePtr {
    // ---
    Arc::new(MemoryRateLimitStore::new())
}

/// Creates a Redis-backed rate-limit store shared by every process that
/// points at the same server.
pub fn create_redis(url: &str) -> anyhow::Result<RateLimitStorePtr> {
    // ---
    tracing::info!("Using Redis rate-limit store");
    Ok(Arc::new(RedisRateLimitStore::new(url)?))
}
