use std::sync::Arc;
use std::time::Duration;

/// Outcome of a failed admission check.
#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    // ---
    /// The key used up its allowance for the current window.
    #[error("rate limit exceeded, retry after {retry_after_secs}s")]
    Exceeded { retry_after_secs: u64 },

    /// The backing store could not be consulted.
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Fixed-window request counter keyed by `"<action>:<client>"`.
///
/// A window starts on the first request for a key and lasts `window`. Every
/// call counts, including rejected ones, so sustained abuse stays throttled.
/// Bursts straddling a window boundary can reach `2 * limit`.
#[async_trait::async_trait]
pub trait RateLimitStore: Send + Sync {
    // ---
    /// Count one request against `key` and fail if the window allowance
    /// of `limit` is exceeded. The read-modify-write is atomic per key.
    async fn check_and_increment(
        &self,
        key: &str,
        limit: u32,
        window: Duration,
    ) -> Result<(), RateLimitError>;

    /// Connectivity check used by `/health?mode=full`.
    async fn ping(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Type alias for any backend that implements RateLimitStore.
pub type RateLimitStorePtr = Arc<dyn RateLimitStore>;
