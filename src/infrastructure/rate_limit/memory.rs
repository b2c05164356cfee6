//! In-memory fixed-window rate limiting.
//!
//! All windows sit in one map behind a `parking_lot::Mutex`; the lock is held
//! only for the read-modify-write of a single key and never across an await.
//! Time comes from a monotonic [`Clock`], so wall-clock adjustments cannot
//! reset a window early.

use crate::domain::{RateLimitError, RateLimitStore};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Map size above which expired windows are swept on the next check.
const PURGE_THRESHOLD: usize = 10_000;

/// Monotonic time source.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// [`Clock`] backed by `Instant::now()`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

struct RateWindow {
    count: u32,
    reset_at: Instant,
}

/// Process-local [`RateLimitStore`].
pub struct MemoryRateLimitStore {
    // ---
    clock: Arc<dyn Clock>,
    windows: Mutex<HashMap<String, RateWindow>>,
}

impl MemoryRateLimitStore {
    // ---
    pub fn new() -> Self {
        // ---
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        // ---
        Self {
            clock,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Synchronous core of [`RateLimitStore::check_and_increment`].
    pub fn check(&self, key: &str, limit: u32, window: Duration) -> Result<(), RateLimitError> {
        // ---
        let now = self.clock.now();
        let mut windows = self.windows.lock();

        if windows.len() > PURGE_THRESHOLD {
            windows.retain(|_, w| now <= w.reset_at);
        }

        let entry = windows.entry(key.to_string()).or_insert(RateWindow {
            count: 0,
            reset_at: now + window,
        });

        if now > entry.reset_at {
            entry.count = 0;
            entry.reset_at = now + window;
        }

        entry.count = entry.count.saturating_add(1);

        if entry.count > limit {
            let remaining = entry.reset_at.saturating_duration_since(now);
            return Err(RateLimitError::Exceeded {
                retry_after_secs: ceil_secs(remaining),
            });
        }

        Ok(())
    }

    /// Drop windows that have already expired.
    pub fn purge_expired(&self) {
        // ---
        let now = self.clock.now();
        self.windows.lock().retain(|_, w| now <= w.reset_at);
    }

    /// Number of keys currently tracked.
    pub fn tracked_keys(&self) -> usize {
        // ---
        self.windows.lock().len()
    }
}

impl Default for MemoryRateLimitStore {
    fn default() -> Self {
        Self::new()
    }
}

fn ceil_secs(d: Duration) -> u64 {
    if d.subsec_nanos() > 0 {
        d.as_secs() + 1
    } else {
        d.as_secs()
    }
}

#[async_trait::async_trait]
impl RateLimitStore for MemoryRateLimitStore {
    // ---
    async fn check_and_increment(
        &self,
        key: &str,
        limit: u32,
        window: Duration,
    ) -> Result<(), RateLimitError> {
        // ---
        self.check(key, limit, window)
    }
}
