//! Redis-backed fixed-window rate limiting.
//!
//! Each window is one Redis key holding the counter, with a TTL equal to the
//! window length. A Lua script makes increment, expiry, and TTL lookup one
//! atomic step on the server.

use crate::domain::{RateLimitError, RateLimitStore};
use anyhow::Context;
use redis::{AsyncCommands, Client, Script};
use std::time::Duration;

const KEY_PREFIX: &str = "turnos:ratelimit:";

// Returns {count, ttl_seconds}. The window starts on the first increment.
const CHECK_SCRIPT: &str = r#"
local count = redis.call('INCR', KEYS[1])
if count == 1 then
    redis.call('EXPIRE', KEYS[1], ARGV[1])
end
local ttl = redis.call('TTL', KEYS[1])
if ttl < 0 then
    redis.call('EXPIRE', KEYS[1], ARGV[1])
    ttl = tonumber(ARGV[1])
end
return {count, ttl}
"#;

pub struct RedisRateLimitStore {
    // ---
    client: Client,
    script: Script,
}

impl RedisRateLimitStore {
    // ---
    pub fn new(url: &str) -> anyhow::Result<Self> {
        // ---
        let client = Client::open(url).context("Invalid Redis URL")?;
        Ok(Self {
            client,
            script: Script::new(CHECK_SCRIPT),
        })
    }

    async fn get_conn(&self) -> anyhow::Result<redis::aio::MultiplexedConnection> {
        // ---
        self.client
            .get_multiplexed_async_connection()
            .await
            .context("Failed to connect to Redis")
    }
}

fn redis_key(key: &str) -> String {
    format!("{KEY_PREFIX}{key}")
}

fn window_secs(window: Duration) -> u64 {
    window.as_secs().max(1)
}

#[async_trait::async_trait]
impl RateLimitStore for RedisRateLimitStore {
    // ---
    async fn check_and_increment(
        &self,
        key: &str,
        limit: u32,
        window: Duration,
    ) -> Result<(), RateLimitError> {
        // ---
        let mut conn = self.get_conn().await?;

        let (count, ttl): (i64, i64) = self
            .script
            .key(redis_key(key))
            .arg(window_secs(window))
            .invoke_async(&mut conn)
            .await
            .context("Rate-limit script failed")?;

        if count > i64::from(limit) {
            return Err(RateLimitError::Exceeded {
                retry_after_secs: ttl.max(0) as u64,
            });
        }

        Ok(())
    }

    async fn ping(&self) -> anyhow::Result<()> {
        // ---
        let mut conn = self.get_conn().await?;
        let _: String = conn.ping().await.context("Redis ping failed")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn keys_are_namespaced() {
        assert_eq!(redis_key("login:10.0.0.1"), "turnos:ratelimit:login:10.0.0.1");
    }

    #[test]
    fn sub_second_windows_round_up() {
        assert_eq!(window_secs(Duration::from_millis(200)), 1);
        assert_eq!(window_secs(Duration::from_secs(60)), 60);
    }

    #[test]
    fn invalid_url_is_rejected() {
        assert!(RedisRateLimitStore::new("not a url").is_err());
    }

    #[tokio::test]
    #[ignore = "requires a running Redis server at TURNOS_REDIS_URL"]
    async fn enforces_limit_against_live_server() {
        // ---
        let url = std::env::var("TURNOS_REDIS_URL")
            .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
        let store = RedisRateLimitStore::new(&url).unwrap();
        let key = format!("test:{}", std::process::id());
        let window = Duration::from_secs(60);

        for _ in 0..3 {
            store.check_and_increment(&key, 3, window).await.unwrap();
        }

        match store.check_and_increment(&key, 3, window).await {
            Err(RateLimitError::Exceeded { retry_after_secs }) => {
                assert!(retry_after_secs <= 60)
            }
            other => panic!("expected Exceeded, got {other:?}"),
        }
    }
}
