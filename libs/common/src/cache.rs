//! Redis cache module for the ticket tracker
//!
//! Connects to Redis and exposes the counter operations the tracker needs.
//! Keys written here never expire.

use anyhow::Result;
use redis::{AsyncCommands, Client};
use tracing::info;

/// Configuration for Redis connection
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis connection URL (e.g., "redis://localhost:6379")
    pub url: String,
}

impl RedisConfig {
    /// Read `REDIS_URL`; `None` when it is unset or blank.
    pub fn from_env_if_set() -> Option<Self> {
        std::env::var("REDIS_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .map(|url| RedisConfig { url })
    }
}

/// Redis connection pool
#[derive(Clone)]
pub struct RedisPool {
    client: Client,
}

impl RedisPool {
    /// Parse the URL. No connection is made until the first command, so
    /// callers that need a live server should follow up with
    /// [`RedisPool::health_check`].
    pub async fn new(config: &RedisConfig) -> Result<Self> {
        let client = Client::open(config.url.clone())?;
        info!("Redis client initialized with URL: {}", config.url);
        Ok(RedisPool { client })
    }

    async fn get_connection(&self) -> Result<redis::aio::MultiplexedConnection> {
        let conn = self.client.get_multiplexed_async_connection().await?;
        Ok(conn)
    }

    /// Get a value from Redis by key
    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.get_connection().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    /// Atomically add `by` to an integer key, creating it at zero first.
    /// The key never expires.
    pub async fn incr(&self, key: &str, by: i64) -> Result<i64> {
        let mut conn = self.get_connection().await?;
        let value: i64 = conn.incr(key, by).await?;
        Ok(value)
    }

    /// Delete a key from Redis
    pub async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.get_connection().await?;
        let _: u64 = conn.del(key).await?;
        Ok(())
    }

    /// Check if Redis is reachable
    pub async fn health_check(&self) -> Result<bool> {
        let mut conn = self.get_connection().await?;
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(pong == "PONG")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_from_env_if_set_ignores_blank_url() {
        unsafe {
            std::env::set_var("REDIS_URL", "  ");
        }
        assert!(RedisConfig::from_env_if_set().is_none());

        unsafe {
            std::env::set_var("REDIS_URL", "redis://cache:6379");
        }
        let config = RedisConfig::from_env_if_set().expect("url is set");
        assert_eq!(config.url, "redis://cache:6379");

        unsafe {
            std::env::remove_var("REDIS_URL");
        }
        assert!(RedisConfig::from_env_if_set().is_none());
    }

    #[tokio::test]
    #[ignore = "requires a running Redis instance"]
    async fn test_incr_get_delete() -> Result<()> {
        let config = RedisConfig::from_env_if_set().expect("REDIS_URL must be set");
        let pool = RedisPool::new(&config).await?;
        let key = "test_counter";
        pool.delete(key).await?;

        assert_eq!(pool.incr(key, 1).await?, 1);
        assert_eq!(pool.incr(key, 2).await?, 3);
        assert_eq!(pool.get(key).await?, Some("3".to_string()));

        pool.delete(key).await?;
        assert_eq!(pool.get(key).await?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_health_check_fails_without_server() {
        // Nothing listens on port 1; the URL still parses.
        let config = RedisConfig {
            url: "redis://127.0.0.1:1".to_string(),
        };
        let pool = RedisPool::new(&config).await.unwrap();
        assert!(pool.health_check().await.is_err());
    }
}
