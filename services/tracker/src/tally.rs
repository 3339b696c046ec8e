//! Priority tally cache
//!
//! A display counter of tickets seen per priority. It only ever counts up:
//! deleting or completing a ticket does not decrement it, so it drifts from
//! the open-ticket table. Use [`PriorityTally::from_tickets`] when the exact
//! figure matters.

use async_trait::async_trait;
use common::cache::{RedisConfig, RedisPool};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::models::{Priority, PriorityTally};

/// Where the counters live between process restarts
#[async_trait]
pub trait TallyStorage: Send + Sync {
    async fn increment(&self, priority: Priority) -> anyhow::Result<()>;

    async fn load(&self) -> anyhow::Result<PriorityTally>;
}

/// Counters kept as plain Redis keys without expiry
pub struct RedisTallyStorage {
    redis_pool: RedisPool,
}

impl RedisTallyStorage {
    pub fn new(redis_pool: RedisPool) -> Self {
        Self { redis_pool }
    }

    fn key(priority: Priority) -> String {
        format!("tally:{}", priority.as_str().to_lowercase())
    }
}

#[async_trait]
impl TallyStorage for RedisTallyStorage {
    async fn increment(&self, priority: Priority) -> anyhow::Result<()> {
        self.redis_pool.incr(&Self::key(priority), 1).await?;
        Ok(())
    }

    async fn load(&self) -> anyhow::Result<PriorityTally> {
        let mut tally = PriorityTally::default();
        for priority in Priority::ALL {
            // A missing or unreadable key counts as zero.
            let count = self
                .redis_pool
                .get(&Self::key(priority))
                .await?
                .and_then(|value| value.parse().ok())
                .unwrap_or(0);
            tally.set(priority, count);
        }
        Ok(tally)
    }
}

/// Process-local counters, lost on restart
#[derive(Default)]
pub struct MemoryTallyStorage {
    tally: Mutex<PriorityTally>,
}

#[async_trait]
impl TallyStorage for MemoryTallyStorage {
    async fn increment(&self, priority: Priority) -> anyhow::Result<()> {
        self.tally.lock().await.observe(priority);
        Ok(())
    }

    async fn load(&self) -> anyhow::Result<PriorityTally> {
        Ok(*self.tally.lock().await)
    }
}

/// Best-effort tally cache; storage failures are logged and swallowed.
#[derive(Clone)]
pub struct TallyCache {
    storage: Arc<dyn TallyStorage>,
}

impl TallyCache {
    pub fn new(storage: Arc<dyn TallyStorage>) -> Self {
        Self { storage }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryTallyStorage::default()))
    }

    /// Redis-backed when the server answers `PING`, in memory otherwise
    pub async fn connect(redis_config: &RedisConfig) -> Self {
        let redis_pool = match RedisPool::new(redis_config).await {
            Ok(redis_pool) => redis_pool,
            Err(e) => {
                warn!("Invalid Redis URL, keeping priority tally in memory: {}", e);
                return Self::in_memory();
            }
        };

        match redis_pool.health_check().await {
            Ok(true) => {
                info!("Priority tally stored in Redis");
                Self::new(Arc::new(RedisTallyStorage::new(redis_pool)))
            }
            Ok(false) => {
                warn!("Redis did not answer PING, keeping priority tally in memory");
                Self::in_memory()
            }
            Err(e) => {
                warn!("Redis unreachable, keeping priority tally in memory: {}", e);
                Self::in_memory()
            }
        }
    }

    /// Count a newly observed ticket
    pub async fn observe(&self, priority: Priority) {
        if let Err(e) = self.storage.increment(priority).await {
            warn!("Failed to update priority tally for {}: {}", priority, e);
        }
    }

    /// Current counters, all zero when the storage cannot be read
    pub async fn snapshot(&self) -> PriorityTally {
        match self.storage.load().await {
            Ok(tally) => tally,
            Err(e) => {
                warn!("Failed to read priority tally: {}", e);
                PriorityTally::default()
            }
        }
    }
}
