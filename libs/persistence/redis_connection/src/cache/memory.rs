use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use moka::{Expiry, future::Cache};
use tracing::debug;

use super::{
    pattern::glob_match,
    r#trait::{CacheResult, CacheService},
};
use crate::config::MemoryConfig;

#[derive(Debug, Clone)]
struct Entry {
    value: Bytes,
    ttl: Duration,
}

/// Expires each entry after the TTL it was written with.
struct PerEntryTtl;

impl Expiry<String, Entry> for PerEntryTtl {
    fn expire_after_create(
        &self, _key: &String, value: &Entry, _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self, _key: &String, value: &Entry, _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// In-process cache backed by moka, used when no Redis is configured and
/// in tests. Entries honour the TTL passed to `set_raw`.
#[derive(Clone)]
pub struct MemoryCache {
    memory: Cache<String, Entry>,
    config: MemoryConfig,
}

impl MemoryCache {
    pub fn new(config: MemoryConfig) -> Self {
        let memory = Cache::builder()
            .max_capacity(config.capacity)
            .expire_after(PerEntryTtl)
            .build();
        Self { memory, config }
    }

    pub fn config(&self) -> &MemoryConfig { &self.config }

    /// Whether a live entry exists under `key`.
    pub async fn contains(&self, key: &str) -> bool {
        self.memory.get(key).await.is_some()
    }

    pub async fn clear(&self) {
        self.memory.invalidate_all();
        self.memory.run_pending_tasks().await;
    }
}

impl Default for MemoryCache {
    fn default() -> Self { Self::new(MemoryConfig::default()) }
}

#[async_trait]
impl CacheService for MemoryCache {
    async fn get_raw(&self, key: &str) -> CacheResult<Option<Bytes>> {
        Ok(self.memory.get(key).await.map(|entry| entry.value))
    }

    async fn set_raw(
        &self, key: &str, value: Bytes, ttl: Duration,
    ) -> CacheResult<()> {
        let ttl = if ttl.is_zero() { self.config.ttl() } else { ttl };
        self.memory
            .insert(key.to_string(), Entry { value, ttl })
            .await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<bool> {
        Ok(self.memory.remove(key).await.is_some())
    }

    async fn delete_pattern(&self, pattern: &str) -> CacheResult<u64> {
        let matching: Vec<String> = self
            .memory
            .iter()
            .filter(|(key, _)| glob_match(pattern, key))
            .map(|(key, _)| key.to_string())
            .collect();

        for key in &matching {
            self.memory.invalidate(key).await;
        }

        debug!("Deleted {} memory cache keys matching {}", matching.len(), pattern);
        Ok(matching.len() as u64)
    }

    fn backend_name(&self) -> &'static str { "memory" }
}
