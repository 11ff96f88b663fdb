use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use deadpool_redis::Pool;
use redis::AsyncCommands;
use tracing::debug;

use super::r#trait::{CacheResult, CacheService};

const SCAN_BATCH: usize = 100;

/// Redis cache over a deadpool connection pool. Payloads are stored as
/// plain byte strings with a millisecond TTL.
#[derive(Clone)]
pub struct RedisCache {
    pool: Pool,
}

impl RedisCache {
    pub fn new(pool: Pool) -> Self { Self { pool } }

    pub fn pool(&self) -> &Pool { &self.pool }
}

#[async_trait]
impl CacheService for RedisCache {
    async fn get_raw(&self, key: &str) -> CacheResult<Option<Bytes>> {
        let mut conn = self.pool.get().await?;
        let value: Option<Vec<u8>> = conn.get(key).await?;
        Ok(value.map(Bytes::from))
    }

    async fn set_raw(
        &self, key: &str, value: Bytes, ttl: Duration,
    ) -> CacheResult<()> {
        let mut conn = self.pool.get().await?;
        let millis = ttl.as_millis().clamp(1, u64::MAX as u128) as u64;
        let _: () = conn.pset_ex(key, value.as_ref(), millis).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<bool> {
        let mut conn = self.pool.get().await?;
        let removed: u64 = conn.del(key).await?;
        Ok(removed > 0)
    }

    /// Walks the keyspace with `SCAN` so large databases are never blocked
    /// the way `KEYS` would.
    async fn delete_pattern(&self, pattern: &str) -> CacheResult<u64> {
        let mut conn = self.pool.get().await?;
        let mut cursor: u64 = 0;
        let mut deleted = 0;

        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await?;

            if !keys.is_empty() {
                let removed: u64 = conn.del(&keys).await?;
                deleted += removed;
            }

            if next == 0 {
                break;
            }
            cursor = next;
        }

        debug!("Deleted {} redis keys matching {}", deleted, pattern);
        Ok(deleted)
    }

    fn backend_name(&self) -> &'static str { "redis" }
}
