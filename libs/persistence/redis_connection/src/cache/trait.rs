use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Serialize, de::DeserializeOwned};

use crate::core::value::{CacheValue, Json};

/// Failure talking to a cache backend. None of these mean "absent":
/// a missing key is `Ok(None)`.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache backend error: {0}")]
    Backend(String),

    #[error("Cache pool error: {0}")]
    Pool(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Cache operation timed out after {0:?}")]
    Timeout(Duration),
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self { Self::Backend(err.to_string()) }
}

impl From<deadpool_redis::PoolError> for CacheError {
    fn from(err: deadpool_redis::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Byte-level cache operations shared by every backend.
///
/// Kept free of generics so callers can hold `Arc<dyn CacheService>`;
/// typed access lives in [`CacheServiceExt`].
#[async_trait]
pub trait CacheService: Send + Sync {
    /// Returns `None` when the key is absent or expired.
    async fn get_raw(&self, key: &str) -> CacheResult<Option<Bytes>>;

    /// Stores `value` under `key`, replacing any previous entry, expiring
    /// after `ttl`.
    async fn set_raw(
        &self, key: &str, value: Bytes, ttl: Duration,
    ) -> CacheResult<()>;

    /// Removes `key`, reporting whether it was present. Removing an absent
    /// key succeeds with `false`.
    async fn delete(&self, key: &str) -> CacheResult<bool>;

    /// Removes every key matching a glob pattern (`*`, `?`, `[...]`).
    /// Returns the number of keys removed.
    async fn delete_pattern(&self, pattern: &str) -> CacheResult<u64>;

    fn backend_name(&self) -> &'static str;
}

#[async_trait]
pub trait CacheServiceExt: CacheService {
    /// Typed read. A stored payload that no longer decodes is reported as
    /// a `Deserialization` error, never as a miss.
    async fn get<T>(&self, key: &str) -> CacheResult<Option<T>>
    where
        T: DeserializeOwned + Serialize + Send + Sync,
    {
        match self.get_raw(key).await? {
            Some(bytes) => Ok(Some(Json::<T>::from_bytes(&bytes)?.inner())),
            None => Ok(None),
        }
    }

    async fn set<T>(
        &self, key: &str, value: &T, ttl: Duration,
    ) -> CacheResult<()>
    where
        T: DeserializeOwned + Serialize + Send + Sync,
    {
        let bytes = serde_json::to_vec(value)
            .map_err(|e| CacheError::Serialization(e.to_string()))?;
        self.set_raw(key, Bytes::from(bytes), ttl).await
    }
}

impl<C: CacheService + ?Sized> CacheServiceExt for C {}
