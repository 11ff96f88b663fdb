use std::{
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use bytes::Bytes;
use redis_connection::{CacheError, CacheResult, CacheService, MemoryCache};
use tokio::sync::Mutex;

/// One call made against a [`RecordingCache`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheOp {
    Get(String),
    Set(String, Duration),
    Delete(String),
    DeletePattern(String),
}

impl CacheOp {
    pub fn key(&self) -> &str {
        match self {
            Self::Get(key)
            | Self::Set(key, _)
            | Self::Delete(key)
            | Self::DeletePattern(key) => key,
        }
    }
}

/// A working [`MemoryCache`] that logs every call made through the
/// [`CacheService`] interface.
#[derive(Default)]
pub struct RecordingCache {
    inner: MemoryCache,
    ops: Mutex<Vec<CacheOp>>,
}

impl RecordingCache {
    pub fn new() -> Self { Self::default() }

    pub fn inner(&self) -> &MemoryCache { &self.inner }

    pub async fn ops(&self) -> Vec<CacheOp> { self.ops.lock().await.clone() }

    pub async fn clear_ops(&self) { self.ops.lock().await.clear(); }

    /// Whether a live entry exists, without recording a `Get`.
    pub async fn contains(&self, key: &str) -> bool {
        self.inner.contains(key).await
    }

    async fn record(&self, op: CacheOp) { self.ops.lock().await.push(op); }
}

#[async_trait]
impl CacheService for RecordingCache {
    async fn get_raw(&self, key: &str) -> CacheResult<Option<Bytes>> {
        self.record(CacheOp::Get(key.to_string())).await;
        self.inner.get_raw(key).await
    }

    async fn set_raw(
        &self, key: &str, value: Bytes, ttl: Duration,
    ) -> CacheResult<()> {
        self.record(CacheOp::Set(key.to_string(), ttl)).await;
        self.inner.set_raw(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> CacheResult<bool> {
        self.record(CacheOp::Delete(key.to_string())).await;
        self.inner.delete(key).await
    }

    async fn delete_pattern(&self, pattern: &str) -> CacheResult<u64> {
        self.record(CacheOp::DeletePattern(pattern.to_string())).await;
        self.inner.delete_pattern(pattern).await
    }

    fn backend_name(&self) -> &'static str { "recording" }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FailureMode {
    Error,
    Hang,
}

/// A cache whose every call fails, either immediately with a backend
/// error or by never completing.
pub struct FailingCache {
    mode: FailureMode,
    calls: AtomicUsize,
}

impl FailingCache {
    pub fn new() -> Self {
        Self {
            mode: FailureMode::Error,
            calls: AtomicUsize::new(0),
        }
    }

    /// Every call stays pending forever.
    pub fn hanging() -> Self {
        Self {
            mode: FailureMode::Hang,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }

    async fn fail<T>(&self) -> CacheResult<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.mode {
            FailureMode::Error => {
                Err(CacheError::Backend("cache is unreachable".to_string()))
            }
            FailureMode::Hang => std::future::pending().await,
        }
    }
}

impl Default for FailingCache {
    fn default() -> Self { Self::new() }
}

#[async_trait]
impl CacheService for FailingCache {
    async fn get_raw(&self, _key: &str) -> CacheResult<Option<Bytes>> {
        self.fail().await
    }

    async fn set_raw(
        &self, _key: &str, _value: Bytes, _ttl: Duration,
    ) -> CacheResult<()> {
        self.fail().await
    }

    async fn delete(&self, _key: &str) -> CacheResult<bool> {
        self.fail().await
    }

    async fn delete_pattern(&self, _pattern: &str) -> CacheResult<u64> {
        self.fail().await
    }

    fn backend_name(&self) -> &'static str { "failing" }
}
