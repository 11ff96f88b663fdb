//! Cache-aside front for a user store.
//!
//! Reads try the cache first and fall back to the wrapped store, filling
//! the cache on the way out. Writes go to the store first and then remove
//! the cache entries they made stale. The cache is never required: every
//! cache failure is logged and the operation carries on as if the entry
//! were missing.

use std::{future::Future, sync::Arc, time::Duration};

use async_trait::async_trait;
use database_traits::GenericDao;
use redis_connection::{CacheError, CacheService, CacheServiceExt};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};
use user_errors::UserError;
use user_models::{User, UserPayload};
use user_store::UserStore;

mod commands;
mod config;
mod outcome;
mod queries;

pub use config::CachedStoreConfig;
pub use outcome::CacheOutcome;

/// A [`UserStore`] that caches another [`UserStore`].
///
/// Keys: `user:<id>` holds one user for `user_ttl`, `users:all` holds the
/// full listing for `list_ttl`. Lookups that end in `NotFound` are never
/// cached.
///
/// There is no ordering between a write's invalidation and a concurrent
/// read's cache fill for the same id. A read that fetched the old row
/// before the write committed can store it right after the write deleted
/// the key, leaving stale data until the entry's TTL runs out. The
/// staleness window is therefore bounded by `user_ttl` (and `list_ttl`
/// for the listing).
pub struct CachedUserStore<S> {
    store: S,
    cache: Arc<dyn CacheService>,
    config: CachedStoreConfig,
}

/// What a bounded store call produced.
enum StoreReply<T> {
    Reply(Result<T, UserError>),
    TimedOut(Duration),
}

impl<S: UserStore> CachedUserStore<S> {
    pub fn new(
        store: S, cache: Arc<dyn CacheService>, config: CachedStoreConfig,
    ) -> Self {
        Self {
            store,
            cache,
            config,
        }
    }

    pub fn store(&self) -> &S { &self.store }

    pub fn cache(&self) -> &Arc<dyn CacheService> { &self.cache }

    pub fn config(&self) -> &CachedStoreConfig { &self.config }

    async fn bounded_cache<T>(
        &self, call: impl Future<Output = Result<T, CacheError>>,
    ) -> CacheOutcome<T> {
        let limit = self.config.cache_timeout();
        match tokio::time::timeout(limit, call).await {
            Ok(result) => result.into(),
            Err(_) => CacheOutcome::Degraded(CacheError::Timeout(limit)),
        }
    }

    async fn cache_get<T>(&self, key: &str) -> Option<T>
    where
        T: DeserializeOwned + Serialize + Send + Sync,
    {
        self.bounded_cache(self.cache.get::<T>(key))
            .await
            .settle("get", key)
            .flatten()
    }

    async fn cache_set<T>(&self, key: &str, value: &T, ttl: Duration)
    where
        T: DeserializeOwned + Serialize + Send + Sync,
    {
        let _ = self
            .bounded_cache(self.cache.set(key, value, ttl))
            .await
            .settle("set", key);
    }

    /// Deletes `keys` on a detached task and waits for it, so dropping
    /// the calling future after a committed write still lets the
    /// invalidation finish.
    async fn invalidate(&self, keys: Vec<String>) {
        let task = tokio::spawn(delete_keys(
            Arc::clone(&self.cache),
            keys,
            self.config.cache_timeout(),
        ));

        if let Err(e) = task.await {
            warn!(error = %e, "Cache invalidation task failed");
        }
    }

    async fn call_store<T>(
        &self, call: impl Future<Output = Result<T, UserError>>,
    ) -> StoreReply<T> {
        match self.config.store_timeout() {
            Some(limit) => {
                match tokio::time::timeout(limit, call).await {
                    Ok(result) => StoreReply::Reply(result),
                    Err(_) => StoreReply::TimedOut(limit),
                }
            }
            None => StoreReply::Reply(call.await),
        }
    }

    /// Store call for reads: a timeout is simply `Unavailable`.
    async fn read_store<T>(
        &self, call: impl Future<Output = Result<T, UserError>>,
    ) -> Result<T, UserError> {
        match self.call_store(call).await {
            StoreReply::Reply(result) => result,
            StoreReply::TimedOut(limit) => {
                Err(UserError::unavailable(format!(
                    "user store did not answer within {limit:?}"
                )))
            }
        }
    }

    /// Store call for writes, followed by removal of `stale_keys` once
    /// the store reports success.
    ///
    /// A write whose outcome is unknown also removes them: one that timed
    /// out, and one whose future was dropped while the store call was in
    /// flight. Failed writes leave the cache alone.
    async fn write_store<T>(
        &self, call: impl Future<Output = Result<T, UserError>>,
        stale_keys: Vec<String>,
    ) -> Result<T, UserError> {
        let guard = InvalidateOnDrop {
            cache: Arc::clone(&self.cache),
            keys: Some(stale_keys),
            limit: self.config.cache_timeout(),
        };
        let reply = self.call_store(call).await;
        let stale_keys = guard.disarm();

        match reply {
            StoreReply::Reply(Ok(value)) => {
                self.invalidate(stale_keys).await;
                Ok(value)
            }
            StoreReply::Reply(Err(e)) => Err(e),
            StoreReply::TimedOut(limit) => {
                warn!(
                    ?limit,
                    "User store write timed out, outcome unknown; \
                     invalidating affected cache keys"
                );
                self.invalidate(stale_keys).await;
                Err(UserError::unavailable(format!(
                    "user store write did not complete within {limit:?}"
                )))
            }
        }
    }
}

async fn delete_keys(
    cache: Arc<dyn CacheService>, keys: Vec<String>, limit: Duration,
) {
    for key in keys {
        let outcome: CacheOutcome<bool> = match tokio::time::timeout(
            limit,
            CacheService::delete(cache.as_ref(), &key),
        )
        .await
        {
            Ok(result) => result.into(),
            Err(_) => CacheOutcome::Degraded(CacheError::Timeout(limit)),
        };
        if let Some(true) = outcome.settle("delete", &key) {
            debug!("Invalidated cache key {}", key);
        }
    }
}

/// Removes its keys on a detached task if dropped while still armed,
/// i.e. when the write it covers was abandoned before the store answered.
struct InvalidateOnDrop {
    cache: Arc<dyn CacheService>,
    keys: Option<Vec<String>>,
    limit: Duration,
}

impl InvalidateOnDrop {
    fn disarm(mut self) -> Vec<String> { self.keys.take().unwrap_or_default() }
}

impl Drop for InvalidateOnDrop {
    fn drop(&mut self) {
        let Some(keys) = self.keys.take()
        else {
            return;
        };

        warn!(
            ?keys,
            "User store write abandoned before it answered; invalidating \
             affected cache keys"
        );
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(delete_keys(
                    Arc::clone(&self.cache),
                    keys,
                    self.limit,
                ));
            }
            Err(e) => {
                warn!(error = %e, "No runtime left to invalidate cache keys on");
            }
        }
    }
}

#[async_trait]
impl<S> GenericDao for CachedUserStore<S>
where
    S: UserStore,
{
    type CreateRequest = UserPayload;
    type Error = UserError;
    type ID = i64;
    type Model = User;
    type UpdateRequest = UserPayload;

    async fn find_by_id(&self, id: Self::ID) -> Result<Self::Model, Self::Error> {
        self.get_user(id).await
    }

    async fn all(&self) -> Result<Vec<Self::Model>, Self::Error> {
        self.list_users().await
    }

    async fn create(
        &self, req: Self::CreateRequest,
    ) -> Result<Self::Model, Self::Error> {
        self.create_user(req).await
    }

    async fn update(
        &self, id: Self::ID, req: Self::UpdateRequest,
    ) -> Result<Self::Model, Self::Error> {
        self.update_user(id, req).await
    }

    async fn delete(&self, id: Self::ID) -> Result<(), Self::Error> {
        self.delete_user(id).await
    }
}
