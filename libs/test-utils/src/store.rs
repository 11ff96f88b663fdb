use std::{
    collections::BTreeMap,
    sync::atomic::{AtomicBool, AtomicI64, AtomicU64, AtomicUsize, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use database_traits::GenericDao;
use tokio::sync::Mutex;
use user_errors::UserError;
use user_models::{User, UserPayload};
use user_store::validate_user;

/// Snapshot of how often each store operation was invoked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCalls {
    pub find_by_id: usize,
    pub all: usize,
    pub create: usize,
    pub update: usize,
    pub delete: usize,
}

#[derive(Default)]
struct Counters {
    find_by_id: AtomicUsize,
    all: AtomicUsize,
    create: AtomicUsize,
    update: AtomicUsize,
    delete: AtomicUsize,
}

/// In-memory user store with call counters, an "unavailable" switch and
/// configurable latency. Follows the same rules as the PostgreSQL store:
/// sequential ids from 1, validated payloads, unique emails.
#[derive(Default)]
pub struct InMemoryUserStore {
    users: Mutex<BTreeMap<i64, User>>,
    last_id: AtomicI64,
    counters: Counters,
    unavailable: AtomicBool,
    latency_ms: AtomicU64,
    reply_delay_ms: AtomicU64,
}

impl InMemoryUserStore {
    pub fn new() -> Self { Self::default() }

    /// Inserts a user directly, bypassing counters, latency and the
    /// unavailable switch.
    pub async fn seed(&self, payload: UserPayload) -> User {
        let id = self.last_id.fetch_add(1, Ordering::SeqCst) + 1;
        let user = payload.into_user(id);
        self.users.lock().await.insert(id, user.clone());
        user
    }

    pub fn calls(&self) -> StoreCalls {
        StoreCalls {
            find_by_id: self.counters.find_by_id.load(Ordering::SeqCst),
            all: self.counters.all.load(Ordering::SeqCst),
            create: self.counters.create.load(Ordering::SeqCst),
            update: self.counters.update.load(Ordering::SeqCst),
            delete: self.counters.delete.load(Ordering::SeqCst),
        }
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Every subsequent operation sleeps this long before doing anything.
    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms
            .store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    /// Writes apply immediately but answer only after `delay`, like a
    /// database whose commit acknowledgement is slow to arrive.
    pub fn set_reply_delay(&self, delay: Duration) {
        self.reply_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    async fn reply<T>(&self, value: T) -> T {
        let delay = self.reply_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        value
    }

    async fn enter(&self, counter: &AtomicUsize) -> Result<(), UserError> {
        counter.fetch_add(1, Ordering::SeqCst);

        let latency = self.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }

        if self.unavailable.load(Ordering::SeqCst) {
            return Err(UserError::unavailable("in-memory store switched off"));
        }
        Ok(())
    }

    fn ensure_unique_email(
        users: &BTreeMap<i64, User>, email: &str, except: Option<i64>,
    ) -> Result<(), UserError> {
        let taken = users
            .values()
            .any(|u| u.email == email && Some(u.id) != except);
        if taken {
            return Err(UserError::validation(format!(
                "email {email} is already registered"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl GenericDao for InMemoryUserStore {
    type CreateRequest = UserPayload;
    type Error = UserError;
    type ID = i64;
    type Model = User;
    type UpdateRequest = UserPayload;

    async fn find_by_id(&self, id: Self::ID) -> Result<Self::Model, Self::Error> {
        self.enter(&self.counters.find_by_id).await?;
        self.users
            .lock()
            .await
            .get(&id)
            .cloned()
            .ok_or(UserError::NotFound { user_id: id })
    }

    async fn all(&self) -> Result<Vec<Self::Model>, Self::Error> {
        self.enter(&self.counters.all).await?;
        Ok(self.users.lock().await.values().cloned().collect())
    }

    async fn create(
        &self, req: Self::CreateRequest,
    ) -> Result<Self::Model, Self::Error> {
        self.enter(&self.counters.create).await?;
        validate_user(&req)?;

        let mut users = self.users.lock().await;
        Self::ensure_unique_email(&users, &req.email, None)?;

        let id = self.last_id.fetch_add(1, Ordering::SeqCst) + 1;
        let user = req.into_user(id);
        users.insert(id, user.clone());
        drop(users);

        Ok(self.reply(user).await)
    }

    async fn update(
        &self, id: Self::ID, req: Self::UpdateRequest,
    ) -> Result<Self::Model, Self::Error> {
        self.enter(&self.counters.update).await?;
        validate_user(&req)?;

        let mut users = self.users.lock().await;
        if !users.contains_key(&id) {
            return Err(UserError::NotFound { user_id: id });
        }
        Self::ensure_unique_email(&users, &req.email, Some(id))?;

        let user = req.into_user(id);
        users.insert(id, user.clone());
        drop(users);

        Ok(self.reply(user).await)
    }

    async fn delete(&self, id: Self::ID) -> Result<(), Self::Error> {
        self.enter(&self.counters.delete).await?;
        let removed = self.users.lock().await.remove(&id);
        if removed.is_none() {
            return Err(UserError::NotFound { user_id: id });
        }

        self.reply(()).await;
        Ok(())
    }
}
