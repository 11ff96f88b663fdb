use tracing::{debug, instrument};
use user_cache_keys::{user_key, user_list_key};
use user_errors::UserError;
use user_models::User;
use user_store::UserStore;

use crate::CachedUserStore;

impl<S: UserStore> CachedUserStore<S> {
    /// Every user, served from `users:all` when present.
    #[instrument(skip(self))]
    pub async fn list_users(&self) -> Result<Vec<User>, UserError> {
        let key = user_list_key();

        if let Some(users) = self.cache_get::<Vec<User>>(&key).await {
            debug!("Cache hit for user list ({} users)", users.len());
            return Ok(users);
        }

        debug!("Cache miss for user list, fetching from store");
        let users = self.read_store(self.store.all()).await?;

        self.cache_set(&key, &users, self.config.list_ttl()).await;

        Ok(users)
    }

    /// One user, served from `user:<id>` when present. A `NotFound` from
    /// the store is returned as is and leaves the cache untouched.
    #[instrument(skip(self))]
    pub async fn get_user(&self, id: i64) -> Result<User, UserError> {
        let key = user_key(id);

        if let Some(user) = self.cache_get::<User>(&key).await {
            debug!("Cache hit for user {}", id);
            return Ok(user);
        }

        debug!("Cache miss for user {}, fetching from store", id);
        let user = self.read_store(self.store.find_by_id(id)).await?;

        self.cache_set(&key, &user, self.config.user_ttl()).await;

        Ok(user)
    }
}
