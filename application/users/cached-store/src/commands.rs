use tracing::{debug, instrument};
use user_cache_keys::{user_key, user_list_key};
use user_errors::UserError;
use user_models::{User, UserPayload};
use user_store::UserStore;

use crate::CachedUserStore;

impl<S: UserStore> CachedUserStore<S> {
    /// Creates the user, drops the cached listing and seeds `user:<id>`
    /// with the stored row.
    #[instrument(skip(self))]
    pub async fn create_user(
        &self, payload: UserPayload,
    ) -> Result<User, UserError> {
        let user = self
            .write_store(self.store.create(payload), vec![user_list_key()])
            .await?;

        self.cache_set(&user_key(user.id), &user, self.config.user_ttl())
            .await;
        debug!("Seeded cache for new user {}", user.id);

        Ok(user)
    }

    /// Updates the user and deletes both its entry and the listing. The
    /// fresh row is cached by the next read, not here.
    #[instrument(skip(self))]
    pub async fn update_user(
        &self, id: i64, payload: UserPayload,
    ) -> Result<User, UserError> {
        self.write_store(self.store.update(id, payload), stale_keys(id))
            .await
    }

    #[instrument(skip(self))]
    pub async fn delete_user(&self, id: i64) -> Result<(), UserError> {
        self.write_store(self.store.delete(id), stale_keys(id))
            .await
    }
}

fn stale_keys(id: i64) -> Vec<String> { vec![user_key(id), user_list_key()] }
