use std::sync::Arc;

use async_trait::async_trait;

/// CRUD contract shared by every record store.
///
/// `create` assigns the identifier and returns the persisted model;
/// `update` and `delete` on a missing identifier must fail with the
/// implementation's not-found error rather than succeed silently.
#[async_trait]
pub trait GenericDao: Send + Sync {
    type Model: Send + Sync + 'static;
    type CreateRequest: Send + Sync + 'static;
    type UpdateRequest: Send + Sync + 'static;
    type Error: Send + 'static;
    type ID: Copy + Send + Sync + 'static;

    async fn find_by_id(
        &self, id: Self::ID,
    ) -> Result<Self::Model, Self::Error>;

    async fn all(&self) -> Result<Vec<Self::Model>, Self::Error>;

    async fn create(
        &self, req: Self::CreateRequest,
    ) -> Result<Self::Model, Self::Error>;

    async fn update(
        &self, id: Self::ID, req: Self::UpdateRequest,
    ) -> Result<Self::Model, Self::Error>;

    async fn delete(&self, id: Self::ID) -> Result<(), Self::Error>;
}

#[async_trait]
impl<T> GenericDao for Arc<T>
where
    T: GenericDao + ?Sized,
{
    type CreateRequest = T::CreateRequest;
    type Error = T::Error;
    type ID = T::ID;
    type Model = T::Model;
    type UpdateRequest = T::UpdateRequest;

    async fn find_by_id(
        &self, id: Self::ID,
    ) -> Result<Self::Model, Self::Error> {
        (**self).find_by_id(id).await
    }

    async fn all(&self) -> Result<Vec<Self::Model>, Self::Error> {
        (**self).all().await
    }

    async fn create(
        &self, req: Self::CreateRequest,
    ) -> Result<Self::Model, Self::Error> {
        (**self).create(req).await
    }

    async fn update(
        &self, id: Self::ID, req: Self::UpdateRequest,
    ) -> Result<Self::Model, Self::Error> {
        (**self).update(id, req).await
    }

    async fn delete(&self, id: Self::ID) -> Result<(), Self::Error> {
        (**self).delete(id).await
    }
}
