use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use database_traits::dao::GenericDao;
use tokio::sync::Mutex;

#[derive(Debug, thiserror::Error, PartialEq)]
enum MockError {
    #[error("Not found")]
    NotFound,
}

#[derive(Default)]
struct MockDao {
    rows: Mutex<BTreeMap<i64, String>>,
}

#[async_trait]
impl GenericDao for MockDao {
    type CreateRequest = String;
    type Error = MockError;
    type ID = i64;
    type Model = (i64, String);
    type UpdateRequest = String;

    async fn find_by_id(
        &self, id: Self::ID,
    ) -> Result<Self::Model, Self::Error> {
        let rows = self.rows.lock().await;
        rows.get(&id)
            .map(|value| (id, value.clone()))
            .ok_or(MockError::NotFound)
    }

    async fn all(&self) -> Result<Vec<Self::Model>, Self::Error> {
        let rows = self.rows.lock().await;
        Ok(rows.iter().map(|(id, v)| (*id, v.clone())).collect())
    }

    async fn create(
        &self, req: Self::CreateRequest,
    ) -> Result<Self::Model, Self::Error> {
        let mut rows = self.rows.lock().await;
        let id = rows.keys().next_back().copied().unwrap_or(0) + 1;
        rows.insert(id, req.clone());
        Ok((id, req))
    }

    async fn update(
        &self, id: Self::ID, req: Self::UpdateRequest,
    ) -> Result<Self::Model, Self::Error> {
        let mut rows = self.rows.lock().await;
        let slot = rows.get_mut(&id).ok_or(MockError::NotFound)?;
        *slot = req.clone();
        Ok((id, req))
    }

    async fn delete(&self, id: Self::ID) -> Result<(), Self::Error> {
        let mut rows = self.rows.lock().await;
        rows.remove(&id).map(|_| ()).ok_or(MockError::NotFound)
    }
}

async fn exercise<D>(dao: &D)
where
    D: GenericDao<
            ID = i64,
            Model = (i64, String),
            CreateRequest = String,
            UpdateRequest = String,
            Error = MockError,
        >,
{
    let created = dao.create("first".to_string()).await.unwrap();
    assert_eq!(created, (1, "first".to_string()));

    let updated = dao.update(1, "renamed".to_string()).await.unwrap();
    assert_eq!(updated.1, "renamed");

    assert_eq!(dao.all().await.unwrap().len(), 1);
    dao.delete(1).await.unwrap();
    assert_eq!(dao.find_by_id(1).await, Err(MockError::NotFound));
}

#[tokio::test]
async fn test_dao_contract_on_concrete_type() {
    exercise(&MockDao::default()).await;
}

#[tokio::test]
async fn test_dao_contract_through_arc() {
    let dao = Arc::new(MockDao::default());
    exercise(&dao).await;
}

#[tokio::test]
async fn test_missing_id_reports_not_found() {
    let dao = MockDao::default();

    assert_eq!(
        dao.update(42, "nobody".to_string()).await,
        Err(MockError::NotFound)
    );
    assert_eq!(dao.delete(42).await, Err(MockError::NotFound));
}
