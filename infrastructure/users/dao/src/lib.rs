use async_trait::async_trait;
use database_traits::GenericDao;
use sql_connection::{Migration, SqlConnect};
use tracing::instrument;
use user_errors::UserError;
use user_models::{User, UserPayload};
use user_store::validate_user;

const SELECT_USER: &str =
    "SELECT id, name, email, COALESCE(status, 'active') AS status FROM users";

/// Schema migrations owned by the users domain, in version order.
pub fn migrations() -> Vec<Migration> {
    vec![Migration::new(
        1,
        "create_users",
        include_str!("../../../../domains/users/migrations/sql/001_create_users.up.sql"),
        include_str!("../../../../domains/users/migrations/sql/001_create_users.down.sql"),
    )]
}

/// PostgreSQL-backed user store.
#[derive(Clone)]
pub struct UserDao {
    db: SqlConnect,
}

impl UserDao {
    pub fn new(db: SqlConnect) -> Self { Self { db } }

    pub fn db(&self) -> &SqlConnect { &self.db }

    fn map_row(row: &tokio_postgres::Row) -> User {
        User {
            id: row.get("id"),
            name: row.get("name"),
            email: row.get("email"),
            status: row.get("status"),
        }
    }
}

#[async_trait]
impl GenericDao for UserDao {
    type CreateRequest = UserPayload;
    type Error = UserError;
    type ID = i64;
    type Model = User;
    type UpdateRequest = UserPayload;

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Self::ID) -> Result<Self::Model, Self::Error> {
        let client = self.db.get_client().await?;
        let stmt = client
            .prepare_cached(&format!("{SELECT_USER} WHERE id = $1"))
            .await?;
        let rows = client.query(&stmt, &[&id]).await?;

        rows.first()
            .map(Self::map_row)
            .ok_or(UserError::NotFound { user_id: id })
    }

    #[instrument(skip(self))]
    async fn all(&self) -> Result<Vec<Self::Model>, Self::Error> {
        let client = self.db.get_client().await?;
        let stmt = client
            .prepare_cached(&format!("{SELECT_USER} ORDER BY id ASC"))
            .await?;
        let rows = client.query(&stmt, &[]).await?;

        Ok(rows.iter().map(Self::map_row).collect())
    }

    #[instrument(skip(self))]
    async fn create(
        &self, req: Self::CreateRequest,
    ) -> Result<Self::Model, Self::Error> {
        validate_user(&req)?;

        let client = self.db.get_client().await?;
        let stmt = client
            .prepare_cached(
                "INSERT INTO users (name, email, status) VALUES ($1, $2, $3) \
                 RETURNING id, name, email, status",
            )
            .await?;
        let row = client
            .query_one(&stmt, &[&req.name, &req.email, &req.status_or_default()])
            .await?;

        Ok(Self::map_row(&row))
    }

    #[instrument(skip(self))]
    async fn update(
        &self, id: Self::ID, req: Self::UpdateRequest,
    ) -> Result<Self::Model, Self::Error> {
        validate_user(&req)?;

        let client = self.db.get_client().await?;
        let stmt = client
            .prepare_cached(
                "UPDATE users SET name = $1, email = $2, status = $3 WHERE id \
                 = $4 RETURNING id, name, email, status",
            )
            .await?;
        let rows = client
            .query(
                &stmt,
                &[&req.name, &req.email, &req.status_or_default(), &id],
            )
            .await?;

        rows.first()
            .map(Self::map_row)
            .ok_or(UserError::NotFound { user_id: id })
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: Self::ID) -> Result<(), Self::Error> {
        let client = self.db.get_client().await?;
        let stmt = client
            .prepare_cached("DELETE FROM users WHERE id = $1")
            .await?;
        let affected = client.execute(&stmt, &[&id]).await?;

        if affected == 0 {
            return Err(UserError::NotFound { user_id: id });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_migrations() {
        let migrations = migrations();

        assert_eq!(migrations.len(), 1);
        assert_eq!(migrations[0].version, 1);
        assert!(migrations[0].up_sql.contains("CREATE TABLE"));
        assert!(migrations[0].up_sql.contains("email TEXT NOT NULL UNIQUE"));
        assert!(migrations[0].down_sql.contains("DROP TABLE"));
    }
}
