//! Shared fixtures for tests: in-process doubles for the user store and
//! the cache, plus throwaway PostgreSQL and Redis containers.

pub mod cache;
pub mod store;
pub mod test_helpers;

use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use anyhow::{Context, Result};
pub use cache::{CacheOp, FailingCache, RecordingCache};
use deadpool_postgres::{
    Manager, ManagerConfig, Pool as PostgresPool, RecyclingMethod,
};
use deadpool_redis::{Config as RedisConfig, Pool as RedisPool, Runtime};
use sql_connection::{Migration, SqlConnect, SqlMigrator};
pub use store::{InMemoryUserStore, StoreCalls};
pub use test_helpers::*;
use testcontainers_modules::{
    postgres::Postgres,
    redis::Redis,
    testcontainers::{ImageExt, runners::AsyncRunner},
};
use tokio_postgres::NoTls;

/// PostgreSQL test container using testcontainers-rs
pub struct TestPostgresContainer {
    pub pool: PostgresPool,
    pub connection_string: String,
    // Keep the container alive for the lifetime of this struct
    _container:
        testcontainers_modules::testcontainers::ContainerAsync<Postgres>,
}

impl TestPostgresContainer {
    /// Start a fresh PostgreSQL container on a random port with an empty
    /// database.
    pub async fn new() -> Result<Self> {
        let container = Postgres::default()
            .with_env_var("POSTGRES_DB", "testdb")
            .with_env_var("POSTGRES_USER", "testuser")
            .with_env_var("POSTGRES_PASSWORD", "testpass")
            .start()
            .await
            .context("Failed to start PostgreSQL container")?;

        let host = container.get_host().await?;
        let port = container.get_host_port_ipv4(5432).await?;
        let connection_string = format!(
            "postgresql://testuser:testpass@{host}:{port}/testdb"
        );

        let pool = Self::create_pool(&connection_string).await?;

        Ok(Self {
            pool,
            connection_string,
            _container: container,
        })
    }

    /// Start a container and apply `migrations` to it.
    pub async fn with_migrations(migrations: Vec<Migration>) -> Result<Self> {
        let instance = Self::new().await?;
        instance
            .migrator(migrations)
            .up(None)
            .await
            .context("Failed to apply migrations")?;
        Ok(instance)
    }

    async fn create_pool(connection_string: &str) -> Result<PostgresPool> {
        let pg_config =
            connection_string.parse::<tokio_postgres::Config>()?;

        let mgr_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };
        let mgr = Manager::from_config(pg_config, NoTls, mgr_config);

        let pool = PostgresPool::builder(mgr)
            .max_size(10)
            .build()
            .context("Failed to build PostgreSQL connection pool")?;

        let mut attempts = 0;
        loop {
            match pool.get().await {
                Ok(client) => {
                    match client.query_one("SELECT 1", &[]).await {
                        Ok(_) => break,
                        Err(_) if attempts < 20 => {
                            attempts += 1;
                            tokio::time::sleep(Duration::from_millis(500))
                                .await;
                            continue;
                        }
                        Err(e) => {
                            return Err(e).context("PostgreSQL not ready");
                        }
                    }
                }
                Err(_) if attempts < 20 => {
                    attempts += 1;
                    tokio::time::sleep(Duration::from_millis(500)).await;
                    continue;
                }
                Err(e) => {
                    return Err(e)
                        .context("Failed to get PostgreSQL connection");
                }
            }
        }

        Ok(pool)
    }

    pub async fn execute_sql(&self, sql: &str) -> Result<()> {
        let client = self.pool.get().await?;
        client
            .batch_execute(sql)
            .await
            .context("Failed to execute SQL")?;
        Ok(())
    }

    pub fn migrator(&self, migrations: Vec<Migration>) -> SqlMigrator {
        SqlMigrator::new(self.pool.clone(), migrations)
    }

    pub fn sql_connect(&self) -> SqlConnect { SqlConnect::new(self.pool.clone()) }
}

/// Redis test container using testcontainers-rs
pub struct TestRedisContainer {
    pub pool: RedisPool,
    pub connection_string: String,
    pub test_prefix: String,
    // Keep the container alive for the lifetime of this struct
    _container: testcontainers_modules::testcontainers::ContainerAsync<Redis>,
}

impl TestRedisContainer {
    /// Start a fresh Redis container on a random port. Keys built with
    /// [`TestRedisContainer::test_key`] carry a per-instance prefix.
    pub async fn new() -> Result<Self> {
        static PREFIX_SEQ: AtomicU64 = AtomicU64::new(0);

        let container = Redis::default()
            .start()
            .await
            .context("Failed to start Redis container")?;

        let host = container.get_host().await?;
        let port = container.get_host_port_ipv4(6379).await?;
        let connection_string = format!("redis://{host}:{port}");

        let test_prefix = format!(
            "test_{}_{}:",
            std::process::id(),
            PREFIX_SEQ.fetch_add(1, Ordering::Relaxed)
        );

        let pool = Self::create_pool(&connection_string).await?;

        Ok(Self {
            pool,
            connection_string,
            test_prefix,
            _container: container,
        })
    }

    async fn create_pool(connection_string: &str) -> Result<RedisPool> {
        let mut cfg = RedisConfig::from_url(connection_string);
        cfg.pool = Some(deadpool_redis::PoolConfig::new(10));
        let pool = cfg
            .create_pool(Some(Runtime::Tokio1))
            .context("Failed to create Redis pool")?;

        let mut attempts = 0;
        loop {
            match pool.get().await {
                Ok(mut conn) => {
                    match deadpool_redis::redis::cmd("PING")
                        .query_async::<()>(&mut conn)
                        .await
                    {
                        Ok(_) => break,
                        Err(_) if attempts < 20 => {
                            attempts += 1;
                            tokio::time::sleep(Duration::from_millis(500))
                                .await;
                            continue;
                        }
                        Err(e) => return Err(e).context("Redis not ready"),
                    }
                }
                Err(_) if attempts < 20 => {
                    attempts += 1;
                    tokio::time::sleep(Duration::from_millis(500)).await;
                    continue;
                }
                Err(e) => {
                    return Err(e).context("Failed to get Redis connection");
                }
            }
        }

        Ok(pool)
    }

    pub async fn get_connection(&self) -> Result<deadpool_redis::Connection> {
        Ok(self.pool.get().await?)
    }

    pub async fn flush_all_keys(&self) -> Result<()> {
        let mut conn = self.get_connection().await?;
        deadpool_redis::redis::cmd("FLUSHDB")
            .query_async::<()>(&mut conn)
            .await?;
        Ok(())
    }

    /// Get a test-prefixed key for isolation
    pub fn test_key(&self, key: &str) -> String {
        format!("{}{}", self.test_prefix, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore = "requires Docker"]
    async fn test_postgres_container() {
        let container = TestPostgresContainer::new().await.unwrap();

        container.execute_sql("SELECT 1").await.unwrap();

        let client = container.pool.get().await.unwrap();
        let result: i32 =
            client.query_one("SELECT 1", &[]).await.unwrap().get(0);
        assert_eq!(result, 1);
    }

    #[tokio::test]
    #[ignore = "requires Docker"]
    async fn test_redis_container() {
        let container = TestRedisContainer::new().await.unwrap();
        let mut conn = container.get_connection().await.unwrap();

        let _: () = deadpool_redis::redis::cmd("SET")
            .arg(container.test_key("test_key"))
            .arg("test_value")
            .query_async(&mut conn)
            .await
            .unwrap();

        let value: String = deadpool_redis::redis::cmd("GET")
            .arg(container.test_key("test_key"))
            .query_async(&mut conn)
            .await
            .unwrap();

        assert_eq!(value, "test_value");
    }

    #[tokio::test]
    #[ignore = "requires Docker"]
    async fn test_postgres_migrations_applied() {
        let container = TestPostgresContainer::with_migrations(vec![
            Migration::new(
                1,
                "create_widgets",
                "CREATE TABLE widgets (id SERIAL PRIMARY KEY);",
                "DROP TABLE widgets;",
            ),
        ])
        .await
        .unwrap();

        container
            .execute_sql("INSERT INTO widgets DEFAULT VALUES")
            .await
            .unwrap();
    }
}
