pub use config::{DbConnectConfig, DbOptionsConfig, PostgresDbConfig};
pub use deadpool_postgres::PoolError;
pub use impl_get_connect::{PoolStatus, SqlConnect};
pub use migrator::{AppliedMigration, Migration, SqlMigrator};
pub use pool::connect_postgres_db;
pub use tokio_postgres::{Error as PgError, error::SqlState};

pub mod config;
mod impl_get_connect;
pub mod migrator;
mod pool;
