use std::time::Duration;

use anyhow::{Context, anyhow};
use deadpool_redis::{Config, Pool, Runtime};
pub use deadpool_redis::{Pool as RedisPool, PoolError};
pub use redis::RedisError;
use tracing::{info, instrument, warn};
use url::Url;

pub use crate::{
    cache::{
        MemoryCache, RedisCache,
        r#trait::{CacheError, CacheResult, CacheService, CacheServiceExt},
    },
    config::{DbConnectConfig, MemoryConfig, RedisDbConfig},
    core::{CacheKey, CacheKeyAutoConstruct, CacheValue, Json},
};

pub mod cache;
pub mod config;
pub mod core;
pub mod macros;

/// Resolves the connection URL: an explicit `url` wins, otherwise it is
/// assembled from host, port, db and password.
pub fn redis_url<C>(config: &C) -> anyhow::Result<Url>
where
    C: DbConnectConfig,
{
    if let Some(url) = config.url() {
        return Url::parse(url).context("Invalid Redis URL");
    }

    let mut url = Url::parse("redis://")?;

    url.set_host(Some(config.host()))
        .context("Invalid Redis host")?;
    url.set_port(config.port().into())
        .map_err(|_| anyhow!("Invalid Redis port"))?;
    if let Some(password) = config.password() {
        url.set_password(Some(password))
            .map_err(|_| anyhow!("Cannot set Redis password"))?;
    }
    url.path_segments_mut()
        .map_err(|_| anyhow!("Redis URL cannot carry a database"))?
        .extend(&[config.db().to_string()]);

    Ok(url)
}

#[instrument(skip_all, name = "connect-redis")]
pub async fn connect_redis_db<C>(config: &C) -> anyhow::Result<Pool>
where
    C: DbConnectConfig,
{
    let url = redis_url(config)?;

    info!(redis.host = ?url.host_str(), redis.connect = true);

    let cfg = Config {
        url: Some(url.to_string()),
        pool: Some(deadpool_redis::PoolConfig::default()),
        connection: None,
    };

    let pool = cfg
        .create_pool(Some(Runtime::Tokio1))
        .context("Failed to create Redis pool")?;
    Ok(pool)
}

/// Sends `PING` and reports whether Redis answered within `timeout`.
/// Failures are logged; callers decide whether to carry on degraded.
pub async fn ping_redis(pool: &Pool, timeout: Duration) -> bool {
    let probe = async {
        let mut conn = pool.get().await.map_err(CacheError::from)?;
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map_err(CacheError::from)
    };

    match tokio::time::timeout(timeout, probe).await {
        Ok(Ok(_)) => true,
        Ok(Err(e)) => {
            warn!(error = %e, "Redis PING failed, cache will run degraded");
            false
        }
        Err(_) => {
            warn!(?timeout, "Redis PING timed out, cache will run degraded");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_construction() {
        let config: RedisDbConfig = serde_json::from_str(
            r#"{"host":"localhost","port":6379,"db":2}"#,
        )
        .unwrap();

        let url = redis_url(&config).unwrap();

        assert_eq!(url.to_string(), "redis://localhost:6379/2");
    }

    #[test]
    fn test_url_with_password() {
        let config: RedisDbConfig =
            serde_json::from_str(r#"{"host":"cache","password":"s3cret"}"#)
                .unwrap();

        let url = redis_url(&config).unwrap();

        assert_eq!(url.password(), Some("s3cret"));
        assert_eq!(url.host_str(), Some("cache"));
    }

    #[test]
    fn test_explicit_url_wins() {
        let config = RedisDbConfig::from_url("redis://example:6380/1");

        let url = redis_url(&config).unwrap();

        assert_eq!(url.to_string(), "redis://example:6380/1");
    }

    #[test]
    fn test_redis_db_config_default() {
        let json = r#"{}"#;
        let config: RedisDbConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 6379);
        assert_eq!(config.db, 0);
        assert!(config.url.is_none());
    }
}
