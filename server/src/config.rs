use std::{
    env,
    net::{IpAddr, SocketAddr},
    str::FromStr,
};

use anyhow::{Context, anyhow};
use redis_connection::RedisDbConfig;
use sql_connection::PostgresDbConfig;
use user_cached_store::CachedStoreConfig;

/// Everything the server needs to start, read from the process environment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    pub database: PostgresDbConfig,
    /// `None` runs with the in-process cache instead of Redis.
    pub redis: Option<RedisDbConfig>,
    pub cache: CachedStoreConfig,
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key/value source. Empty values count as
    /// unset.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let uri = get("DATABASE_URL")
            .ok_or_else(|| anyhow!("DATABASE_URL must be set"))?;
        let mut database = PostgresDbConfig::from_uri(uri);
        database.max_conn = parse(&get, "DB_MAX_CONN")?;

        let redis = get("REDIS_URL").map(RedisDbConfig::from_url);

        let defaults = CachedStoreConfig::default();
        let cache = CachedStoreConfig {
            user_ttl_secs: parse(&get, "CACHE_USER_TTL_SECS")?
                .unwrap_or(defaults.user_ttl_secs),
            list_ttl_secs: parse(&get, "CACHE_LIST_TTL_SECS")?
                .unwrap_or(defaults.list_ttl_secs),
            cache_timeout_ms: parse(&get, "CACHE_TIMEOUT_MS")?
                .unwrap_or(defaults.cache_timeout_ms),
            store_timeout_ms: parse(&get, "STORE_TIMEOUT_MS")?,
        };

        Ok(Self {
            host: parse(&get, "SERVER_HOST")?
                .unwrap_or(IpAddr::from([0, 0, 0, 0])),
            port: parse(&get, "SERVER_PORT")?.unwrap_or(8080),
            database,
            redis,
            cache,
        })
    }

    pub fn addr(&self) -> SocketAddr { SocketAddr::new(self.host, self.port) }
}

fn parse<T, G>(get: &G, key: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    G: Fn(&str) -> Option<String>,
{
    get(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .with_context(|| format!("Invalid value for {key}: {raw:?}"))
        })
        .transpose()
}
