use std::time::Duration;

pub trait DbConnectConfig: serde::de::DeserializeOwned {
    fn url(&self) -> Option<&str> { None }
    fn password(&self) -> Option<&str> { None }
    fn host(&self) -> &str;
    fn port(&self) -> u16;
    fn db(&self) -> u8;
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct RedisDbConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "host_default")]
    pub host: String,
    #[serde(default = "port_default")]
    pub port: u16,
    #[serde(default = "db_default")]
    pub db: u8,
    #[serde(default)]
    pub password: Option<String>,
}

impl RedisDbConfig {
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            host: host_default(),
            port: port_default(),
            db: db_default(),
            password: None,
        }
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct MemoryConfig {
    #[serde(default = "default_memory_capacity")]
    pub capacity: u64,
    #[serde(default = "default_memory_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            capacity: default_memory_capacity(),
            ttl_secs: default_memory_ttl_secs(),
        }
    }
}

impl DbConnectConfig for RedisDbConfig {
    fn url(&self) -> Option<&str> { self.url.as_deref() }

    fn password(&self) -> Option<&str> { self.password.as_deref() }

    fn host(&self) -> &str { &self.host }

    fn port(&self) -> u16 { self.port }

    fn db(&self) -> u8 { self.db }
}

fn host_default() -> String { "127.0.0.1".into() }
fn port_default() -> u16 { 6379 }
fn db_default() -> u8 { 0 }
fn default_memory_capacity() -> u64 { 10_000 }
fn default_memory_ttl_secs() -> u64 { 300 }

impl MemoryConfig {
    /// Upper bound for entries whose TTL is zero.
    pub fn ttl(&self) -> Duration { Duration::from_secs(self.ttl_secs) }
}
