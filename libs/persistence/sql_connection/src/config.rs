use std::time::Duration;

pub trait DbConnectConfig: serde::de::DeserializeOwned {
    fn uri(&self) -> &str;
}

/// Configure database connection pool data
pub trait DbOptionsConfig {
    fn max_conn(&self) -> Option<u32> { None }
    fn min_conn(&self) -> Option<u32> { None }
    fn wait_timeout(&self) -> Duration { Duration::from_millis(2000) }
    fn sql_logger(&self) -> bool { false }
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct PostgresDbConfig {
    pub uri: String,
    pub max_conn: Option<u32>,
    pub min_conn: Option<u32>,
    #[serde(default = "wait_timeout_ms_default")]
    pub wait_timeout_ms: u64,
    #[serde(default = "logger_default")]
    pub logger: bool,
}

impl PostgresDbConfig {
    pub fn from_uri(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            max_conn: None,
            min_conn: None,
            wait_timeout_ms: wait_timeout_ms_default(),
            logger: logger_default(),
        }
    }
}

impl DbConnectConfig for PostgresDbConfig {
    fn uri(&self) -> &str { &self.uri }
}

impl DbOptionsConfig for PostgresDbConfig {
    fn max_conn(&self) -> Option<u32> { self.max_conn }

    fn min_conn(&self) -> Option<u32> { self.min_conn }

    fn wait_timeout(&self) -> Duration {
        Duration::from_millis(self.wait_timeout_ms)
    }

    fn sql_logger(&self) -> bool { self.logger }
}

fn wait_timeout_ms_default() -> u64 { 2000 }
fn logger_default() -> bool { false }
