use std::time::Duration;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct CachedStoreConfig {
    #[serde(default = "user_ttl_secs_default")]
    pub user_ttl_secs: u64,
    #[serde(default = "list_ttl_secs_default")]
    pub list_ttl_secs: u64,
    #[serde(default = "cache_timeout_ms_default")]
    pub cache_timeout_ms: u64,
    /// No bound on store calls when unset.
    #[serde(default)]
    pub store_timeout_ms: Option<u64>,
}

impl CachedStoreConfig {
    pub fn user_ttl(&self) -> Duration { Duration::from_secs(self.user_ttl_secs) }

    pub fn list_ttl(&self) -> Duration { Duration::from_secs(self.list_ttl_secs) }

    pub fn cache_timeout(&self) -> Duration {
        Duration::from_millis(self.cache_timeout_ms)
    }

    pub fn store_timeout(&self) -> Option<Duration> {
        self.store_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for CachedStoreConfig {
    fn default() -> Self {
        Self {
            user_ttl_secs: user_ttl_secs_default(),
            list_ttl_secs: list_ttl_secs_default(),
            cache_timeout_ms: cache_timeout_ms_default(),
            store_timeout_ms: None,
        }
    }
}

fn user_ttl_secs_default() -> u64 { 600 }
fn list_ttl_secs_default() -> u64 { 300 }
fn cache_timeout_ms_default() -> u64 { 500 }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: CachedStoreConfig = serde_json::from_str("{}").unwrap();

        assert_eq!(config.user_ttl(), Duration::from_secs(600));
        assert_eq!(config.list_ttl(), Duration::from_secs(300));
        assert_eq!(config.cache_timeout(), Duration::from_millis(500));
        assert_eq!(config.store_timeout(), None);
    }

    #[test]
    fn test_overrides() {
        let config: CachedStoreConfig = serde_json::from_str(
            r#"{"user_ttl_secs":5,"list_ttl_secs":2,"store_timeout_ms":1500}"#,
        )
        .unwrap();

        assert_eq!(config.user_ttl(), Duration::from_secs(5));
        assert_eq!(config.list_ttl(), Duration::from_secs(2));
        assert_eq!(config.store_timeout(), Some(Duration::from_millis(1500)));
    }
}
