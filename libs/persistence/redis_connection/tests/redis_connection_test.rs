use std::time::Duration;

use redis_connection::{
    CacheService, CacheServiceExt, RedisCache, config::RedisDbConfig,
    ping_redis,
};
use serde::{Deserialize, Serialize};
use test_utils::TestRedisContainer;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Profile {
    id: i64,
    name: String,
}

async fn setup_test_redis() -> anyhow::Result<(TestRedisContainer, RedisCache)>
{
    let container = TestRedisContainer::new().await?;
    let cache = RedisCache::new(container.pool.clone());
    Ok((container, cache))
}

#[test]
fn test_redis_db_config_from_json() {
    let json = r#"{
        "host": "redis.example.com",
        "port": 6380,
        "db": 1
    }"#;

    let config: RedisDbConfig = serde_json::from_str(json).unwrap();

    assert_eq!(config.host, "redis.example.com");
    assert_eq!(config.port, 6380);
    assert_eq!(config.db, 1);
    assert_eq!(config.password, None);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_ping() {
    let (container, _cache) = setup_test_redis().await.unwrap();

    assert!(ping_redis(&container.pool, Duration::from_secs(2)).await);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_typed_set_get_delete() {
    let (container, cache) = setup_test_redis().await.unwrap();
    let key = container.test_key("profile:1");
    let profile = Profile {
        id: 1,
        name: "Jane".to_string(),
    };

    cache.set(&key, &profile, Duration::from_secs(60)).await.unwrap();
    let cached: Option<Profile> = cache.get(&key).await.unwrap();
    assert_eq!(cached, Some(profile));

    assert!(cache.delete(&key).await.unwrap());
    assert!(!cache.delete(&key).await.unwrap());
    let cached: Option<Profile> = cache.get(&key).await.unwrap();
    assert_eq!(cached, None);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_ttl_expiry() {
    let (container, cache) = setup_test_redis().await.unwrap();
    let key = container.test_key("short");

    cache
        .set(&key, &"value".to_string(), Duration::from_millis(100))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;

    let cached: Option<String> = cache.get(&key).await.unwrap();
    assert_eq!(cached, None);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_delete_pattern_uses_scan() {
    let (container, cache) = setup_test_redis().await.unwrap();
    let ttl = Duration::from_secs(60);

    for i in 0..250 {
        cache
            .set(&container.test_key(&format!("profile:{i}")), &i, ttl)
            .await
            .unwrap();
    }
    let keep = container.test_key("profiles:all");
    cache.set(&keep, &vec![1, 2, 3], ttl).await.unwrap();

    let deleted = cache
        .delete_pattern(&container.test_key("profile:*"))
        .await
        .unwrap();

    assert_eq!(deleted, 250);
    let kept: Option<Vec<i32>> = cache.get(&keep).await.unwrap();
    assert_eq!(kept, Some(vec![1, 2, 3]));
}

#[tokio::test]
async fn test_unreachable_redis_reports_errors() {
    let pool = redis_connection::connect_redis_db(&RedisDbConfig::from_url(
        "redis://127.0.0.1:1/0",
    ))
    .await
    .unwrap();
    let cache = RedisCache::new(pool.clone());

    assert!(cache.get_raw("profile:1").await.is_err());
    assert!(!ping_redis(&pool, Duration::from_millis(500)).await);
}
