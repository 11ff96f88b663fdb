use redis_connection::{CacheKey, cache_key};

cache_key!(UserCacheKey::<user_models::User> => "user:{}"[id: i64]);
cache_key!(UserListCacheKey::<Vec<user_models::User>> => "users:all");

/// Matches every per-user entry, but not the collection key.
pub const USER_KEY_PATTERN: &str = "user:*";

pub fn user_key(id: i64) -> String {
    UserCacheKey.get_key_with_args((&id,)).into_owned()
}

pub fn user_list_key() -> String { UserListCacheKey.get_key().into_owned() }

#[cfg(test)]
mod tests {
    use redis_connection::cache::pattern::glob_match;

    use super::*;

    #[test]
    fn test_key_formats() {
        assert_eq!(user_key(1), "user:1");
        assert_eq!(user_key(-5), "user:-5");
        assert_eq!(user_list_key(), "users:all");
    }

    #[test]
    fn test_pattern_does_not_cover_list_key() {
        assert!(glob_match(USER_KEY_PATTERN, &user_key(42)));
        assert!(!glob_match(USER_KEY_PATTERN, &user_list_key()));
    }
}
