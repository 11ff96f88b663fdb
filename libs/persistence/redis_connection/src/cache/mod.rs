pub mod memory;
pub mod pattern;
pub mod redis_cache;
pub mod r#trait;

pub use memory::MemoryCache;
pub use redis_cache::RedisCache;
