pub mod key;
pub mod value;

pub use key::{CacheKey, CacheKeyAutoConstruct};
pub use value::{CacheValue, Json};
