use std::borrow::Cow;

use serde::{Serialize, de::DeserializeOwned};

/// A typed cache key: knows how to render itself from its arguments and
/// what type lives under it.
pub trait CacheKey {
    type Args<'r>;
    type Value: Serialize + DeserializeOwned + Send + Sync;

    fn get_key_with_args(&self, arg: Self::Args<'_>) -> Cow<'static, str>;

    fn get_key(&self) -> Cow<'static, str>
    where
        for<'r> Self::Args<'r>: CacheKeyAutoConstruct,
    {
        CacheKey::get_key_with_args(self, CacheKeyAutoConstruct::construct())
    }
}

pub trait CacheKeyAutoConstruct {
    fn construct() -> Self;
}

impl CacheKeyAutoConstruct for () {
    fn construct() -> Self {}
}
