use std::ops::Deref;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::cache::r#trait::CacheError;

/// Anything that can be stored in a byte-oriented cache backend
pub trait CacheValue: Sized + Send + Sync {
    fn to_bytes(&self) -> Result<Bytes, CacheError>;

    fn from_bytes(bytes: &[u8]) -> Result<Self, CacheError>;
}

/// JSON-encoded cache payload
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Json<T>(pub T);

impl<T> Json<T> {
    pub fn new(value: T) -> Self { Self(value) }

    pub fn inner(self) -> T { self.0 }

    pub fn as_inner(&self) -> &T { &self.0 }
}

impl<T> Deref for Json<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target { &self.0 }
}

impl<T> From<T> for Json<T> {
    fn from(value: T) -> Self { Json(value) }
}

impl<T> CacheValue for Json<T>
where
    T: Serialize + for<'de> Deserialize<'de> + Send + Sync,
{
    fn to_bytes(&self) -> Result<Bytes, CacheError> {
        serde_json::to_vec(&self.0)
            .map(Bytes::from)
            .map_err(|e| CacheError::Serialization(e.to_string()))
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, CacheError> {
        serde_json::from_slice(bytes)
            .map(Json)
            .map_err(|e| CacheError::Deserialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize, Deserialize, PartialEq, Debug, Clone)]
    struct Profile {
        id: u64,
        name: String,
    }

    #[test]
    fn test_json_roundtrip() {
        let profile = Profile {
            id: 1,
            name: "Alice".into(),
        };
        let json = Json(profile.clone());

        let bytes = json.to_bytes().unwrap();
        let recovered = Json::<Profile>::from_bytes(&bytes).unwrap();

        assert_eq!(recovered.0, profile);
    }

    #[test]
    fn test_malformed_bytes_are_deserialization_errors() {
        let err = Json::<Profile>::from_bytes(b"{not json").unwrap_err();
        assert!(matches!(err, CacheError::Deserialization(_)));
    }
}
