use redis_connection::CacheError;
use tracing::warn;

/// Result of a best-effort cache call. A degraded outcome is logged and
/// then treated as a miss (reads) or ignored (writes); it never becomes
/// an error for the caller.
#[must_use]
#[derive(Debug)]
pub enum CacheOutcome<T> {
    Done(T),
    Degraded(CacheError),
}

impl<T> CacheOutcome<T> {
    pub fn is_degraded(&self) -> bool { matches!(self, Self::Degraded(_)) }

    /// Logs a degraded outcome and yields the value of a completed one.
    pub fn settle(self, operation: &'static str, key: &str) -> Option<T> {
        match self {
            Self::Done(value) => Some(value),
            Self::Degraded(err) => {
                warn!(
                    cache.operation = operation,
                    cache.key = key,
                    error = %err,
                    "Cache degraded, continuing without it"
                );
                None
            }
        }
    }
}

impl<T> From<Result<T, CacheError>> for CacheOutcome<T> {
    fn from(result: Result<T, CacheError>) -> Self {
        match result {
            Ok(value) => Self::Done(value),
            Err(err) => Self::Degraded(err),
        }
    }
}
