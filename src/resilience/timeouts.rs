//! Timeout enforcement.
//!
//! The executor applies no per-attempt deadline. Callers that need one wrap
//! the future inside their operation with [`with_timeout`], and decide via the
//! retry predicate whether `Elapsed` is retryable.

use std::fmt;
use std::future::Future;
use std::time::Duration;

/// Either the deadline passed or the inner operation failed.
#[derive(Debug)]
pub enum TimeoutError<E> {
    Elapsed(Duration),
    Inner(E),
}

impl<E> TimeoutError<E> {
    pub fn is_elapsed(&self) -> bool {
        matches!(self, TimeoutError::Elapsed(_))
    }
}

impl<E: fmt::Display> fmt::Display for TimeoutError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeoutError::Elapsed(d) => write!(f, "timed out after {:?}", d),
            TimeoutError::Inner(e) => e.fmt(f),
        }
    }
}

impl<E> std::error::Error for TimeoutError<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TimeoutError::Elapsed(_) => None,
            TimeoutError::Inner(e) => Some(e),
        }
    }
}

/// Bound `future` by `limit`. The future is dropped when the deadline passes.
pub async fn with_timeout<T, E, Fut>(limit: Duration, future: Fut) -> Result<T, TimeoutError<E>>
where
    Fut: Future<Output = Result<T, E>>,
{
    match tokio::time::timeout(limit, future).await {
        Ok(result) => result.map_err(TimeoutError::Inner),
        Err(_) => Err(TimeoutError::Elapsed(limit)),
    }
}
