//! Terminal outcomes of a retried execution.

use std::fmt;
use std::time::Duration;

use crate::resilience::policy::PolicyError;

/// Coarse classification of a [`RetryError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Every permitted attempt failed.
    Exhausted,
    /// The operation failed with an error classified as not worth retrying.
    Permanent,
    /// The caller abandoned the execution.
    Cancelled,
    /// The policy was rejected before any attempt.
    Configuration,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Exhausted => "exhausted",
            ErrorKind::Permanent => "permanent",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Configuration => "configuration",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by the executor.
///
/// Only the last operation error crosses the executor boundary; earlier ones
/// are visible to observers at the time they happen.
#[derive(Debug)]
pub enum RetryError<E> {
    /// All `max_retries + 1` attempts failed. `error` is from the last one.
    Exhausted {
        error: E,
        attempts: u32,
        elapsed: Duration,
    },

    /// The retry predicate rejected `error`; no further attempts were made.
    Permanent {
        error: E,
        attempts: u32,
        elapsed: Duration,
    },

    /// Cancelled during an attempt or a backoff wait. `attempts` counts the
    /// attempts that were started.
    Cancelled { attempts: u32, elapsed: Duration },

    /// Invalid policy.
    Config(PolicyError),
}

impl<E> RetryError<E> {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RetryError::Exhausted { .. } => ErrorKind::Exhausted,
            RetryError::Permanent { .. } => ErrorKind::Permanent,
            RetryError::Cancelled { .. } => ErrorKind::Cancelled,
            RetryError::Config(_) => ErrorKind::Configuration,
        }
    }

    /// Attempts started before the outcome was decided.
    pub fn attempts(&self) -> u32 {
        match self {
            RetryError::Exhausted { attempts, .. }
            | RetryError::Permanent { attempts, .. }
            | RetryError::Cancelled { attempts, .. } => *attempts,
            RetryError::Config(_) => 0,
        }
    }

    /// Wall time spent in the execution, waits included.
    pub fn elapsed(&self) -> Duration {
        match self {
            RetryError::Exhausted { elapsed, .. }
            | RetryError::Permanent { elapsed, .. }
            | RetryError::Cancelled { elapsed, .. } => *elapsed,
            RetryError::Config(_) => Duration::ZERO,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, RetryError::Cancelled { .. })
    }

    /// The last operation error, if the outcome carries one.
    pub fn last_error(&self) -> Option<&E> {
        match self {
            RetryError::Exhausted { error, .. } | RetryError::Permanent { error, .. } => Some(error),
            _ => None,
        }
    }

    pub fn into_last_error(self) -> Option<E> {
        match self {
            RetryError::Exhausted { error, .. } | RetryError::Permanent { error, .. } => Some(error),
            _ => None,
        }
    }
}

impl<E> From<PolicyError> for RetryError<E> {
    fn from(err: PolicyError) -> Self {
        RetryError::Config(err)
    }
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryError::Exhausted { error, attempts, elapsed } => write!(
                f,
                "gave up after {} attempts in {:?}: {}",
                attempts, elapsed, error
            ),
            RetryError::Permanent { error, attempts, elapsed } => write!(
                f,
                "non-retryable failure on attempt {} after {:?}: {}",
                attempts, elapsed, error
            ),
            RetryError::Cancelled { attempts, elapsed } => write!(
                f,
                "cancelled after {} attempts in {:?}",
                attempts, elapsed
            ),
            RetryError::Config(e) => write!(f, "invalid retry policy: {}", e),
        }
    }
}

impl<E> std::error::Error for RetryError<E>
where
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RetryError::Exhausted { error, .. } | RetryError::Permanent { error, .. } => Some(error),
            RetryError::Config(e) => Some(e),
            RetryError::Cancelled { .. } => None,
        }
    }
}
