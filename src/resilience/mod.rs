//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Caller operation:
//!     → policy.rs (validated backoff parameters)
//!     → executor.rs (attempt, classify, wait, repeat)
//!         → backoff.rs (capped exponential delay)
//!         → jitter.rs (injectable randomness)
//!         → observer.rs (retry and attempt notifications)
//!     → error.rs (single terminal error on failure)
//! ```
//!
//! # Design Decisions
//! - The executor knows nothing about what it retries
//! - No logging inside the loop; observers carry telemetry out
//! - Timeouts are composed by callers (timeouts.rs), not imposed

pub mod backoff;
pub mod error;
pub mod executor;
pub mod jitter;
pub mod observer;
pub mod policy;
pub mod timeouts;

pub use error::{ErrorKind, RetryError};
pub use executor::{execute, Call, Executor};
pub use jitter::{FixedJitter, JitterSource, SeededJitter, ThreadRngJitter};
pub use observer::{AttemptOutcome, NoopObserver, OnRetry, RetryObserver};
pub use policy::{PolicyError, RetryPolicy};
