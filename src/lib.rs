//! Resilient operation executor.
//!
//! Wraps unreliable async operations (outbound HTTP calls, database queries)
//! with retries and capped exponential backoff. Transient failures are
//! absorbed; the caller sees either the value or the last error.
//!
//! ```rust,ignore
//! use resilient_exec::{Executor, RetryPolicy, CancelSignal};
//! use resilient_exec::observability::TracingObserver;
//!
//! let executor = Executor::new(RetryPolicy::new("profile lookup"))?;
//! let cancel = CancelSignal::new();
//!
//! let profile = executor
//!     .call(|attempt| fetch_profile(user_id, attempt))
//!     .observe(TracingObserver)
//!     .retry_if(|e: &DbError| e.is_transient())
//!     .cancel_on(&cancel)
//!     .run()
//!     .await?;
//! ```

pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::ExecutorConfig;
pub use lifecycle::CancelSignal;
pub use resilience::{execute, ErrorKind, Executor, RetryError, RetryObserver, RetryPolicy};
