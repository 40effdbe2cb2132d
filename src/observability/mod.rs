//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Executor notifications (RetryObserver):
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stderr, pretty or JSON)
//!     → Whatever metrics recorder the host installs
//! ```
//!
//! # Design Decisions
//! - Observers are attached per call; the executor never logs by itself
//! - Observability never alters retry decisions

pub mod logging;
pub mod metrics;

pub use logging::{init_logging, TracingObserver};
pub use metrics::MetricsObserver;
