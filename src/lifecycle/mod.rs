//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Cancellation (cancel.rs):
//!     caller / signal handler → CancelSignal::cancel
//!     → every execution holding a clone stops at its next suspension point
//!
//! Signals (signals.rs):
//!     SIGINT (Ctrl-C) → trigger CancelSignal
//! ```
//!
//! # Design Decisions
//! - Cancellation is level-triggered: a late subscriber still sees it
//! - Signal handling lives here, never inside the executor

pub mod cancel;
pub mod signals;

pub use cancel::CancelSignal;
