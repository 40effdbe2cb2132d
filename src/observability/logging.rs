//! Structured logging.
//!
//! # Responsibilities
//! - Initialize logging subsystem
//! - Turn executor notifications into structured log events
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format for production, pretty format for development
//! - `RUST_LOG` overrides the configured level
//! - Logs go to stderr so command output on stdout stays clean

use std::fmt::Display;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::schema::{LogFormat, ObservabilityConfig};
use crate::resilience::observer::{AttemptOutcome, RetryObserver};

pub use tracing_subscriber::util::TryInitError;

/// Install the global subscriber.
pub fn init_logging(config: &ObservabilityConfig) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_ascii_lowercase()));

    let (pretty, json) = match config.log_format {
        LogFormat::Pretty => (Some(fmt::layer().with_writer(std::io::stderr)), None),
        LogFormat::Json => (
            None,
            Some(fmt::layer().json().with_writer(std::io::stderr)),
        ),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(pretty)
        .with(json)
        .try_init()
}

/// Logs every attempt through `tracing`.
///
/// - success: `debug`
/// - failure followed by a retry: `warn`, with the scheduled delay
/// - final failure: `error`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl<E: Display> RetryObserver<E> for TracingObserver {
    fn on_attempt(&self, outcome: &AttemptOutcome<'_, E>) {
        let elapsed_ms = outcome.elapsed.as_millis() as u64;
        let total_elapsed_ms = outcome.total_elapsed.as_millis() as u64;

        match (outcome.error, outcome.next_delay) {
            (None, _) => tracing::debug!(
                operation = %outcome.description,
                attempt = outcome.attempt,
                max_attempts = outcome.max_attempts,
                elapsed_ms,
                total_elapsed_ms,
                "Attempt succeeded"
            ),
            (Some(error), Some(delay)) => tracing::warn!(
                operation = %outcome.description,
                attempt = outcome.attempt,
                max_attempts = outcome.max_attempts,
                elapsed_ms,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Attempt failed, retrying"
            ),
            (Some(error), None) => tracing::error!(
                operation = %outcome.description,
                attempt = outcome.attempt,
                max_attempts = outcome.max_attempts,
                total_elapsed_ms,
                error = %error,
                "Attempt failed, giving up"
            ),
        }
    }
}
