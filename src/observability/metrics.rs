//! Metrics collection.
//!
//! # Metrics
//! - `retry_attempts_total` (counter): attempts by policy and outcome
//!   (`success`, `retry`, `failure`)
//! - `retry_scheduled_total` (counter): retries scheduled by policy
//! - `retry_backoff_seconds` (histogram): actual wait before each retry
//!
//! # Design Decisions
//! - Recorded through the `metrics` facade; the host installs the exporter
//! - Without a recorder every call is a no-op

use crate::resilience::observer::{AttemptOutcome, RetryObserver};

/// Records executor activity through the `metrics` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsObserver;

impl<E> RetryObserver<E> for MetricsObserver {
    fn on_attempt(&self, outcome: &AttemptOutcome<'_, E>) {
        let policy = outcome.description.to_string();
        let label = match (outcome.succeeded(), outcome.next_delay) {
            (true, _) => "success",
            (false, Some(_)) => "retry",
            (false, None) => "failure",
        };

        ::metrics::counter!("retry_attempts_total", "policy" => policy.clone(), "outcome" => label)
            .increment(1);

        if let Some(delay) = outcome.next_delay {
            ::metrics::counter!("retry_scheduled_total", "policy" => policy.clone()).increment(1);
            ::metrics::histogram!("retry_backoff_seconds", "policy" => policy)
                .record(delay.as_secs_f64());
        }
    }
}
