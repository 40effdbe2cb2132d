//! Side-channel notifications from the executor.
//!
//! # Design Decisions
//! - Observers are synchronous and cannot influence control flow
//! - `on_retry` fires once per retry decision, strictly before the wait
//! - `on_attempt` fires once per settled attempt, success or failure

use std::time::Duration;

/// What happened on one attempt.
#[derive(Debug)]
pub struct AttemptOutcome<'a, E> {
    /// 1-based attempt index.
    pub attempt: u32,
    /// Total attempts the policy permits.
    pub max_attempts: u32,
    /// `None` when the attempt succeeded.
    pub error: Option<&'a E>,
    /// Time spent inside this attempt.
    pub elapsed: Duration,
    /// Time since the execution started.
    pub total_elapsed: Duration,
    /// Wait before the next attempt, when one is scheduled.
    pub next_delay: Option<Duration>,
    /// Label copied from the policy.
    pub description: &'a str,
}

impl<E> AttemptOutcome<'_, E> {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }

    /// True when this failure ends the execution.
    pub fn is_final_failure(&self) -> bool {
        self.error.is_some() && self.next_delay.is_none()
    }
}

/// Receives retry telemetry.
pub trait RetryObserver<E>: Send + Sync {
    /// Called before sleeping ahead of a retry.
    fn on_retry(&self, attempt: u32, error: &E, delay: Duration) {
        let _ = (attempt, error, delay);
    }

    /// Called after every attempt settles.
    fn on_attempt(&self, outcome: &AttemptOutcome<'_, E>) {
        let _ = outcome;
    }
}

impl<E, O: RetryObserver<E> + ?Sized> RetryObserver<E> for &O {
    fn on_retry(&self, attempt: u32, error: &E, delay: Duration) {
        (**self).on_retry(attempt, error, delay)
    }

    fn on_attempt(&self, outcome: &AttemptOutcome<'_, E>) {
        (**self).on_attempt(outcome)
    }
}

impl<E, O: RetryObserver<E> + ?Sized> RetryObserver<E> for std::sync::Arc<O> {
    fn on_retry(&self, attempt: u32, error: &E, delay: Duration) {
        (**self).on_retry(attempt, error, delay)
    }

    fn on_attempt(&self, outcome: &AttemptOutcome<'_, E>) {
        (**self).on_attempt(outcome)
    }
}

/// Adapts a `(attempt, error, delay)` closure into a [`RetryObserver`].
pub struct OnRetry<F>(pub F);

impl<E, F> RetryObserver<E> for OnRetry<F>
where
    F: Fn(u32, &E, Duration) + Send + Sync,
{
    fn on_retry(&self, attempt: u32, error: &E, delay: Duration) {
        (self.0)(attempt, error, delay)
    }
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl<E> RetryObserver<E> for NoopObserver {}
