//! Shared utilities for executor integration tests.

#![allow(dead_code)]

use std::fmt::Display;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use resilient_exec::resilience::{AttemptOutcome, RetryObserver, RetryPolicy};

/// Policy without jitter: 100ms initial delay, factor 2.
pub fn deterministic_policy(max_retries: u32) -> RetryPolicy {
    RetryPolicy::new("test")
        .with_max_retries(max_retries)
        .with_initial_delay(Duration::from_millis(100))
        .with_factor(2.0)
        .with_jitter(false)
}

/// Operation that fails until `succeed_on`, counting invocations.
pub struct Flaky {
    pub succeed_on: Option<u32>,
    calls: AtomicU32,
}

impl Flaky {
    pub fn succeeding_on(attempt: u32) -> Self {
        Self {
            succeed_on: Some(attempt),
            calls: AtomicU32::new(0),
        }
    }

    pub fn always_failing() -> Self {
        Self {
            succeed_on: None,
            calls: AtomicU32::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// One attempt: `Ok(attempt)` or `Err("attempt N failed")`.
    pub async fn attempt(&self, attempt: u32) -> Result<u32, String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        match self.succeed_on {
            Some(k) if attempt >= k => Ok(attempt),
            _ => Err(format!("attempt {} failed", attempt)),
        }
    }
}

/// Record of one `on_attempt` notification.
#[derive(Debug, Clone, PartialEq)]
pub struct SeenAttempt {
    pub attempt: u32,
    pub max_attempts: u32,
    pub succeeded: bool,
    pub next_delay: Option<Duration>,
}

/// Observer that keeps every notification for later assertions.
#[derive(Default)]
pub struct RecordingObserver {
    retries: Mutex<Vec<(u32, String, Duration)>>,
    attempts: Mutex<Vec<SeenAttempt>>,
}

impl RecordingObserver {
    pub fn retries(&self) -> Vec<(u32, String, Duration)> {
        self.retries.lock().unwrap().clone()
    }

    pub fn retry_delays(&self) -> Vec<Duration> {
        self.retries().into_iter().map(|(_, _, d)| d).collect()
    }

    pub fn attempts(&self) -> Vec<SeenAttempt> {
        self.attempts.lock().unwrap().clone()
    }
}

impl<E: Display> RetryObserver<E> for RecordingObserver {
    fn on_retry(&self, attempt: u32, error: &E, delay: Duration) {
        self.retries
            .lock()
            .unwrap()
            .push((attempt, error.to_string(), delay));
    }

    fn on_attempt(&self, outcome: &AttemptOutcome<'_, E>) {
        self.attempts.lock().unwrap().push(SeenAttempt {
            attempt: outcome.attempt,
            max_attempts: outcome.max_attempts,
            succeeded: outcome.succeeded(),
            next_delay: outcome.next_delay,
        });
    }
}

pub fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}
