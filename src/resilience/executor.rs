//! Retry executor.
//!
//! # Responsibilities
//! - Drive one fallible async operation until it succeeds or attempts run out
//! - Space attempts with capped exponential backoff, optionally jittered
//! - Notify observers before every wait
//! - Abort promptly when a cancel signal fires
//!
//! # State Transitions
//! ```text
//! Attempting(k) → Succeeded:        operation returned Ok
//! Attempting(k) → Waiting(k):       Err, retryable, k <= max_retries
//! Attempting(k) → ExhaustedFailed:  Err, k > max_retries
//! Attempting(k) → PermanentFailed:  Err, rejected by retry predicate
//! Waiting(k)    → Attempting(k+1):  delay elapsed
//! Attempting(k) | Waiting(k) → Cancelled
//! ```
//!
//! # Design Decisions
//! - One attempt in flight at a time; loop state is local to the call
//! - Only the last error is returned; observers see the earlier ones
//! - The running delay grows from the capped, un-jittered value

use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

use crate::lifecycle::cancel::CancelSignal;
use crate::resilience::backoff::{apply_jitter, Backoff};
use crate::resilience::error::RetryError;
use crate::resilience::jitter::{JitterSource, ThreadRngJitter};
use crate::resilience::observer::{AttemptOutcome, OnRetry, RetryObserver};
use crate::resilience::policy::{PolicyError, RetryPolicy};

/// Executes operations under a validated [`RetryPolicy`].
///
/// An executor holds no per-call state and can be shared between tasks.
#[derive(Debug, Clone)]
pub struct Executor<J = ThreadRngJitter> {
    policy: RetryPolicy,
    jitter: J,
}

impl Executor<ThreadRngJitter> {
    /// Create an executor using the thread-local RNG for jitter.
    pub fn new(policy: RetryPolicy) -> Result<Self, PolicyError> {
        Executor::with_jitter_source(policy, ThreadRngJitter)
    }
}

impl<J: JitterSource> Executor<J> {
    /// Create an executor drawing jitter from `jitter`.
    pub fn with_jitter_source(policy: RetryPolicy, jitter: J) -> Result<Self, PolicyError> {
        policy.validate()?;
        Ok(Self { policy, jitter })
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Prepare a call; attach observers, predicate or cancel signal, then `run`.
    pub fn call<T, E, F, Fut>(&self, operation: F) -> Call<'_, J, F, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        Call {
            executor: self,
            operation,
            observers: Vec::new(),
            retry_if: None,
            cancel: None,
        }
    }

    /// Run `operation` with no observers and no cancellation.
    pub async fn execute<T, E, F, Fut>(&self, operation: F) -> Result<T, RetryError<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.call(operation).run().await
    }
}

/// Run `operation` under `policy` with thread-RNG jitter.
///
/// An invalid policy yields [`RetryError::Config`] before the first attempt.
pub async fn execute<T, E, F, Fut>(policy: &RetryPolicy, operation: F) -> Result<T, RetryError<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let executor = Executor::new(policy.clone())?;
    executor.execute(operation).await
}

type RetryPredicate<'a, E> = Box<dyn Fn(&E) -> bool + Send + Sync + 'a>;

/// A single execution being configured.
#[must_use = "a call does nothing until `run` is awaited"]
pub struct Call<'a, J, F, E> {
    executor: &'a Executor<J>,
    operation: F,
    observers: Vec<Box<dyn RetryObserver<E> + 'a>>,
    retry_if: Option<RetryPredicate<'a, E>>,
    cancel: Option<CancelSignal>,
}

impl<'a, J, F, E> Call<'a, J, F, E>
where
    J: JitterSource,
{
    /// Attach an observer. Several may be attached; they are notified in order.
    pub fn observe(mut self, observer: impl RetryObserver<E> + 'a) -> Self {
        self.observers.push(Box::new(observer));
        self
    }

    /// Attach a `(attempt, error, delay)` callback fired before each wait.
    pub fn on_retry<G>(self, callback: G) -> Self
    where
        G: Fn(u32, &E, Duration) + Send + Sync + 'a,
        E: 'a,
    {
        self.observe(OnRetry(callback))
    }

    /// Only retry errors for which `predicate` returns true. Others end the
    /// call with [`RetryError::Permanent`].
    pub fn retry_if<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&E) -> bool + Send + Sync + 'a,
    {
        self.retry_if = Some(Box::new(predicate));
        self
    }

    /// Abort when `signal` is triggered.
    pub fn cancel_on(mut self, signal: &CancelSignal) -> Self {
        self.cancel = Some(signal.clone());
        self
    }

    /// Drive the operation to a terminal outcome.
    pub async fn run<T, Fut>(self) -> Result<T, RetryError<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let Call {
            executor,
            mut operation,
            observers,
            retry_if,
            cancel,
        } = self;
        let policy = &executor.policy;
        let max_attempts = policy.max_attempts();
        let started = Instant::now();
        let mut backoff = Backoff::new(policy);
        let mut attempt: u32 = 1;

        if cancel.as_ref().is_some_and(CancelSignal::is_cancelled) {
            return Err(RetryError::Cancelled {
                attempts: 0,
                elapsed: started.elapsed(),
            });
        }

        loop {
            let attempt_started = Instant::now();
            let result = match &cancel {
                Some(signal) => tokio::select! {
                    biased;
                    _ = signal.cancelled() => {
                        return Err(RetryError::Cancelled {
                            attempts: attempt,
                            elapsed: started.elapsed(),
                        });
                    }
                    result = operation(attempt) => result,
                },
                None => operation(attempt).await,
            };

            // Nothing borrowed from the error may live across the wait.
            let delay = {
                let mut outcome = AttemptOutcome {
                    attempt,
                    max_attempts,
                    error: None,
                    elapsed: attempt_started.elapsed(),
                    total_elapsed: started.elapsed(),
                    next_delay: None,
                    description: &policy.description,
                };

                let error = match result {
                    Ok(value) => {
                        for observer in &observers {
                            observer.on_attempt(&outcome);
                        }
                        return Ok(value);
                    }
                    Err(error) => error,
                };

                let retryable = retry_if.as_ref().map_or(true, |predicate| predicate(&error));
                if !retryable || attempt > policy.max_retries {
                    outcome.error = Some(&error);
                    for observer in &observers {
                        observer.on_attempt(&outcome);
                    }
                    let elapsed = started.elapsed();
                    return Err(if retryable {
                        RetryError::Exhausted {
                            error,
                            attempts: attempt,
                            elapsed,
                        }
                    } else {
                        RetryError::Permanent {
                            error,
                            attempts: attempt,
                            elapsed,
                        }
                    });
                }

                let capped = backoff.next_delay();
                let delay = if policy.jitter {
                    apply_jitter(capped, &executor.jitter)
                } else {
                    capped
                };
                outcome.error = Some(&error);
                outcome.next_delay = Some(delay);

                for observer in &observers {
                    observer.on_attempt(&outcome);
                }
                for observer in &observers {
                    observer.on_retry(attempt, &error, delay);
                }
                delay
            };

            match &cancel {
                Some(signal) => tokio::select! {
                    biased;
                    _ = signal.cancelled() => {
                        return Err(RetryError::Cancelled {
                            attempts: attempt,
                            elapsed: started.elapsed(),
                        });
                    }
                    _ = tokio::time::sleep(delay) => {}
                },
                None => tokio::time::sleep(delay).await,
            }

            attempt += 1;
        }
    }
}
