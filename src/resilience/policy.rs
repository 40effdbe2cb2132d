//! Retry policy definition.
//!
//! # Responsibilities
//! - Hold the immutable backoff parameters for one call site
//! - Reject degenerate parameters before any attempt is made
//!
//! # Design Decisions
//! - Fields are public; `validate` is the single gate and the executor calls it
//! - `description` never influences control flow, only logs and metric labels

use std::time::Duration;
use thiserror::Error;

/// Default number of retries after the initial attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;
/// Default base delay of the backoff sequence.
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(200);
/// Default ceiling on the computed delay.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_millis(5000);
/// Default multiplicative growth per retry.
pub const DEFAULT_FACTOR: f64 = 2.0;

/// Invalid policy parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PolicyError {
    /// `initial_delay` must be strictly positive.
    #[error("initial delay must be greater than zero")]
    ZeroInitialDelay,

    /// `max_delay` must not be below `initial_delay`.
    #[error("max delay {max:?} is below initial delay {initial:?}")]
    MaxBelowInitial { initial: Duration, max: Duration },

    /// `factor` must be a finite number greater than one.
    #[error("backoff factor must be a finite number greater than 1, got {0}")]
    InvalidFactor(f64),
}

/// Retry policy for a single call site.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the initial attempt (total attempts = `max_retries + 1`).
    pub max_retries: u32,

    /// Base of the exponential sequence.
    pub initial_delay: Duration,

    /// Hard ceiling on the computed (pre-jitter) delay.
    pub max_delay: Duration,

    /// Growth applied to the running delay on every retry.
    pub factor: f64,

    /// Add up to 10% random delay on top of the capped delay.
    pub jitter: bool,

    /// Label for logs and metrics.
    pub description: String,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay: DEFAULT_INITIAL_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            factor: DEFAULT_FACTOR,
            jitter: true,
            description: "operation".to_string(),
        }
    }
}

impl RetryPolicy {
    /// Start from the defaults with the given label.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Default::default()
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    pub fn with_factor(mut self, factor: f64) -> Self {
        self.factor = factor;
        self
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Total attempts the policy permits, the initial one included.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Check the parameters produce a growing, bounded backoff.
    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.initial_delay.is_zero() {
            return Err(PolicyError::ZeroInitialDelay);
        }
        if self.max_delay < self.initial_delay {
            return Err(PolicyError::MaxBelowInitial {
                initial: self.initial_delay,
                max: self.max_delay,
            });
        }
        if !self.factor.is_finite() || self.factor <= 1.0 {
            return Err(PolicyError::InvalidFactor(self.factor));
        }
        Ok(())
    }
}
