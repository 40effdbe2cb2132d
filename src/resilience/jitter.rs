//! Randomness sources for backoff jitter.
//!
//! The executor never reaches for a global generator directly. It asks a
//! [`JitterSource`] for a sample in `[0, 1)`, so tests can pin the value and
//! production can use the thread-local RNG.

use std::sync::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Produces uniform samples in `[0, 1)`.
pub trait JitterSource: Send + Sync {
    fn sample(&self) -> f64;
}

/// Thread-local RNG. Default source.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRngJitter;

impl JitterSource for ThreadRngJitter {
    fn sample(&self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }
}

/// Seeded RNG; the same seed yields the same sequence of delays.
pub struct SeededJitter {
    rng: Mutex<StdRng>,
}

impl SeededJitter {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl JitterSource for SeededJitter {
    fn sample(&self) -> f64 {
        // A poisoned lock still holds a usable RNG state.
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        rng.gen::<f64>()
    }
}

/// Always returns the same sample, clamped into `[0, 1)`.
#[derive(Debug, Clone, Copy)]
pub struct FixedJitter(f64);

impl FixedJitter {
    pub fn new(sample: f64) -> Self {
        let sample = if sample.is_nan() { 0.0 } else { sample };
        Self(sample.clamp(0.0, ONE_BELOW))
    }
}

impl JitterSource for FixedJitter {
    fn sample(&self) -> f64 {
        self.0
    }
}

impl<J: JitterSource + ?Sized> JitterSource for std::sync::Arc<J> {
    fn sample(&self) -> f64 {
        (**self).sample()
    }
}

/// Largest f64 strictly below 1.0.
pub(crate) const ONE_BELOW: f64 = 1.0 - f64::EPSILON / 2.0;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thread_rng_in_range() {
        let source = ThreadRngJitter;
        for _ in 0..1000 {
            let s = source.sample();
            assert!((0.0..1.0).contains(&s));
        }
    }

    #[test]
    fn test_seeded_is_reproducible() {
        let a = SeededJitter::new(42);
        let b = SeededJitter::new(42);
        let first: Vec<f64> = (0..16).map(|_| a.sample()).collect();
        let second: Vec<f64> = (0..16).map(|_| b.sample()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_fixed_clamps() {
        assert_eq!(FixedJitter::new(0.5).sample(), 0.5);
        assert_eq!(FixedJitter::new(-1.0).sample(), 0.0);
        assert_eq!(FixedJitter::new(f64::NAN).sample(), 0.0);
        assert!(FixedJitter::new(1.0).sample() < 1.0);
    }
}
