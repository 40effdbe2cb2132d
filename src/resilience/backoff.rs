//! Exponential backoff with jitter.

use std::time::Duration;

use crate::resilience::jitter::{JitterSource, ONE_BELOW};
use crate::resilience::policy::RetryPolicy;

/// Upper bound of the jitter, as a fraction of the capped delay.
pub const JITTER_RATIO: f64 = 0.1;

/// Un-jittered delay sequence for a policy.
///
/// Each step multiplies the running delay by `factor` and caps it at
/// `max_delay`. The first yielded value is the wait before attempt 2.
#[derive(Debug, Clone)]
pub struct Backoff {
    current: Duration,
    max: Duration,
    factor: f64,
}

impl Backoff {
    pub fn new(policy: &RetryPolicy) -> Self {
        Self {
            current: policy.initial_delay,
            max: policy.max_delay,
            factor: policy.factor,
        }
    }

    /// Advance the running delay and return the capped value.
    pub fn next_delay(&mut self) -> Duration {
        self.current = grow(self.current, self.factor, self.max);
        self.current
    }
}

impl Iterator for Backoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        Some(self.next_delay())
    }
}

/// Multiply in nanoseconds so whole-millisecond inputs stay exact.
fn grow(current: Duration, factor: f64, max: Duration) -> Duration {
    let max_nanos = max.as_nanos() as f64;
    let next = (current.as_nanos() as f64 * factor).min(max_nanos);
    if next >= max_nanos {
        max
    } else {
        Duration::from_nanos(next as u64)
    }
}

/// Add `[0, JITTER_RATIO)` of `capped` using the given source.
pub fn apply_jitter<J: JitterSource + ?Sized>(capped: Duration, source: &J) -> Duration {
    let sample = source.sample();
    let sample = if sample.is_nan() { 0.0 } else { sample.clamp(0.0, ONE_BELOW) };
    let span = capped.as_nanos() as f64 * JITTER_RATIO;
    let extra = (span * sample) as u64;
    // Rounding can land exactly on the span; the bound is exclusive.
    let extra = if extra > 0 && extra as f64 >= span { extra - 1 } else { extra };
    capped.saturating_add(Duration::from_nanos(extra))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::jitter::{FixedJitter, SeededJitter};

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_backoff_sequence_caps() {
        let policy = RetryPolicy::default();
        let delays: Vec<Duration> = Backoff::new(&policy).take(7).collect();
        assert_eq!(
            delays,
            vec![ms(400), ms(800), ms(1600), ms(3200), ms(5000), ms(5000), ms(5000)]
        );
    }

    #[test]
    fn test_fractional_factor() {
        let policy = RetryPolicy::default()
            .with_initial_delay(ms(100))
            .with_factor(1.5)
            .with_max_delay(ms(1000));
        let delays: Vec<Duration> = Backoff::new(&policy).take(3).collect();
        assert_eq!(delays, vec![ms(150), ms(225), Duration::from_micros(337_500)]);
    }

    #[test]
    fn test_huge_max_does_not_overflow() {
        let policy = RetryPolicy::default().with_max_delay(Duration::MAX);
        let last = Backoff::new(&policy).take(200).last().unwrap();
        assert!(last <= Duration::MAX);
    }

    #[test]
    fn test_jitter_bounds() {
        let capped = ms(1000);
        assert_eq!(apply_jitter(capped, &FixedJitter::new(0.0)), capped);
        assert_eq!(apply_jitter(capped, &FixedJitter::new(0.5)), ms(1050));

        let high = apply_jitter(capped, &FixedJitter::new(1.0));
        assert!(high < ms(1100));
    }

    #[test]
    fn test_out_of_range_source_stays_below_ten_percent() {
        struct Raw(f64);
        impl JitterSource for Raw {
            fn sample(&self) -> f64 {
                self.0
            }
        }

        let capped = ms(1000);
        assert!(apply_jitter(capped, &Raw(1.0)) < ms(1100));
        assert!(apply_jitter(capped, &Raw(7.5)) < ms(1100));
        assert_eq!(apply_jitter(capped, &Raw(-3.0)), capped);
        assert_eq!(apply_jitter(capped, &Raw(f64::NAN)), capped);
    }

    #[test]
    fn test_seeded_jitter_stays_in_bounds() {
        let capped = ms(1000);
        let seeded = SeededJitter::new(7);
        for _ in 0..1000 {
            let d = apply_jitter(capped, &seeded);
            assert!(d >= capped && d < ms(1100));
        }
    }
}
