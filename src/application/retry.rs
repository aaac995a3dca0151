//! Exponential backoff with jitter (C2, §4.2).
//!
//! Grounded on the teacher's `CircuitBreaker` for the "classify then act"
//! shape, reworked into a pure delay function since this spec's C2 is a
//! standalone pure function, not a stateful gate. The `maxAttempts` bound in
//! §4.2 is enforced across scheduler ticks, not within a single call here:
//! each tick is one attempt (`application::collection_task::run`), and a
//! failed attempt bumps the task's `consecutiveFailures` and reschedules via
//! `delay_for_attempt` — see `application::scheduler` and `disable_threshold`
//! for the bound on repeated failure.

use rand::Rng;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct BackoffConfig {
    pub base: Duration,
    pub factor: f64,
    pub cap: Duration,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(1),
            factor: 2.0,
            cap: Duration::from_secs(60),
        }
    }
}

/// `delay(attempt) = min(base * factor^attempt, cap) +- jitter`, jitter in `[0, delay/2)`.
///
/// `attempt` is 0-indexed (the delay before the *first* retry uses `attempt=0`).
pub fn delay_for_attempt(config: &BackoffConfig, attempt: u32) -> Duration {
    let raw = config.base.as_secs_f64() * config.factor.powi(attempt as i32);
    let capped = raw.min(config.cap.as_secs_f64());
    let jitter = rand::rng().random_range(0.0..(capped / 2.0).max(f64::EPSILON));
    Duration::from_secs_f64(capped + jitter)
}

/// Lower/upper bounds of `delay_for_attempt`'s jitter window, for assertions in tests.
pub fn delay_bounds(config: &BackoffConfig, attempt: u32) -> (Duration, Duration) {
    let raw = config.base.as_secs_f64() * config.factor.powi(attempt as i32);
    let capped = raw.min(config.cap.as_secs_f64());
    (
        Duration::from_secs_f64(capped),
        Duration::from_secs_f64(capped * 1.5),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_grows_exponentially_and_respects_cap() {
        let config = BackoffConfig {
            base: Duration::from_secs(1),
            factor: 2.0,
            cap: Duration::from_secs(10),
        };
        let (lo0, hi0) = delay_bounds(&config, 0);
        assert_eq!(lo0, Duration::from_secs(1));
        assert_eq!(hi0, Duration::from_millis(1500));

        let (lo3, _hi3) = delay_bounds(&config, 3);
        // base * 2^3 = 8s, still under the 10s cap.
        assert_eq!(lo3, Duration::from_secs(8));

        let (lo5, hi5) = delay_bounds(&config, 5);
        // base * 2^5 = 32s, clamped to the 10s cap.
        assert_eq!(lo5, Duration::from_secs(10));
        assert_eq!(hi5, Duration::from_secs(15));
    }

    #[test]
    fn actual_delay_always_within_bounds() {
        let config = BackoffConfig::default();
        for attempt in 0..5 {
            let (lo, hi) = delay_bounds(&config, attempt);
            let actual = delay_for_attempt(&config, attempt);
            assert!(actual >= lo, "actual {actual:?} below lower bound {lo:?}");
            assert!(actual < hi, "actual {actual:?} at/above upper bound {hi:?}");
        }
    }
}
