//! Per-provider token bucket rate limiting (C1, gate half).
//!
//! One [`RateGate`] is shared across every [`crate::application::collection_task`]
//! targeting the same provider. Acquisition blocks cooperatively up to a
//! caller-supplied deadline; on expiry it fails with `RATE_LIMITED` rather
//! than ever handing out a "free" token (boundary behavior in SPEC_FULL.md §8).

use crate::domain::errors::CollectionError;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::trace;

struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

/// Token bucket: capacity = declared limit per window, refill rate = capacity / window.
pub struct RateGate {
    provider: String,
    capacity: f64,
    refill_per_sec: f64,
    state: Mutex<BucketState>,
}

impl RateGate {
    pub fn new(provider: impl Into<String>, capacity_per_window: u32, window: Duration) -> Self {
        let capacity = capacity_per_window as f64;
        let refill_per_sec = capacity / window.as_secs_f64().max(f64::EPSILON);
        Self {
            provider: provider.into(),
            capacity,
            refill_per_sec,
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
        }
    }

    fn refill_locked(&self, state: &mut BucketState, now: Instant) {
        let elapsed = now.saturating_duration_since(state.last_refill).as_secs_f64();
        if elapsed > 0.0 {
            state.tokens = (state.tokens + elapsed * self.refill_per_sec).min(self.capacity);
            state.last_refill = now;
        }
    }

    /// Try to take one token immediately, without waiting. Used by tests and
    /// by callers that want to poll rather than block.
    pub fn try_acquire(&self) -> bool {
        let mut state = self.state.lock().expect("rate gate mutex poisoned");
        self.refill_locked(&mut state, Instant::now());
        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Acquire one token, blocking cooperatively until it is available or
    /// `deadline` passes. Never returns a token it did not actually debit
    /// from the bucket.
    pub async fn acquire(&self, deadline: Instant) -> Result<(), CollectionError> {
        loop {
            let wait = {
                let mut state = self.state.lock().expect("rate gate mutex poisoned");
                let now = Instant::now();
                self.refill_locked(&mut state, now);
                if state.tokens >= 1.0 {
                    state.tokens -= 1.0;
                    return Ok(());
                }
                let deficit = 1.0 - state.tokens;
                Duration::from_secs_f64(deficit / self.refill_per_sec)
            };

            let now = Instant::now();
            if now >= deadline {
                return Err(CollectionError::RateGateDenied {
                    provider: self.provider.clone(),
                });
            }
            let remaining = deadline.saturating_duration_since(now);
            let sleep_for = wait.min(remaining);
            if sleep_for.is_zero() {
                return Err(CollectionError::RateGateDenied {
                    provider: self.provider.clone(),
                });
            }
            trace!(provider = %self.provider, wait_ms = sleep_for.as_millis() as u64, "rate gate waiting for token");
            tokio::time::sleep(sleep_for).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn try_acquire_drains_capacity_then_refuses() {
        let gate = RateGate::new("coingecko", 2, Duration::from_secs(60));
        assert!(gate.try_acquire());
        assert!(gate.try_acquire());
        assert!(!gate.try_acquire());
    }

    #[tokio::test]
    async fn acquire_fails_past_deadline_without_consuming_a_token() {
        let gate = RateGate::new("coingecko", 1, Duration::from_secs(3600));
        assert!(gate.try_acquire());
        // bucket is empty; refill is far in the future, deadline is now.
        let deadline = Instant::now();
        let result = gate.acquire(deadline).await;
        assert!(matches!(result, Err(CollectionError::RateGateDenied { .. })));
        // The bucket must still be empty: no "free" token was handed out.
        assert!(!gate.try_acquire());
    }

    #[tokio::test]
    async fn acquire_waits_for_refill_within_deadline() {
        let gate = RateGate::new("coingecko", 1, Duration::from_millis(200));
        assert!(gate.try_acquire());
        let deadline = Instant::now() + Duration::from_secs(2);
        let result = gate.acquire(deadline).await;
        assert!(result.is_ok());
    }
}
