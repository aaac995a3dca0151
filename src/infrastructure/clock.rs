//! Monotonic time source (C1, clock half).
//!
//! The scheduler and rate gate never call `Utc::now()` / `Instant::now()`
//! directly; they go through a [`Clock`] so tests can inject a
//! [`FakeClock`] and get deterministic `nextFireAt` sequences (testable
//! property 6 in SPEC_FULL.md).

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub trait Clock: Send + Sync {
    /// Wall-clock time, used for persisted timestamps and alert records.
    fn now_utc(&self) -> DateTime<Utc>;

    /// Monotonic instant, used for rate-gate deadlines and backoff timing.
    fn now_instant(&self) -> Instant;
}

/// Production clock backed by the OS.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn now_instant(&self) -> Instant {
        Instant::now()
    }
}

/// Deterministic clock for tests: wall-clock time is tracked as an offset in
/// milliseconds from a fixed epoch and advanced explicitly by the test.
///
/// `Instant` has no stable public constructor away from `Instant::now()`, so
/// the monotonic side is anchored once at construction and advanced by
/// moving the same offset; this keeps `now_instant() - base` consistent with
/// `now_utc() - base_utc` for any sequence of `advance` calls.
pub struct FakeClock {
    base_instant: Instant,
    base_utc: DateTime<Utc>,
    offset_ms: AtomicI64,
}

impl FakeClock {
    pub fn new(start: DateTime<Utc>) -> Arc<Self> {
        Arc::new(Self {
            base_instant: Instant::now(),
            base_utc: start,
            offset_ms: AtomicI64::new(0),
        })
    }

    pub fn advance(&self, delta: Duration) {
        self.offset_ms
            .fetch_add(delta.as_millis() as i64, Ordering::SeqCst);
    }

    pub fn set_offset_ms(&self, offset_ms: i64) {
        self.offset_ms.store(offset_ms, Ordering::SeqCst);
    }
}

impl Clock for FakeClock {
    fn now_utc(&self) -> DateTime<Utc> {
        self.base_utc + chrono::Duration::milliseconds(self.offset_ms.load(Ordering::SeqCst))
    }

    fn now_instant(&self) -> Instant {
        self.base_instant + Duration::from_millis(self.offset_ms.load(Ordering::SeqCst).max(0) as u64)
    }
}
