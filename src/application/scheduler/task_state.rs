//! Per-(asset, tier) scheduler bookkeeping and state machine (C4, §4.4).

use crate::config::tiers::TiersConfig;
use crate::domain::errors::ErrorKind;
use crate::domain::types::{AssetId, Tier};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Idle,
    Running,
    Cooling,
    Disabled,
}

/// Owned-by-the-scheduler bookkeeping for one (assetId, tier) pair.
///
/// Mutated only by the scheduler loop (§5 shared-resources rule: single
/// writer, readers take a snapshot).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionTask {
    pub asset_id: AssetId,
    pub tier: Tier,
    pub provider: String,
    pub last_success_at: Option<DateTime<Utc>>,
    pub next_fire_at: DateTime<Utc>,
    pub consecutive_failures: u32,
    pub successes: u64,
    pub failures: u64,
    pub state: TaskState,
    pub last_error_kind: Option<ErrorKind>,
    #[serde(skip)]
    pub last_error_at: Option<DateTime<Utc>>,
}

impl CollectionTask {
    pub fn new(asset_id: AssetId, tier: Tier, provider: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            asset_id,
            tier,
            provider: provider.into(),
            last_success_at: None,
            // invariant (2): first run fires immediately.
            next_fire_at: now,
            consecutive_failures: 0,
            successes: 0,
            failures: 0,
            state: TaskState::Idle,
            last_error_kind: None,
            last_error_at: None,
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.state != TaskState::Disabled && self.next_fire_at <= now
    }

    pub fn mark_running(&mut self) {
        self.state = TaskState::Running;
    }

    /// Apply a successful outcome. Monotonicity guard (§5): a late-arriving
    /// outcome whose observed time is older than the current `lastSuccessAt`
    /// never moves it backwards.
    pub fn record_success(&mut self, now: DateTime<Utc>, tiers: &TiersConfig) {
        if self.last_success_at.map(|t| now >= t).unwrap_or(true) {
            self.last_success_at = Some(now);
        }
        self.consecutive_failures = 0;
        self.successes += 1;
        self.state = TaskState::Idle;
        let interval = tiers.interval_seconds(self.tier);
        self.next_fire_at = now + chrono::Duration::seconds(interval as i64);
    }

    /// Apply a failed outcome: bump the failure streak, recompute the backoff
    /// next-fire time, and transition to DISABLED past `disable_threshold`.
    pub fn record_failure(
        &mut self,
        now: DateTime<Utc>,
        backoff: std::time::Duration,
        kind: ErrorKind,
        disable_threshold: u32,
    ) {
        self.consecutive_failures += 1;
        self.failures += 1;
        self.last_error_kind = Some(kind);
        self.last_error_at = Some(now);
        if self.consecutive_failures >= disable_threshold {
            self.state = TaskState::Disabled;
            // Operators (or an auto-heal sweep) must explicitly re-enable.
            self.next_fire_at = now + chrono::Duration::seconds(i64::MAX / 2);
        } else {
            self.state = TaskState::Cooling;
            self.next_fire_at = now
                + chrono::Duration::milliseconds(backoff.as_millis().min(i64::MAX as u128) as i64);
        }
    }

    /// Operator (or auto-heal) action returning a DISABLED task to IDLE.
    pub fn re_enable(&mut self, now: DateTime<Utc>) {
        self.state = TaskState::Idle;
        self.consecutive_failures = 0;
        self.next_fire_at = now;
    }

    pub fn success_rate(&self) -> f64 {
        let total = self.successes + self.failures;
        if total == 0 {
            1.0
        } else {
            self.successes as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiers() -> TiersConfig {
        TiersConfig::default()
    }

    #[test]
    fn new_task_fires_immediately() {
        let now = Utc::now();
        let task = CollectionTask::new(AssetId::new("bitcoin"), Tier::HighFrequency, "coingecko", now);
        assert!(task.is_due(now));
        assert_eq!(task.next_fire_at, now);
    }

    #[test]
    fn success_schedules_next_fire_one_interval_out() {
        let now = Utc::now();
        let mut task = CollectionTask::new(AssetId::new("bitcoin"), Tier::HighFrequency, "coingecko", now);
        task.record_success(now, &tiers());
        assert_eq!(task.consecutive_failures, 0);
        assert_eq!(task.next_fire_at, now + chrono::Duration::seconds(900));
        assert!(task.next_fire_at >= task.last_success_at.unwrap());
    }

    #[test]
    fn repeated_failures_disable_the_task() {
        let now = Utc::now();
        let mut task = CollectionTask::new(AssetId::new("bitcoin"), Tier::HighFrequency, "coingecko", now);
        for _ in 0..10 {
            task.record_failure(now, std::time::Duration::from_secs(1), ErrorKind::Transient, 10);
        }
        assert_eq!(task.state, TaskState::Disabled);
        assert!(!task.is_due(now + chrono::Duration::seconds(1)));
    }

    #[test]
    fn failure_transitions_to_cooling_before_disable_threshold() {
        let now = Utc::now();
        let mut task = CollectionTask::new(AssetId::new("bitcoin"), Tier::HighFrequency, "coingecko", now);
        task.record_failure(now, std::time::Duration::from_secs(5), ErrorKind::Transient, 10);
        assert_eq!(task.state, TaskState::Cooling);
        assert_eq!(task.consecutive_failures, 1);
        assert_eq!(task.next_fire_at, now + chrono::Duration::milliseconds(5000));
    }
}
