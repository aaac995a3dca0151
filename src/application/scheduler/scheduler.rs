//! Tiered collection scheduler (C4, §4.4).
//!
//! Grounded on the teacher's `MarketScanner::run` (`tokio::select!` over a
//! tick interval plus a heartbeat) for the outer loop shape, generalized
//! from "one scan of the market" to "dispatch every currently-due
//! CollectionTask subject to a bounded worker pool and per-provider rate
//! gates."

use crate::application::collection_task::{self, Outcome};
use crate::application::retry::BackoffConfig;
use crate::application::scheduler::persistence::{PersistedState, SchedulerPersistence};
use crate::application::scheduler::task_state::CollectionTask;
use crate::config::tiers::TiersConfig;
use crate::domain::errors::ErrorKind;
use crate::domain::ports::{MarketDataRepository, MarketDataSource};
use crate::domain::types::AssetId;
use crate::infrastructure::clock::Clock;
use crate::infrastructure::observability::metrics::Metrics;
use crate::infrastructure::rate_gate::RateGate;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, Semaphore};
use tracing::{info, warn};

/// Everything the scheduler needs to dispatch one collection task, wired by
/// the supervisor at startup (§9: explicit dependency injection, no
/// self-constructed collaborators).
pub struct SchedulerDeps {
    pub sources: HashMap<String, Arc<dyn MarketDataSource>>,
    pub rate_gates: HashMap<String, Arc<RateGate>>,
    pub repository: Arc<dyn MarketDataRepository>,
    pub clock: Arc<dyn Clock>,
    pub metrics: Arc<Metrics>,
}

pub struct TierScheduler {
    tasks: RwLock<Vec<CollectionTask>>,
    deps: SchedulerDeps,
    tiers: TiersConfig,
    backoff: BackoffConfig,
    disable_threshold: u32,
    worker_permits: Semaphore,
    persistence: SchedulerPersistence,
}

impl TierScheduler {
    pub fn new(
        tasks: Vec<CollectionTask>,
        deps: SchedulerDeps,
        tiers: TiersConfig,
        backoff: BackoffConfig,
        disable_threshold: u32,
        worker_pool_size: usize,
        persistence: SchedulerPersistence,
    ) -> Self {
        Self {
            tasks: RwLock::new(tasks),
            deps,
            tiers,
            backoff,
            disable_threshold,
            worker_permits: Semaphore::new(worker_pool_size.max(1)),
            persistence,
        }
    }

    /// Restore a scheduler from persisted state, falling back to freshly
    /// constructed IDLE tasks (every task fires within one scheduling
    /// quantum, per the first-run boundary behavior in §8) when no state
    /// file exists yet.
    pub async fn restore_or_new(
        configured: Vec<(AssetId, crate::domain::types::Tier, String)>,
        deps: SchedulerDeps,
        tiers: TiersConfig,
        backoff: BackoffConfig,
        disable_threshold: u32,
        worker_pool_size: usize,
        persistence: SchedulerPersistence,
    ) -> anyhow::Result<Self> {
        let now = deps.clock.now_utc();
        let tasks = match persistence.load().await? {
            Some(state) => {
                let mut by_key: HashMap<(AssetId, crate::domain::types::Tier), CollectionTask> = state
                    .tasks
                    .into_iter()
                    .map(|t| ((t.asset_id.clone(), t.tier), t))
                    .collect();
                configured
                    .into_iter()
                    .map(|(asset_id, tier, provider)| {
                        by_key
                            .remove(&(asset_id.clone(), tier))
                            .unwrap_or_else(|| CollectionTask::new(asset_id, tier, provider, now))
                    })
                    .collect()
            }
            None => configured
                .into_iter()
                .map(|(asset_id, tier, provider)| CollectionTask::new(asset_id, tier, provider, now))
                .collect(),
        };
        Ok(Self::new(
            tasks,
            deps,
            tiers,
            backoff,
            disable_threshold,
            worker_pool_size,
            persistence,
        ))
    }

    /// Pick the due task with the smallest `nextFireAt`, tie-broken by tier
    /// priority then AssetId lexicographic order (§4.4 scheduling contract),
    /// without mutating scheduler state.
    async fn pick_due(&self, now: chrono::DateTime<chrono::Utc>) -> Vec<usize> {
        let tasks = self.tasks.read().await;
        let mut due: Vec<usize> = (0..tasks.len()).filter(|&i| tasks[i].is_due(now)).collect();
        due.sort_by(|&a, &b| {
            tasks[a]
                .next_fire_at
                .cmp(&tasks[b].next_fire_at)
                .then_with(|| tasks[a].tier.priority().cmp(&tasks[b].tier.priority()))
                .then_with(|| tasks[a].asset_id.cmp(&tasks[b].asset_id))
        });
        due
    }

    /// Run every currently-due task once, subject to the worker pool cap and
    /// per-provider rate gates, then persist the resulting state. Returns one
    /// outcome per dispatched task, in dispatch order, for tests and metrics.
    pub async fn run_tick(&self) -> anyhow::Result<Vec<(AssetId, Outcome)>> {
        let now = self.deps.clock.now_utc();
        let due_indices = self.pick_due(now).await;
        if due_indices.is_empty() {
            return Ok(vec![]);
        }

        let mut handles = Vec::with_capacity(due_indices.len());
        for idx in due_indices {
            let permit = self
                .worker_permits
                .acquire()
                .await
                .expect("scheduler semaphore never closed");

            let (asset_id, tier, provider, interval) = {
                let mut tasks = self.tasks.write().await;
                let task = &mut tasks[idx];
                task.mark_running();
                (
                    task.asset_id.clone(),
                    task.tier,
                    task.provider.clone(),
                    self.tiers.interval_seconds(task.tier),
                )
            };

            let Some(source) = self.deps.sources.get(&provider).cloned() else {
                warn!(asset_id = %asset_id, provider, "no MarketDataSource configured for provider");
                continue;
            };
            let Some(rate_gate) = self.deps.rate_gates.get(&provider).cloned() else {
                warn!(asset_id = %asset_id, provider, "no rate gate configured for provider");
                continue;
            };
            let repository = self.deps.repository.clone();
            let last_success_at_ms = {
                let tasks = self.tasks.read().await;
                tasks[idx].last_success_at.map(|t| t.timestamp_millis())
            };

            let tier_interval = Duration::from_secs(interval);
            let overall_deadline = std::time::Instant::now() + tier_interval / 2;

            handles.push(tokio::spawn(async move {
                let _permit = permit;
                let outcome = collection_task::run(
                    &asset_id,
                    last_success_at_ms,
                    tier_interval,
                    overall_deadline,
                    source.as_ref(),
                    repository.as_ref(),
                    &rate_gate,
                )
                .await;
                (idx, asset_id, tier, outcome)
            }));
        }

        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            let (idx, asset_id, _tier, outcome) = handle.await?;
            self.apply_outcome(idx, now, &outcome).await;
            results.push((asset_id, outcome));
        }

        self.persist().await?;
        Ok(results)
    }

    async fn apply_outcome(&self, idx: usize, now: chrono::DateTime<chrono::Utc>, outcome: &Outcome) {
        let mut tasks = self.tasks.write().await;
        let task = &mut tasks[idx];
        let provider = task.provider.clone();
        match outcome {
            Outcome::Success { bars_stored, .. } => {
                task.record_success(now, &self.tiers);
                self.deps
                    .metrics
                    .provider_calls_total
                    .with_label_values(&[&provider, "success"])
                    .inc();
                info!(asset_id = %task.asset_id, bars_stored, "collection task succeeded");
            }
            Outcome::Failure { kind, message, hinted_delay } => {
                let attempt = task.consecutive_failures;
                let delay = hinted_delay
                    .unwrap_or_else(|| crate::application::retry::delay_for_attempt(&self.backoff, attempt));
                task.record_failure(now, delay, *kind, self.disable_threshold);
                self.deps
                    .metrics
                    .provider_calls_total
                    .with_label_values(&[&provider, "failure"])
                    .inc();
                warn!(asset_id = %task.asset_id, error = message, ?kind, "collection task failed");
            }
            Outcome::Canceled => {
                task.record_failure(now, Duration::from_secs(1), ErrorKind::Transient, self.disable_threshold);
                self.deps
                    .metrics
                    .provider_calls_total
                    .with_label_values(&[&provider, "canceled"])
                    .inc();
                warn!(asset_id = %task.asset_id, "collection task canceled at deadline");
            }
        }
        let tier_label = task.tier.to_string();
        self.deps
            .metrics
            .task_state
            .with_label_values(&[task.asset_id.as_str(), &tier_label, &format!("{:?}", task.state)])
            .set(1.0);
        self.deps
            .metrics
            .task_consecutive_failures
            .with_label_values(&[task.asset_id.as_str(), &tier_label])
            .set(task.consecutive_failures as f64);
    }

    async fn persist(&self) -> anyhow::Result<()> {
        let tasks = self.tasks.read().await.clone();
        let state = PersistedState::new(tasks, self.deps.clock.now_utc());
        self.persistence.save(&state).await
    }

    /// Production entry point: loop forever, dispatching due tasks every
    /// `poll_interval`. Graceful shutdown is the caller's responsibility
    /// (see `application::supervisor`), driven by dropping this future.
    pub async fn run_forever(&self, poll_interval: Duration) -> anyhow::Result<()> {
        let mut ticker = tokio::time::interval(poll_interval);
        loop {
            ticker.tick().await;
            if let Err(err) = self.run_tick().await {
                warn!(error = %err, "scheduler tick failed");
            }
        }
    }

    pub async fn snapshot(&self) -> Vec<CollectionTask> {
        self.tasks.read().await.clone()
    }
}
