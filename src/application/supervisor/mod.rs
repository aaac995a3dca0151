//! Supervisor (C9, §4.9).
//!
//! Owns the lifetime of the collection scheduler and the signal pipeline:
//! starts them in dependency order, polls their health, restarts a
//! component that crashes (bounded backoff, capped restart count), and
//! drains in-flight work on shutdown signal. Grounded on the teacher's
//! `Application::start` + `ShutdownService`
//! (`application/system/mod.rs`, `application/system/shutdown_service.rs`)
//! for the two-phase build/run shape and the ctrl_c-driven graceful exit;
//! the health registry (`infrastructure::observability::status_registry`)
//! is grounded on `AgentStatusRegistry`.

use crate::application::aggregator;
use crate::application::alerts::{self, AlertGenerator};
use crate::application::harness;
use crate::application::retry::{delay_for_attempt, BackoffConfig};
use crate::application::risk;
use crate::application::scheduler::TierScheduler;
use crate::application::strategies::traits::TradingStrategy;
use crate::config::{AggregationConfig, AlertsConfig, RiskConfig, StrategiesConfig, SupervisorConfig, TiersConfig};
use crate::domain::errors::SupervisorError;
use crate::domain::ports::{AlertSink, MarketDataRepository};
use crate::domain::types::{AssetId, PortfolioState};
use crate::infrastructure::observability::metrics::Metrics;
use crate::infrastructure::observability::{ComponentStatusRegistry, HealthStatus};
use chrono::Utc;
use rust_decimal::prelude::FromPrimitive;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, RwLock};
use tracing::{error, info, warn};

/// Everything the supervisor needs to run the signal pipeline, wired by the
/// caller (mirrors `SchedulerDeps`: explicit injection, no self-construction).
pub struct SupervisorDeps {
    pub scheduler: Arc<TierScheduler>,
    pub repository: Arc<dyn MarketDataRepository>,
    pub strategies: Vec<(Arc<dyn TradingStrategy>, f64)>,
    pub alert_sink: Arc<dyn AlertSink>,
    pub metrics: Arc<Metrics>,
    pub portfolio: Arc<RwLock<PortfolioState>>,
    pub asset_ids: Vec<AssetId>,
}

pub struct Supervisor {
    deps: SupervisorDeps,
    registry: Arc<ComponentStatusRegistry>,
    tiers: TiersConfig,
    aggregation: AggregationConfig,
    risk_config: RiskConfig,
    alerts_config: AlertsConfig,
    strategies_config: StrategiesConfig,
    config: SupervisorConfig,
}

impl Supervisor {
    pub fn new(
        deps: SupervisorDeps,
        tiers: TiersConfig,
        aggregation: AggregationConfig,
        risk_config: RiskConfig,
        alerts_config: AlertsConfig,
        strategies_config: StrategiesConfig,
        config: SupervisorConfig,
    ) -> Self {
        Self {
            deps,
            registry: Arc::new(ComponentStatusRegistry::new()),
            tiers,
            aggregation,
            risk_config,
            alerts_config,
            strategies_config,
            config,
        }
    }

    pub fn health_registry(&self) -> Arc<ComponentStatusRegistry> {
        self.registry.clone()
    }

    /// Start every component in dependency order (sink → repo → scheduler →
    /// harness → aggregator → risk → alert → external surface, §4.9), then
    /// block until a shutdown signal arrives and drain completes.
    pub async fn run(self: Arc<Self>) -> anyhow::Result<()> {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let collection_handle = tokio::spawn(
            self.clone()
                .supervised_loop("collection_scheduler", shutdown_rx.clone(), Supervisor::collection_iteration),
        );
        let signal_handle = tokio::spawn(
            self.clone()
                .supervised_loop("signal_pipeline", shutdown_rx.clone(), Supervisor::signal_iteration),
        );
        let health_handle = tokio::spawn(self.clone().health_poll_loop(shutdown_rx.clone()));

        tokio::signal::ctrl_c().await?;
        info!("shutdown signal received, draining in-flight work");
        let _ = shutdown_tx.send(true);

        let drain_deadline = Duration::from_secs(self.config.drain_deadline_seconds);
        let drained = tokio::time::timeout(drain_deadline, async {
            let _ = collection_handle.await;
            let _ = signal_handle.await;
            let _ = health_handle.await;
        })
        .await;

        if drained.is_err() {
            warn!(
                deadline_ms = drain_deadline.as_millis() as u64,
                "drain deadline exceeded, components force-canceled by process exit"
            );
            return Err(SupervisorError::DrainTimeout {
                deadline_ms: drain_deadline.as_millis() as u64,
                pending: 1,
            }
            .into());
        }

        info!("graceful shutdown complete");
        Ok(())
    }

    /// Run `iteration` in a loop, restarting it with exponential backoff on
    /// failure up to `maxRestarts` (§4.9, §7 "crashes the process only
    /// after maxRestarts on a core component").
    async fn supervised_loop<F, Fut>(self: Arc<Self>, name: &'static str, shutdown: watch::Receiver<bool>, iteration: F) -> anyhow::Result<()>
    where
        F: Fn(Arc<Self>, watch::Receiver<bool>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let backoff = BackoffConfig::default();
        let mut attempt = 0u32;
        loop {
            self.registry.report(name, HealthStatus::Starting, None).await;
            match iteration(self.clone(), shutdown.clone()).await {
                Ok(()) => {
                    self.registry.report(name, HealthStatus::Healthy, None).await;
                    return Ok(());
                }
                Err(err) => {
                    attempt += 1;
                    self.registry
                        .report(name, HealthStatus::Dead, Some(err.to_string()))
                        .await;
                    if *shutdown.borrow() {
                        return Ok(());
                    }
                    if attempt > self.config.max_restarts {
                        error!(component = name, attempts = attempt, "restart budget exhausted");
                        return Err(SupervisorError::RestartBudgetExhausted {
                            component: name.to_string(),
                            max_restarts: self.config.max_restarts,
                        }
                        .into());
                    }
                    let delay = delay_for_attempt(&backoff, attempt);
                    warn!(component = name, attempt, delay_ms = delay.as_millis() as u64, error = %err, "component crashed, restarting");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Poll component health every `healthPollSeconds`; a component stuck
    /// above `unhealthyStreak` is logged loudly. Crash recovery itself
    /// happens in `supervised_loop` above — this loop is the
    /// operator-visible signal of a hang rather than a crash.
    async fn health_poll_loop(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(Duration::from_secs(self.config.health_poll_seconds));
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    for status in self.registry.snapshot().await.values() {
                        if status.consecutive_unhealthy >= self.config.unhealthy_streak {
                            warn!(
                                component = %status.name,
                                streak = status.consecutive_unhealthy,
                                message = ?status.message,
                                "component unhealthy past threshold"
                            );
                        }
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        return;
                    }
                }
            }
        }
    }

    async fn collection_iteration(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
        let poll_interval = Duration::from_secs(self.tiers.high_frequency_seconds.max(4) / 4);
        let mut ticker = tokio::time::interval(poll_interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.deps.scheduler.run_tick().await?;
                    self.registry.report("collection_scheduler", HealthStatus::Healthy, None).await;
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        return Ok(());
                    }
                }
            }
        }
    }

    async fn signal_iteration(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
        let mut ticker = tokio::time::interval(Duration::from_secs(self.tiers.high_frequency_seconds));
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.run_signal_cycle().await {
                        Ok(()) => {
                            self.registry.report("signal_pipeline", HealthStatus::Healthy, None).await;
                        }
                        Err(err) => {
                            warn!(error = %err, "signal pipeline cycle failed");
                            self.registry
                                .report("signal_pipeline", HealthStatus::Degraded, Some(err.to_string()))
                                .await;
                        }
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// One pass of the signal leg: Harness → Strategies → Aggregator →
    /// Risk Orchestrator → AlertGenerator → Sink (§2 control/data flow).
    async fn run_signal_cycle(&self) -> anyhow::Result<()> {
        let snapshot = self.deps.repository.get_snapshot(&self.deps.asset_ids).await?;
        let deadline = Duration::from_millis(self.strategies_config.execution_deadline_ms);
        let outcome = harness::run(
            &self.deps.strategies,
            Arc::new(snapshot),
            deadline,
            self.config.strategy_worker_pool_size,
        )
        .await;

        for (strategy_name, analyses) in &outcome.analyses {
            for signal in outcome.signals.iter().filter(|s| &s.strategy_name == strategy_name) {
                self.deps
                    .metrics
                    .signals_emitted_total
                    .with_label_values(&[strategy_name, &format!("{:?}", signal.direction)])
                    .inc();
            }
            for analysis in analyses {
                let Some(percentile) = analysis.volatility_percentile else {
                    continue;
                };
                if percentile < self.alerts_config.volatility_percentile_threshold {
                    continue;
                }
                let price = analysis.metrics.get("price").copied().unwrap_or(0.0);
                let volatility = analysis.metrics.get("std_dev").copied().unwrap_or(0.0);
                let Some(price_decimal) = rust_decimal::Decimal::from_f64_retain(price) else {
                    continue;
                };
                if let Some(alert) = AlertGenerator::volatility_spike(
                    &analysis.asset_id,
                    price_decimal,
                    volatility,
                    percentile,
                    self.alerts_config.volatility_percentile_threshold,
                    Utc::now(),
                ) {
                    self.deps.metrics.alerts_total.with_label_values(&["VOLATILITY_SPIKE"]).inc();
                    alerts::dispatch(self.deps.alert_sink.as_ref(), alert).await;
                }
            }
        }

        let now = Utc::now();
        let aggregated = aggregator::aggregate(&outcome.signals, &self.aggregation, now);
        self.deps
            .metrics
            .aggregated_signals_total
            .with_label_values(&["all"])
            .inc_by(aggregated.len() as f64);

        let portfolio = self.deps.portfolio.read().await.clone();
        for signal in &aggregated {
            let assessment = risk::assess(signal, &portfolio, &self.risk_config);
            self.deps
                .metrics
                .risk_assessments_total
                .with_label_values(&[&assessment.approved.to_string(), &format!("{:?}", assessment.risk_level)])
                .inc();
            if let Some(alert) = AlertGenerator::from_assessment(signal, &assessment, now) {
                self.deps.metrics.alerts_total.with_label_values(&["SIGNAL"]).inc();
                alerts::dispatch(self.deps.alert_sink.as_ref(), alert).await;
            }
        }
        Ok(())
    }
}
