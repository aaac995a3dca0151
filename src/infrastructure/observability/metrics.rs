//! Prometheus metrics, push-based (read via `/metrics`-style text encoding
//! and logged on an interval, not served over HTTP — same philosophy as the
//! teacher's `server.rs` binary).

use prometheus::{
    CounterVec, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
    core::{AtomicF64, GenericGaugeVec},
};
use std::sync::Arc;

#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,
    /// Provider API calls, labeled by provider and outcome.
    pub provider_calls_total: CounterVec,
    /// Time spent waiting on a rate gate, labeled by provider.
    pub rate_gate_wait_seconds: HistogramVec,
    /// Current scheduler state per task, labeled by asset and tier (1.0 = in that state).
    pub task_state: GenericGaugeVec<AtomicF64>,
    /// Consecutive failures per task.
    pub task_consecutive_failures: GenericGaugeVec<AtomicF64>,
    /// Signals emitted by strategies, labeled by strategy and direction.
    pub signals_emitted_total: CounterVec,
    /// Aggregated signals emitted, labeled by asset.
    pub aggregated_signals_total: CounterVec,
    /// Risk assessments, labeled by approved/rejected and risk level.
    pub risk_assessments_total: CounterVec,
    /// Alerts accepted by the sink, labeled by kind.
    pub alerts_total: CounterVec,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let provider_calls_total = CounterVec::new(
            Opts::new("cryptopulse_provider_calls_total", "Provider API calls"),
            &["provider", "outcome"],
        )?;
        registry.register(Box::new(provider_calls_total.clone()))?;

        let rate_gate_wait_seconds = HistogramVec::new(
            HistogramOpts::new(
                "cryptopulse_rate_gate_wait_seconds",
                "Time spent waiting on a provider rate gate",
            ),
            &["provider"],
        )?;
        registry.register(Box::new(rate_gate_wait_seconds.clone()))?;

        let task_state = GaugeVec::new(
            Opts::new("cryptopulse_task_state", "Current scheduler task state (1=active)"),
            &["asset", "tier", "state"],
        )?;
        registry.register(Box::new(task_state.clone()))?;

        let task_consecutive_failures = GaugeVec::new(
            Opts::new(
                "cryptopulse_task_consecutive_failures",
                "Consecutive collection failures per task",
            ),
            &["asset", "tier"],
        )?;
        registry.register(Box::new(task_consecutive_failures.clone()))?;

        let signals_emitted_total = CounterVec::new(
            Opts::new("cryptopulse_signals_emitted_total", "Signals emitted by strategies"),
            &["strategy", "direction"],
        )?;
        registry.register(Box::new(signals_emitted_total.clone()))?;

        let aggregated_signals_total = CounterVec::new(
            Opts::new(
                "cryptopulse_aggregated_signals_total",
                "Aggregated signals emitted per tick",
            ),
            &["asset"],
        )?;
        registry.register(Box::new(aggregated_signals_total.clone()))?;

        let risk_assessments_total = CounterVec::new(
            Opts::new("cryptopulse_risk_assessments_total", "Risk assessments produced"),
            &["approved", "risk_level"],
        )?;
        registry.register(Box::new(risk_assessments_total.clone()))?;

        let alerts_total = CounterVec::new(
            Opts::new("cryptopulse_alerts_total", "Alerts accepted by the sink"),
            &["kind"],
        )?;
        registry.register(Box::new(alerts_total.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            provider_calls_total,
            rate_gate_wait_seconds,
            task_state,
            task_consecutive_failures,
            signals_emitted_total,
            aggregated_signals_total,
            risk_assessments_total,
            alerts_total,
        })
    }

    /// Render the registry as Prometheus text exposition format, for
    /// periodic logging (`METRICS_JSON`-style push, no HTTP server).
    pub fn encode(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        Ok(encoder.encode_to_string(&metric_families)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_register_without_panicking() {
        let metrics = Metrics::new().unwrap();
        metrics
            .provider_calls_total
            .with_label_values(&["coingecko", "success"])
            .inc();
        let encoded = metrics.encode().unwrap();
        assert!(encoded.contains("cryptopulse_provider_calls_total"));
    }
}
