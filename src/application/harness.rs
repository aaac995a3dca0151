//! Strategy execution harness (C5, §4.5).
//!
//! Runs every enabled strategy concurrently over one immutable
//! [`MarketSnapshot`], bounded by a fixed-size worker pool (§4.10
//! "Strategies run on a separate bounded pool, default 4"); a strategy that
//! panics, errors, or exceeds its deadline is isolated — its signals are
//! dropped, the rest proceed. Grounded on the teacher's per-agent
//! `tokio::spawn` + `tokio::time::timeout` pattern
//! (`application/agents/analyst.rs`), generalized from "one analyst per
//! symbol" to "one task per strategy over the whole snapshot"; the bounded
//! pool itself mirrors the scheduler's `Semaphore`-gated worker pool
//! (`application::scheduler::scheduler::TierScheduler`).

use crate::application::strategies::traits::{StrategyAnalysis, TradingStrategy};
use crate::domain::types::{MarketSnapshot, TradingSignal};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::warn;

pub struct HarnessOutcome {
    pub signals: Vec<TradingSignal>,
    pub analyses: Vec<(String, Vec<StrategyAnalysis>)>,
}

/// Run `strategies` over `snapshot`, each bounded by `deadline` and admitted
/// through a pool of `worker_pool_size` concurrent slots. Failures and
/// timeouts are logged and dropped rather than propagated (§4.5: "one
/// strategy's failure is isolated").
pub async fn run(
    strategies: &[(Arc<dyn TradingStrategy>, f64)],
    snapshot: Arc<MarketSnapshot>,
    deadline: Duration,
    worker_pool_size: usize,
) -> HarnessOutcome {
    let permits = Arc::new(Semaphore::new(worker_pool_size.max(1)));
    let mut handles = Vec::with_capacity(strategies.len());
    for (strategy, _weight) in strategies {
        let strategy = strategy.clone();
        let snapshot = snapshot.clone();
        let permits = permits.clone();
        handles.push(tokio::spawn(async move {
            let _permit = permits.acquire_owned().await.expect("semaphore never closed");
            let name = strategy.name().to_string();
            let result = tokio::time::timeout(deadline, async {
                let analyses = strategy.analyze(&snapshot);
                let signals = strategy.generate_signals(&analyses);
                (analyses, signals)
            })
            .await;
            (name, result)
        }));
    }

    let mut signals = Vec::new();
    let mut analyses = Vec::new();
    for handle in handles {
        match handle.await {
            Ok((name, Ok((strategy_analyses, strategy_signals)))) => {
                analyses.push((name, strategy_analyses));
                signals.extend(strategy_signals);
            }
            Ok((name, Err(_elapsed))) => {
                warn!(strategy = %name, "strategy execution exceeded deadline, dropping its output");
            }
            Err(join_err) => {
                warn!(error = %join_err, "strategy task panicked, dropping its output");
            }
        }
    }

    HarnessOutcome { signals, analyses }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{AssetId, Direction};
    use std::collections::HashMap;

    struct InstantStrategy {
        name: &'static str,
        direction: Direction,
    }

    impl TradingStrategy for InstantStrategy {
        fn analyze(&self, snapshot: &MarketSnapshot) -> Vec<StrategyAnalysis> {
            snapshot
                .bars
                .keys()
                .map(|asset_id| StrategyAnalysis {
                    asset_id: asset_id.clone(),
                    metrics: HashMap::new(),
                    volatility_percentile: None,
                })
                .collect()
        }

        fn generate_signals(&self, analyses: &[StrategyAnalysis]) -> Vec<TradingSignal> {
            analyses
                .iter()
                .map(|a| {
                    TradingSignal::new(
                        self.name,
                        a.asset_id.clone(),
                        self.direction,
                        rust_decimal::Decimal::ONE,
                        0.9,
                        chrono::Utc::now(),
                    )
                })
                .collect()
        }

        fn name(&self) -> &str {
            self.name
        }

        fn parameters(&self) -> HashMap<String, f64> {
            HashMap::new()
        }
    }

    fn snapshot_with_one_asset() -> Arc<MarketSnapshot> {
        let asset = AssetId::new("bitcoin");
        let mut bars = HashMap::new();
        bars.insert(
            asset,
            vec![crate::domain::types::OHLCVBar::new(
                AssetId::new("bitcoin"),
                0,
                rust_decimal::Decimal::ONE,
                rust_decimal::Decimal::ONE,
                rust_decimal::Decimal::ONE,
                rust_decimal::Decimal::ONE,
                rust_decimal::Decimal::ONE,
            )
            .unwrap()],
        );
        Arc::new(MarketSnapshot {
            bars,
            macro_series: HashMap::new(),
            produced_at: Some(chrono::Utc::now()),
        })
    }

    #[tokio::test]
    async fn collects_signals_from_all_strategies() {
        let strategies: Vec<(Arc<dyn TradingStrategy>, f64)> = vec![
            (Arc::new(InstantStrategy { name: "a", direction: Direction::Long }), 1.0),
            (Arc::new(InstantStrategy { name: "b", direction: Direction::Short }), 1.0),
        ];
        let outcome = run(&strategies, snapshot_with_one_asset(), Duration::from_secs(1), 4).await;
        assert_eq!(outcome.signals.len(), 2);
        assert_eq!(outcome.analyses.len(), 2);
    }

    #[tokio::test]
    async fn empty_snapshot_yields_no_signals_without_erroring() {
        let strategies: Vec<(Arc<dyn TradingStrategy>, f64)> = vec![
            (Arc::new(InstantStrategy { name: "fast", direction: Direction::Long }), 1.0),
        ];
        let snapshot = Arc::new(MarketSnapshot::default());
        let outcome = run(&strategies, snapshot, Duration::from_millis(50), 4).await;
        assert!(outcome.signals.is_empty());
        assert_eq!(outcome.analyses.len(), 1);
    }

    #[tokio::test]
    async fn a_single_slot_pool_still_runs_every_strategy() {
        let strategies: Vec<(Arc<dyn TradingStrategy>, f64)> = vec![
            (Arc::new(InstantStrategy { name: "a", direction: Direction::Long }), 1.0),
            (Arc::new(InstantStrategy { name: "b", direction: Direction::Short }), 1.0),
            (Arc::new(InstantStrategy { name: "c", direction: Direction::Long }), 1.0),
        ];
        let outcome = run(&strategies, snapshot_with_one_asset(), Duration::from_secs(1), 1).await;
        assert_eq!(outcome.signals.len(), 3);
        assert_eq!(outcome.analyses.len(), 3);
    }
}
