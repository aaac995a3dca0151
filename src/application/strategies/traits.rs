//! Strategy capability set (C5, §4.5).
//!
//! Grounded on the teacher's `application::strategies::traits::TradingStrategy`,
//! reshaped from the teacher's single-method `analyze(&AnalysisContext) -> Option<Signal>`
//! into the two-phase `analyze`/`generate_signals` split this spec calls for,
//! so a strategy can report intermediate analysis separately from the
//! signals it derives from it (useful for volatility-spike detection, §4.8).

use crate::domain::types::{AssetId, MarketSnapshot, TradingSignal};
use std::collections::HashMap;

/// Per-asset analysis a strategy computes from a snapshot before deciding on
/// signals. Deliberately loose (a string-keyed bag of numbers) since each
/// strategy's internal indicators differ; `volatility_percentile` is the one
/// well-known field the alert generator looks for (§4.8 VOLATILITY_SPIKE).
#[derive(Debug, Clone, Default)]
pub struct StrategyAnalysis {
    pub asset_id: AssetId,
    pub metrics: HashMap<String, f64>,
    pub volatility_percentile: Option<f64>,
}

/// A pluggable analytic strategy. Implementations must be `Send + Sync` so
/// the harness can run many of them concurrently over one immutable
/// snapshot (§4.5, §5 "no shared mutable state between strategies").
pub trait TradingStrategy: Send + Sync {
    /// Pure, deterministic given `snapshot`. One entry per asset present in
    /// the snapshot that the strategy has an opinion about.
    fn analyze(&self, snapshot: &MarketSnapshot) -> Vec<StrategyAnalysis>;

    /// Derive trading signals from the strategy's own analysis. May be empty.
    fn generate_signals(&self, analyses: &[StrategyAnalysis]) -> Vec<TradingSignal>;

    /// Strategy name, used as `TradingSignal::strategy_name` and in logs/metrics.
    fn name(&self) -> &str;

    /// Config surface for introspection/logging (Open Question 3: an open
    /// pass-through bag, unrecognized keys retained but inert).
    fn parameters(&self) -> HashMap<String, f64>;
}
