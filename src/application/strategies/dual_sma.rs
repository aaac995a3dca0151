//! Dual simple-moving-average crossover strategy.
//!
//! Grounded on the teacher's `legacy::DualSMAStrategy`: golden-cross /
//! death-cross logic kept, reworked to read closes straight out of a
//! [`MarketSnapshot`] instead of a per-symbol `AnalysisContext`.

use crate::application::strategies::traits::{StrategyAnalysis, TradingStrategy};
use crate::domain::types::{Direction, MarketSnapshot, TradingSignal};
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct DualSmaStrategy {
    pub fast_period: usize,
    pub slow_period: usize,
    pub threshold: Decimal,
}

impl DualSmaStrategy {
    pub fn new(fast_period: usize, slow_period: usize, threshold: Decimal) -> Self {
        Self {
            fast_period,
            slow_period,
            threshold,
        }
    }

    fn sma(closes: &[Decimal], period: usize) -> Option<Decimal> {
        if closes.len() < period || period == 0 {
            return None;
        }
        let window = &closes[closes.len() - period..];
        let sum: Decimal = window.iter().sum();
        Some(sum / Decimal::from(period as u64))
    }
}

impl Default for DualSmaStrategy {
    fn default() -> Self {
        use rust_decimal_macros::dec;
        Self::new(20, 60, dec!(0.001))
    }
}

impl TradingStrategy for DualSmaStrategy {
    fn analyze(&self, snapshot: &MarketSnapshot) -> Vec<StrategyAnalysis> {
        let mut out = Vec::new();
        for (asset_id, bars) in &snapshot.bars {
            let closes: Vec<Decimal> = bars.iter().map(|b| b.close).collect();
            let (Some(fast), Some(slow)) = (
                Self::sma(&closes, self.fast_period),
                Self::sma(&closes, self.slow_period),
            ) else {
                continue;
            };
            let mut metrics = HashMap::new();
            metrics.insert("fast_sma".to_string(), fast.to_string().parse().unwrap_or(0.0));
            metrics.insert("slow_sma".to_string(), slow.to_string().parse().unwrap_or(0.0));
            if let Some(last) = closes.last() {
                metrics.insert("price".to_string(), last.to_string().parse().unwrap_or(0.0));
            }
            out.push(StrategyAnalysis {
                asset_id: asset_id.clone(),
                metrics,
                volatility_percentile: None,
            });
        }
        out
    }

    fn generate_signals(&self, analyses: &[StrategyAnalysis]) -> Vec<TradingSignal> {
        let mut signals = Vec::new();
        let now = Utc::now();
        for analysis in analyses {
            let (Some(&fast), Some(&slow), Some(&price)) = (
                analysis.metrics.get("fast_sma"),
                analysis.metrics.get("slow_sma"),
                analysis.metrics.get("price"),
            ) else {
                continue;
            };
            if slow == 0.0 || price <= 0.0 {
                continue;
            }
            let threshold: f64 = self.threshold.to_string().parse().unwrap_or(0.0);
            let spread = (fast - slow) / slow;
            if spread > threshold {
                let confidence = (spread / (threshold.max(1e-9) * 4.0)).clamp(0.1, 1.0);
                signals.push(TradingSignal::new(
                    self.name(),
                    analysis.asset_id.clone(),
                    Direction::Long,
                    Decimal::try_from(price).unwrap_or(Decimal::ZERO),
                    confidence,
                    now,
                ));
            } else if spread < -threshold {
                let confidence = (-spread / (threshold.max(1e-9) * 4.0)).clamp(0.1, 1.0);
                signals.push(TradingSignal::new(
                    self.name(),
                    analysis.asset_id.clone(),
                    Direction::Short,
                    Decimal::try_from(price).unwrap_or(Decimal::ZERO),
                    confidence,
                    now,
                ));
            }
        }
        signals
    }

    fn name(&self) -> &str {
        "dual_sma"
    }

    fn parameters(&self) -> HashMap<String, f64> {
        let mut params = HashMap::new();
        params.insert("fast_period".to_string(), self.fast_period as f64);
        params.insert("slow_period".to_string(), self.slow_period as f64);
        params.insert(
            "threshold".to_string(),
            self.threshold.to_string().parse().unwrap_or(0.0),
        );
        params
    }
}
