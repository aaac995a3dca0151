//! Z-score mean-reversion strategy.
//!
//! Grounded on the teacher's `statistical::ZScoreMeanReversionStrategy`:
//! same `statrs`-backed mean/stddev calculation and entry/exit thresholds,
//! reworked to read from a [`MarketSnapshot`] and to report a volatility
//! percentile so the alert generator can raise VOLATILITY_SPIKE alerts
//! (§4.8) from the same analysis pass.

use crate::application::strategies::traits::{StrategyAnalysis, TradingStrategy};
use crate::domain::types::{Direction, MarketSnapshot, TradingSignal};
use chrono::Utc;
use rust_decimal::prelude::*;
use statrs::statistics::{Data, Distribution};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct ZScoreMeanReversionStrategy {
    pub lookback_period: usize,
    pub entry_threshold: f64,
    pub exit_threshold: f64,
    pub min_data_points: usize,
}

impl ZScoreMeanReversionStrategy {
    pub fn new(lookback_period: usize, entry_threshold: f64, exit_threshold: f64) -> Self {
        Self {
            lookback_period,
            entry_threshold,
            exit_threshold,
            min_data_points: lookback_period.max(20),
        }
    }
}

impl Default for ZScoreMeanReversionStrategy {
    fn default() -> Self {
        Self::new(20, -2.0, 0.0)
    }
}

impl TradingStrategy for ZScoreMeanReversionStrategy {
    fn analyze(&self, snapshot: &MarketSnapshot) -> Vec<StrategyAnalysis> {
        let mut out = Vec::new();
        for (asset_id, bars) in &snapshot.bars {
            if bars.len() < self.min_data_points {
                continue;
            }
            let prices: Vec<f64> = bars
                .iter()
                .rev()
                .take(self.lookback_period)
                .filter_map(|b| b.close.to_f64())
                .collect();
            if prices.len() < self.lookback_period {
                continue;
            }
            let data = Data::new(prices.clone());
            let (Some(mean), Some(std_dev)) = (data.mean(), data.std_dev()) else {
                continue;
            };
            if std_dev == 0.0 {
                continue;
            }
            let last_price = bars.last().map(|b| b.close.to_f64().unwrap_or(0.0)).unwrap_or(0.0);
            let z_score = (last_price - mean) / std_dev;

            let mut metrics = HashMap::new();
            metrics.insert("z_score".to_string(), z_score);
            metrics.insert("mean".to_string(), mean);
            metrics.insert("std_dev".to_string(), std_dev);
            metrics.insert("price".to_string(), last_price);

            // Volatility percentile proxy: coefficient of variation, clamped to [0,1]
            // and reported as a percentile so the alert generator (§4.8) can compare
            // it against a configured threshold.
            let volatility_percentile = if mean.abs() > f64::EPSILON {
                Some((std_dev / mean.abs()).clamp(0.0, 1.0))
            } else {
                None
            };

            out.push(StrategyAnalysis {
                asset_id: asset_id.clone(),
                metrics,
                volatility_percentile,
            });
        }
        out
    }

    fn generate_signals(&self, analyses: &[StrategyAnalysis]) -> Vec<TradingSignal> {
        let mut signals = Vec::new();
        let now = Utc::now();
        for analysis in analyses {
            let (Some(&z_score), Some(&price)) =
                (analysis.metrics.get("z_score"), analysis.metrics.get("price"))
            else {
                continue;
            };
            if price <= 0.0 {
                continue;
            }
            if z_score <= self.entry_threshold {
                let magnitude = (self.entry_threshold - z_score).abs();
                let confidence = (magnitude / 2.0).clamp(0.1, 1.0);
                signals.push(TradingSignal::new(
                    self.name(),
                    analysis.asset_id.clone(),
                    Direction::Long,
                    rust_decimal::Decimal::try_from(price).unwrap_or(rust_decimal::Decimal::ZERO),
                    confidence,
                    now,
                ));
            } else if z_score >= self.exit_threshold + 2.0 {
                let magnitude = (z_score - self.exit_threshold).abs();
                let confidence = (magnitude / 2.0).clamp(0.1, 1.0);
                signals.push(TradingSignal::new(
                    self.name(),
                    analysis.asset_id.clone(),
                    Direction::Short,
                    rust_decimal::Decimal::try_from(price).unwrap_or(rust_decimal::Decimal::ZERO),
                    confidence,
                    now,
                ));
            }
        }
        signals
    }

    fn name(&self) -> &str {
        "zscore_mean_reversion"
    }

    fn parameters(&self) -> HashMap<String, f64> {
        let mut params = HashMap::new();
        params.insert("lookback_period".to_string(), self.lookback_period as f64);
        params.insert("entry_threshold".to_string(), self.entry_threshold);
        params.insert("exit_threshold".to_string(), self.exit_threshold);
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{AssetId, OHLCVBar};
    use rust_decimal_macros::dec;
    use std::collections::HashMap as StdHashMap;

    fn bars_with_closes(asset: &AssetId, closes: &[i64]) -> Vec<OHLCVBar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                let price = rust_decimal::Decimal::from(c);
                OHLCVBar::new(
                    asset.clone(),
                    i as i64 * 60_000,
                    price,
                    price + dec!(1),
                    price - dec!(1),
                    price,
                    dec!(10),
                )
                .unwrap()
            })
            .collect()
    }

    #[test]
    fn deep_dip_below_mean_emits_long_signal() {
        let asset = AssetId::new("bitcoin");
        let strategy = ZScoreMeanReversionStrategy::new(20, -2.0, 0.0);
        let mut closes = vec![100; 19];
        closes.push(50); // sharp drop -> large negative z-score
        let mut bars: StdHashMap<AssetId, Vec<OHLCVBar>> = StdHashMap::new();
        bars.insert(asset.clone(), bars_with_closes(&asset, &closes));
        let snapshot = MarketSnapshot {
            bars,
            macro_series: StdHashMap::new(),
            produced_at: Some(Utc::now()),
        };

        let analyses = strategy.analyze(&snapshot);
        assert_eq!(analyses.len(), 1);
        let signals = strategy.generate_signals(&analyses);
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].direction, Direction::Long);
    }

    #[test]
    fn flat_series_has_zero_stddev_and_produces_no_analysis() {
        let asset = AssetId::new("bitcoin");
        let strategy = ZScoreMeanReversionStrategy::new(20, -2.0, 0.0);
        let closes = vec![100; 25];
        let mut bars: StdHashMap<AssetId, Vec<OHLCVBar>> = StdHashMap::new();
        bars.insert(asset.clone(), bars_with_closes(&asset, &closes));
        let snapshot = MarketSnapshot {
            bars,
            macro_series: StdHashMap::new(),
            produced_at: Some(Utc::now()),
        };
        assert!(strategy.analyze(&snapshot).is_empty());
    }
}
