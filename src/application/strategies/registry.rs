//! Static strategy registry (C5, Source Pattern in SPEC_FULL.md §9).
//!
//! Grounded on the teacher's `StrategyFactory::create`: a plain `match` over
//! a mode enum, replaced here with a match over the configured strategy
//! name, since the teacher's reflection/file-discovery alternative is one of
//! the explicitly re-architected Source Patterns.

use crate::application::strategies::dual_sma::DualSmaStrategy;
use crate::application::strategies::traits::TradingStrategy;
use crate::application::strategies::zscore_mean_reversion::ZScoreMeanReversionStrategy;
use crate::config::strategies::StrategyConfig;
use rust_decimal::Decimal;
use std::sync::Arc;

/// Build the enabled strategies named in config. Unknown strategy names are
/// logged and skipped rather than treated as a fatal config error, since the
/// set of known strategies is expected to grow independently of config
/// rollout.
pub fn build_enabled(configs: &[StrategyConfig]) -> Vec<(Arc<dyn TradingStrategy>, f64)> {
    configs
        .iter()
        .filter(|c| c.enabled)
        .filter_map(|c| build_one(c).map(|strategy| (strategy, c.weight)))
        .collect()
}

fn build_one(config: &StrategyConfig) -> Option<Arc<dyn TradingStrategy>> {
    match config.name.as_str() {
        "dual_sma" => {
            let fast = config.params.get("fast_period").copied().unwrap_or(20.0) as usize;
            let slow = config.params.get("slow_period").copied().unwrap_or(60.0) as usize;
            let threshold = config.params.get("threshold").copied().unwrap_or(0.001);
            Some(Arc::new(DualSmaStrategy::new(
                fast,
                slow,
                Decimal::try_from(threshold).unwrap_or_default(),
            )))
        }
        "zscore_mean_reversion" => {
            let lookback = config.params.get("lookback_period").copied().unwrap_or(20.0) as usize;
            let entry = config.params.get("entry_threshold").copied().unwrap_or(-2.0);
            let exit = config.params.get("exit_threshold").copied().unwrap_or(0.0);
            Some(Arc::new(ZScoreMeanReversionStrategy::new(lookback, entry, exit)))
        }
        other => {
            tracing::warn!(strategy = other, "unknown strategy name in config, skipping");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn builds_known_strategies_and_skips_unknown() {
        let configs = vec![
            StrategyConfig {
                name: "dual_sma".to_string(),
                enabled: true,
                weight: 1.0,
                params: HashMap::new(),
            },
            StrategyConfig {
                name: "not_a_real_strategy".to_string(),
                enabled: true,
                weight: 1.0,
                params: HashMap::new(),
            },
            StrategyConfig {
                name: "zscore_mean_reversion".to_string(),
                enabled: false,
                weight: 1.0,
                params: HashMap::new(),
            },
        ];
        let built = build_enabled(&configs);
        assert_eq!(built.len(), 1);
        assert_eq!(built[0].0.name(), "dual_sma");
    }
}
