//! Signal aggregator (C6, §4.6).
//!
//! Confidence-weighted voting across strategies, grounded on the teacher's
//! `EnsembleStrategy` (which combines multiple sub-strategy signals into one
//! decision) but reworked from "blend sub-strategies into a synthetic
//! `Signal`" to "partition raw `TradingSignal`s by asset and vote".

use crate::config::aggregation::AggregationConfig;
use crate::domain::types::{AggregatedSignal, Direction, TradingSignal};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Aggregate `signals` observed at `now`, per §4.6: drop stale signals, vote
/// by confidence-weighted sum per direction, require consensus, drop
/// anything below the confidence floor. Output is in deterministic AssetId
/// order (§4.6, §5 ordering guarantee).
pub fn aggregate(
    signals: &[TradingSignal],
    config: &AggregationConfig,
    now: DateTime<Utc>,
) -> Vec<AggregatedSignal> {
    let ttl = chrono::Duration::seconds(config.signal_ttl_seconds);
    let mut by_asset: BTreeMap<_, Vec<&TradingSignal>> = BTreeMap::new();
    for signal in signals {
        if now.signed_duration_since(signal.produced_at) > ttl {
            continue;
        }
        by_asset.entry(signal.asset_id.clone()).or_default().push(signal);
    }

    let mut out = Vec::new();
    for (asset_id, group) in by_asset {
        let Some(aggregated) = aggregate_one(&asset_id, &group, config, now) else {
            continue;
        };
        out.push(aggregated);
    }
    out
}

fn aggregate_one(
    asset_id: &crate::domain::types::AssetId,
    group: &[&TradingSignal],
    config: &AggregationConfig,
    now: DateTime<Utc>,
) -> Option<AggregatedSignal> {
    if group.is_empty() {
        return None;
    }

    let (direction, confidence, price) = if group.len() == 1 {
        let only = group[0];
        (only.direction, only.confidence, only.price)
    } else {
        let mut vote_long = 0.0;
        let mut vote_short = 0.0;
        let mut max_confidence = 0.0_f64;
        for signal in group {
            max_confidence = max_confidence.max(signal.confidence);
            match signal.direction {
                Direction::Long => vote_long += signal.confidence,
                Direction::Short => vote_short += signal.confidence,
            }
        }
        let total = vote_long + vote_short;
        if total <= 0.0 {
            return None;
        }
        let (winning_direction, winning_vote) = if vote_long >= vote_short {
            (Direction::Long, vote_long)
        } else {
            (Direction::Short, vote_short)
        };
        if winning_vote < config.consensus_threshold * total {
            return None;
        }
        let latest_price = group
            .iter()
            .max_by_key(|s| s.produced_at)
            .map(|s| s.price)
            .unwrap_or_default();
        // Invariant 4: confidence never exceeds the strongest contributing signal,
        // even when every strategy agrees on direction (winning_vote == total).
        (winning_direction, (winning_vote / total).min(max_confidence), latest_price)
    };

    if confidence < config.min_confidence_threshold {
        return None;
    }

    Some(AggregatedSignal {
        asset_id: asset_id.clone(),
        direction,
        confidence,
        contributing_strategies: group.iter().map(|s| s.strategy_name.clone()).collect(),
        price,
        produced_at: now,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::AssetId;
    use rust_decimal_macros::dec;

    fn signal(strategy: &str, asset: &str, direction: Direction, confidence: f64, produced_at: DateTime<Utc>) -> TradingSignal {
        TradingSignal::new(strategy, AssetId::new(asset), direction, dec!(50000), confidence, produced_at)
    }

    // Scenario C from SPEC_FULL.md §8.
    #[test]
    fn three_strategy_vote_reaches_consensus() {
        let now = Utc::now();
        let signals = vec![
            signal("s1", "ethereum", Direction::Long, 0.8, now),
            signal("s2", "ethereum", Direction::Long, 0.7, now),
            signal("s3", "ethereum", Direction::Short, 0.6, now),
        ];
        let config = AggregationConfig::default();
        let aggregated = aggregate(&signals, &config, now);
        assert_eq!(aggregated.len(), 1);
        let agg = &aggregated[0];
        assert_eq!(agg.direction, Direction::Long);
        assert!((agg.confidence - 0.7142857).abs() < 1e-4);
        assert_eq!(agg.contributing_strategies.len(), 3);
    }

    // Invariant 4: unanimous direction must not inflate confidence to 1.0.
    #[test]
    fn unanimous_direction_confidence_is_capped_at_the_strongest_signal() {
        let now = Utc::now();
        let signals = vec![
            signal("s1", "ethereum", Direction::Long, 0.3, now),
            signal("s2", "ethereum", Direction::Long, 0.4, now),
        ];
        let config = AggregationConfig::default();
        let aggregated = aggregate(&signals, &config, now);
        assert_eq!(aggregated.len(), 1);
        assert_eq!(aggregated[0].confidence, 0.4);
    }

    #[test]
    fn no_consensus_emits_nothing() {
        let now = Utc::now();
        let signals = vec![
            signal("s1", "ethereum", Direction::Long, 0.5, now),
            signal("s2", "ethereum", Direction::Short, 0.5, now),
        ];
        let config = AggregationConfig::default();
        assert!(aggregate(&signals, &config, now).is_empty());
    }

    #[test]
    fn stale_signals_are_discarded_before_voting() {
        let now = Utc::now();
        let stale = now - chrono::Duration::seconds(90_000);
        let signals = vec![signal("s1", "ethereum", Direction::Long, 0.9, stale)];
        let config = AggregationConfig::default();
        assert!(aggregate(&signals, &config, now).is_empty());
    }

    #[test]
    fn single_signal_passes_through_unchanged() {
        let now = Utc::now();
        let signals = vec![signal("s1", "bitcoin", Direction::Long, 0.42, now)];
        let config = AggregationConfig::default();
        let aggregated = aggregate(&signals, &config, now);
        assert_eq!(aggregated.len(), 1);
        assert_eq!(aggregated[0].confidence, 0.42);
    }

    #[test]
    fn deterministic_asset_ordering() {
        let now = Utc::now();
        let signals = vec![
            signal("s1", "zeta", Direction::Long, 0.9, now),
            signal("s1", "alpha", Direction::Long, 0.9, now),
        ];
        let config = AggregationConfig::default();
        let aggregated = aggregate(&signals, &config, now);
        assert_eq!(aggregated[0].asset_id, AssetId::new("alpha"));
        assert_eq!(aggregated[1].asset_id, AssetId::new("zeta"));
    }
}
