//! Alert generator (C8, §4.8).
//!
//! Stateless: composes [`AlertRecord`]s from approved risk assessments and
//! volatility-spike observations, and hands them to an [`AlertSink`].
//! Grounded on the teacher's `application::monitoring` notification
//! composition, reworked around this spec's stable alert schema (§6.3).

use crate::domain::ports::AlertSink;
use crate::domain::types::{
    AlertKind, AlertPayload, AlertRecord, AssetId, RiskAssessment, SignalPayload,
    VolatilitySpikePayload,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

pub struct AlertGenerator;

impl AlertGenerator {
    /// Build a SIGNAL alert from the `AggregatedSignal` that produced
    /// `assessment` (for price/confidence/contributing strategies) and the
    /// assessment itself (for sizing/stops). Returns `None` for a rejected
    /// assessment — §7: "alerts are not emitted for rejected assessments".
    pub fn from_assessment(
        signal: &crate::domain::types::AggregatedSignal,
        assessment: &RiskAssessment,
        now: DateTime<Utc>,
    ) -> Option<AlertRecord> {
        if !assessment.approved {
            return None;
        }
        Some(AlertRecord {
            schema_version: AlertRecord::SCHEMA_VERSION,
            timestamp: now.timestamp_millis(),
            kind: AlertKind::Signal,
            asset: assessment.asset_id.to_string(),
            payload: AlertPayload::Signal(SignalPayload {
                asset_id: assessment.asset_id.clone(),
                direction: assessment.direction,
                price: signal.price,
                confidence: signal.confidence,
                position_size: assessment.recommended_position_size,
                stop_loss: assessment.stop_loss_price,
                take_profit: assessment.take_profit_price,
                contributing_strategies: signal.contributing_strategies.clone(),
                risk_level: assessment.risk_level,
            }),
        })
    }

    /// Build a VOLATILITY_SPIKE alert when a strategy's reported percentile
    /// exceeds `threshold` (§4.8).
    pub fn volatility_spike(
        asset_id: &AssetId,
        price: Decimal,
        volatility: f64,
        percentile: f64,
        threshold: f64,
        now: DateTime<Utc>,
    ) -> Option<AlertRecord> {
        if percentile < threshold {
            return None;
        }
        Some(AlertRecord {
            schema_version: AlertRecord::SCHEMA_VERSION,
            timestamp: now.timestamp_millis(),
            kind: AlertKind::VolatilitySpike,
            asset: asset_id.to_string(),
            payload: AlertPayload::VolatilitySpike(VolatilitySpikePayload {
                asset_id: asset_id.clone(),
                price,
                volatility,
                percentile,
                threshold_exceeded: threshold,
            }),
        })
    }
}

/// Hand `alert` to `sink`, logging but not propagating a delivery failure —
/// the core never awaits downstream delivery beyond this single call (§9).
pub async fn dispatch(sink: &dyn AlertSink, alert: AlertRecord) {
    let kind = alert.kind;
    let asset = alert.asset.clone();
    if let Err(err) = sink.accept(alert).await {
        tracing::error!(%kind, %asset, error = %err, "alert sink rejected alert");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{AggregatedSignal, Direction};
    use crate::domain::types::RiskLevel;
    use crate::infrastructure::alert_sink::in_memory::InMemoryAlertSink;
    use rust_decimal_macros::dec;

    fn approved_assessment() -> RiskAssessment {
        RiskAssessment {
            asset_id: AssetId::new("bitcoin"),
            direction: Direction::Long,
            recommended_position_size: dec!(3080),
            stop_loss_price: dec!(49000),
            take_profit_price: dec!(52000),
            risk_reward_ratio: 2.0,
            position_risk_pct: 0.01,
            portfolio_heat: 0.01,
            risk_level: RiskLevel::Low,
            approved: true,
            rejection_reason: None,
            warnings: vec![],
            processing_time_ms: 1.2,
        }
    }

    fn contributing_signal() -> AggregatedSignal {
        AggregatedSignal {
            asset_id: AssetId::new("bitcoin"),
            direction: Direction::Long,
            confidence: 0.75,
            contributing_strategies: vec!["dual_sma".to_string(), "zscore_mean_reversion".to_string()],
            price: dec!(50000),
            produced_at: Utc::now(),
        }
    }

    // Scenario F from SPEC_FULL.md §8.
    #[test]
    fn approved_assessment_round_trips_through_json() {
        let alert = AlertGenerator::from_assessment(&contributing_signal(), &approved_assessment(), Utc::now())
            .unwrap();
        let json = serde_json::to_string(&alert).unwrap();
        let round_tripped: AlertRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(round_tripped.asset, alert.asset);
        assert_eq!(round_tripped.kind, AlertKind::Signal);
        match round_tripped.payload {
            AlertPayload::Signal(payload) => {
                assert_eq!(payload.stop_loss, dec!(49000));
                assert_eq!(payload.take_profit, dec!(52000));
                assert_eq!(payload.contributing_strategies.len(), 2);
            }
            _ => panic!("expected signal payload"),
        }
    }

    #[test]
    fn rejected_assessment_produces_no_alert() {
        let mut assessment = approved_assessment();
        assessment.approved = false;
        assert!(AlertGenerator::from_assessment(&contributing_signal(), &assessment, Utc::now()).is_none());
    }

    #[test]
    fn volatility_below_threshold_produces_no_alert() {
        let alert = AlertGenerator::volatility_spike(
            &AssetId::new("bitcoin"),
            dec!(50000),
            0.3,
            0.5,
            0.9,
            Utc::now(),
        );
        assert!(alert.is_none());
    }

    #[tokio::test]
    async fn dispatch_hands_alert_to_sink() {
        let sink = InMemoryAlertSink::new();
        let alert = AlertGenerator::from_assessment(&contributing_signal(), &approved_assessment(), Utc::now())
            .unwrap();
        dispatch(&sink, alert).await;
        assert_eq!(sink.accepted().await.len(), 1);
    }
}
