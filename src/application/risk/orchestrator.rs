//! Risk orchestrator (C7, §4.7).
//!
//! Grounded on the teacher's `RiskManagementEngine`/`sizing_engine.rs` shape
//! (validate → size → derive stops → classify → hard-limit check), reworked
//! per the Source Pattern in SPEC_FULL.md §9: every step returns a
//! `Result`, chained explicitly, with one top-level recovery producing the
//! CRITICAL assessment on any error (never an exception path).

use crate::config::risk::RiskConfig;
use crate::domain::errors::RiskError;
use crate::domain::types::{AggregatedSignal, Direction, PortfolioState, RiskAssessment, RiskLevel};
use rust_decimal::prelude::*;
use rust_decimal::Decimal;

/// Produce a [`RiskAssessment`] for `signal` against `portfolio`. Never
/// panics or propagates an error: any failed step is converted into a
/// CRITICAL, unapproved assessment (§3 invariant 6).
pub fn assess(
    signal: &AggregatedSignal,
    portfolio: &PortfolioState,
    config: &RiskConfig,
) -> RiskAssessment {
    let start = std::time::Instant::now();
    match assess_inner(signal, portfolio, config) {
        Ok(mut assessment) => {
            assessment.processing_time_ms = start.elapsed().as_secs_f64() * 1000.0;
            assessment
        }
        Err(err) => critical_assessment(signal, &err, start.elapsed().as_secs_f64() * 1000.0),
    }
}

fn assess_inner(
    signal: &AggregatedSignal,
    portfolio: &PortfolioState,
    config: &RiskConfig,
) -> Result<RiskAssessment, RiskError> {
    validate(signal, portfolio)?;

    let size = position_size(signal.confidence, portfolio.total_equity, config)?;
    let (stop_loss_price, take_profit_price) = stops(signal.direction, signal.price, config)?;

    let position_risk_pct = to_f64(size * Decimal::try_from(config.per_trade_stop_loss).unwrap_or_default())
        / to_f64(portfolio.total_equity);
    let portfolio_heat = position_risk_pct;
    let projected_impact = to_f64(size) / to_f64(portfolio.total_equity);

    let composite = position_risk_pct + portfolio_heat + portfolio.current_drawdown;
    let mut risk_level = classify(composite);

    let mut warnings = Vec::new();
    let mut rejection_reason = None;

    let projected_drawdown = portfolio.current_drawdown + projected_impact;
    if projected_drawdown > config.max_drawdown_limit {
        rejection_reason = Some(format!(
            "drawdown limit exceeded: projected {projected_drawdown:.4} > limit {:.4}",
            config.max_drawdown_limit
        ));
        risk_level = risk_level.max(RiskLevel::High);
    }

    let daily_loss_floor = portfolio.total_equity * Decimal::try_from(-config.daily_loss_limit).unwrap_or_default();
    let projected_daily_pnl = portfolio.daily_pnl - size * Decimal::try_from(config.per_trade_stop_loss).unwrap_or_default();
    if rejection_reason.is_none() && projected_daily_pnl < daily_loss_floor {
        rejection_reason = Some(format!(
            "daily loss limit exceeded: projected pnl {projected_daily_pnl} < floor {daily_loss_floor}"
        ));
        risk_level = risk_level.max(RiskLevel::High);
    }

    let max_size = portfolio.total_equity * Decimal::try_from(config.max_position_size).unwrap_or_default();
    if rejection_reason.is_none() && size > max_size {
        rejection_reason = Some(format!("position size {size} exceeds max allowed {max_size}"));
        risk_level = risk_level.max(RiskLevel::High);
    }

    if portfolio.current_drawdown > config.max_drawdown_limit * 0.75 {
        warnings.push("portfolio drawdown approaching the configured limit".to_string());
    }

    let approved = rejection_reason.is_none();

    Ok(RiskAssessment {
        asset_id: signal.asset_id.clone(),
        direction: signal.direction,
        recommended_position_size: size,
        stop_loss_price,
        take_profit_price,
        risk_reward_ratio: config.risk_reward_ratio,
        position_risk_pct,
        portfolio_heat,
        risk_level,
        approved,
        rejection_reason,
        warnings,
        processing_time_ms: 0.0,
    })
}

fn validate(signal: &AggregatedSignal, portfolio: &PortfolioState) -> Result<(), RiskError> {
    if !(0.0..=1.0).contains(&signal.confidence) {
        return Err(RiskError::InvalidConfidence {
            confidence: signal.confidence,
        });
    }
    if signal.price <= Decimal::ZERO {
        return Err(RiskError::InvalidPrice { price: signal.price });
    }
    if portfolio.total_equity <= Decimal::ZERO {
        return Err(RiskError::InvalidEquity {
            equity: portfolio.total_equity,
        });
    }
    if !(0.0..=1.0).contains(&portfolio.current_drawdown) {
        return Err(RiskError::InvalidDrawdown {
            drawdown: portfolio.current_drawdown,
        });
    }
    for (asset_id, quantity) in &portfolio.positions {
        if *quantity < Decimal::ZERO {
            return Err(RiskError::NegativePosition {
                asset_id: asset_id.to_string(),
                quantity: *quantity,
            });
        }
    }
    Ok(())
}

fn position_size(confidence: f64, equity: Decimal, config: &RiskConfig) -> Result<Decimal, RiskError> {
    let multiplier = 1.0 + (confidence - 0.5) * config.confidence_multiplier;
    let raw = to_f64(equity) * config.base_position_pct * multiplier;
    let min = config.min_position_size;
    let max = to_f64(equity) * config.max_position_size;
    let clamped = raw.clamp(min, max.max(min));
    Decimal::try_from(clamped).map_err(|_| RiskError::Internal("position size overflowed Decimal".to_string()))
}

fn stops(direction: Direction, price: Decimal, config: &RiskConfig) -> Result<(Decimal, Decimal), RiskError> {
    let stop_pct = Decimal::try_from(config.per_trade_stop_loss)
        .map_err(|_| RiskError::Internal("stop loss pct invalid".to_string()))?;
    let rr = Decimal::try_from(config.risk_reward_ratio)
        .map_err(|_| RiskError::Internal("risk reward ratio invalid".to_string()))?;
    match direction {
        Direction::Long => {
            let stop = price * (Decimal::ONE - stop_pct);
            let take_profit = price * (Decimal::ONE + stop_pct * rr);
            Ok((stop, take_profit))
        }
        Direction::Short => {
            let stop = price * (Decimal::ONE + stop_pct);
            let take_profit = price * (Decimal::ONE - stop_pct * rr);
            Ok((stop, take_profit))
        }
    }
}

fn classify(composite: f64) -> RiskLevel {
    let scaled = composite * 100.0;
    if scaled <= 8.0 {
        RiskLevel::Low
    } else if scaled <= 12.0 {
        RiskLevel::Medium
    } else if scaled <= 18.0 {
        RiskLevel::High
    } else {
        RiskLevel::Critical
    }
}

fn critical_assessment(signal: &AggregatedSignal, err: &RiskError, processing_time_ms: f64) -> RiskAssessment {
    RiskAssessment {
        asset_id: signal.asset_id.clone(),
        direction: signal.direction,
        recommended_position_size: Decimal::ZERO,
        stop_loss_price: Decimal::ZERO,
        take_profit_price: Decimal::ZERO,
        risk_reward_ratio: 0.0,
        position_risk_pct: 0.0,
        portfolio_heat: 0.0,
        risk_level: RiskLevel::Critical,
        approved: false,
        rejection_reason: Some(err.to_string()),
        warnings: vec![],
        processing_time_ms,
    }
}

fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}
