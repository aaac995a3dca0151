use crate::domain::errors::ConfigError;
use serde::Deserialize;

/// Risk orchestrator tuning (C7, §4.7, §6.1). Defaults mirror the teacher's
/// `RiskConfig::default` safety posture.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    pub max_drawdown_limit: f64,
    pub daily_loss_limit: f64,
    pub per_trade_stop_loss: f64,
    pub base_position_pct: f64,
    pub max_position_size: f64,
    pub confidence_multiplier: f64,
    pub risk_reward_ratio: f64,
    pub min_position_size: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            max_drawdown_limit: 0.20,
            daily_loss_limit: 0.05,
            per_trade_stop_loss: 0.02,
            base_position_pct: 0.02,
            max_position_size: 0.10,
            confidence_multiplier: 1.8,
            risk_reward_ratio: 2.0,
            min_position_size: 0.0,
        }
    }
}

impl RiskConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks: [(&str, f64, f64, f64); 6] = [
            ("risk.max_drawdown_limit", self.max_drawdown_limit, 0.0, 1.0),
            ("risk.daily_loss_limit", self.daily_loss_limit, 0.0, 1.0),
            ("risk.per_trade_stop_loss", self.per_trade_stop_loss, 0.0, 1.0),
            ("risk.base_position_pct", self.base_position_pct, 0.0, 1.0),
            ("risk.max_position_size", self.max_position_size, 0.0, 1.0),
            ("risk.risk_reward_ratio", self.risk_reward_ratio, 0.0, f64::MAX),
        ];
        for (field, value, min, max) in checks {
            if value <= min || value > max {
                return Err(ConfigError::Invalid {
                    field: field.to_string(),
                    reason: format!("must be in ({min}, {max}]"),
                });
            }
        }
        Ok(())
    }
}
