use crate::domain::errors::ConfigError;
use serde::Deserialize;

/// C8 alert generator tuning. §4.8 describes volatility-spike alerts as
/// "percentile-based volatility exceeding a threshold" without enumerating
/// the knob in §6.1 — supplemented here as its own small config section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AlertsConfig {
    pub volatility_percentile_threshold: f64,
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            volatility_percentile_threshold: 0.95,
        }
    }
}

impl AlertsConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.volatility_percentile_threshold) {
            return Err(ConfigError::Invalid {
                field: "alerts.volatility_percentile_threshold".to_string(),
                reason: "must be in [0,1]".to_string(),
            });
        }
        Ok(())
    }
}
