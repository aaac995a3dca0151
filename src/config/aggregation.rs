use crate::domain::errors::ConfigError;
use serde::Deserialize;

/// C6 signal aggregator tuning (§4.6, §6.1).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    pub consensus_threshold: f64,
    pub min_confidence_threshold: f64,
    pub signal_ttl_seconds: i64,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            consensus_threshold: 0.6,
            min_confidence_threshold: 0.1,
            signal_ttl_seconds: 86_400,
        }
    }
}

impl AggregationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.consensus_threshold) {
            return Err(ConfigError::Invalid {
                field: "aggregation.consensus_threshold".to_string(),
                reason: "must be in [0,1]".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.min_confidence_threshold) {
            return Err(ConfigError::Invalid {
                field: "aggregation.min_confidence_threshold".to_string(),
                reason: "must be in [0,1]".to_string(),
            });
        }
        if self.signal_ttl_seconds <= 0 {
            return Err(ConfigError::Invalid {
                field: "aggregation.signal_ttl_seconds".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }
}
