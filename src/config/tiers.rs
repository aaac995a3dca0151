use crate::domain::errors::ConfigError;
use crate::domain::types::Tier;
use serde::Deserialize;
use std::collections::HashMap;

/// Interval, in seconds, for each [`Tier`]. Defaults per §6.1.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TiersConfig {
    pub high_frequency_seconds: u64,
    pub hourly_seconds: u64,
    pub daily_seconds: u64,
}

impl Default for TiersConfig {
    fn default() -> Self {
        Self {
            high_frequency_seconds: 900,
            hourly_seconds: 3_600,
            daily_seconds: 86_400,
        }
    }
}

impl TiersConfig {
    pub fn interval_seconds(&self, tier: Tier) -> u64 {
        match tier {
            Tier::HighFrequency => self.high_frequency_seconds,
            Tier::Hourly => self.hourly_seconds,
            Tier::Daily => self.daily_seconds,
        }
    }

    pub fn as_map(&self) -> HashMap<Tier, u64> {
        [
            (Tier::HighFrequency, self.high_frequency_seconds),
            (Tier::Hourly, self.hourly_seconds),
            (Tier::Daily, self.daily_seconds),
        ]
        .into_iter()
        .collect()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("tiers.high_frequency_seconds", self.high_frequency_seconds),
            ("tiers.hourly_seconds", self.hourly_seconds),
            ("tiers.daily_seconds", self.daily_seconds),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    field: field.to_string(),
                    reason: "interval must be greater than zero".to_string(),
                });
            }
        }
        Ok(())
    }
}
