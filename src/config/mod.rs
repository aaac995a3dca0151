//! Layered configuration: a TOML file plus environment overrides, validated
//! once at startup and frozen thereafter (§6.1, §9 "Global mutable
//! configuration objects", §10.1 of SPEC_FULL.md).
//!
//! Grounded on the teacher's per-domain config modules
//! (`config/risk_env_config.rs`, `config/strategy_config.rs`,
//! `config/broker_config.rs`): one struct per concern, aggregated into a
//! top-level `Config`.

mod aggregation;
mod alerts;
mod assets;
mod providers;
mod risk;
mod strategies;
mod supervisor;
mod tiers;

pub use aggregation::AggregationConfig;
pub use alerts::AlertsConfig;
pub use assets::{AssetConfig, AssetsConfig};
pub use providers::{ProviderConfig, ProvidersConfig};
pub use risk::RiskConfig;
pub use strategies::{StrategyConfig, StrategiesConfig};
pub use supervisor::SupervisorConfig;
pub use tiers::TiersConfig;

use crate::domain::errors::ConfigError;
use serde::Deserialize;
use std::path::Path;

/// Aggregate, immutable application configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tiers: TiersConfig,
    pub assets: AssetsConfig,
    pub providers: ProvidersConfig,
    pub strategies: StrategiesConfig,
    pub aggregation: AggregationConfig,
    pub risk: RiskConfig,
    pub supervisor: SupervisorConfig,
    pub alerts: AlertsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tiers: TiersConfig::default(),
            assets: AssetsConfig::default(),
            providers: ProvidersConfig::default(),
            strategies: StrategiesConfig::default(),
            aggregation: AggregationConfig::default(),
            risk: RiskConfig::default(),
            supervisor: SupervisorConfig::default(),
            alerts: AlertsConfig::default(),
        }
    }
}

impl Config {
    /// Load from a TOML file, then apply environment variable overrides, then validate.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();
        let text = std::fs::read_to_string(path_ref).map_err(|e| ConfigError::Read {
            path: path_ref.display().to_string(),
            reason: e.to_string(),
        })?;
        let mut config: Config = toml::from_str(&text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load using only defaults plus environment overrides (no config file needed),
    /// useful for tests and simple deployments.
    pub fn load_from_env() -> Result<Self, ConfigError> {
        let mut config = Config::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("CRYPTOPULSE_MAX_DRAWDOWN_LIMIT") {
            if let Ok(parsed) = v.parse() {
                self.risk.max_drawdown_limit = parsed;
            }
        }
        if let Ok(v) = std::env::var("CRYPTOPULSE_DAILY_LOSS_LIMIT") {
            if let Ok(parsed) = v.parse() {
                self.risk.daily_loss_limit = parsed;
            }
        }
        if let Ok(v) = std::env::var("CRYPTOPULSE_CONSENSUS_THRESHOLD") {
            if let Ok(parsed) = v.parse() {
                self.aggregation.consensus_threshold = parsed;
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tiers.validate()?;
        self.aggregation.validate()?;
        self.risk.validate()?;
        self.supervisor.validate()?;
        self.alerts.validate()?;
        if self.assets.list.is_empty() {
            return Err(ConfigError::Invalid {
                field: "assets".to_string(),
                reason: "at least one asset must be configured".to_string(),
            });
        }
        for asset in &self.assets.list {
            if !self
                .providers
                .list
                .iter()
                .any(|p| p.name == asset.provider)
            {
                return Err(ConfigError::Invalid {
                    field: "assets".to_string(),
                    reason: format!(
                        "asset {} references unknown provider {}",
                        asset.asset_id, asset.provider
                    ),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        Config::default().validate().expect("defaults must validate");
    }

    #[test]
    fn rejects_asset_with_unknown_provider() {
        let mut config = Config::default();
        config.assets.list.push(AssetConfig {
            asset_id: "doge".to_string(),
            tier: crate::domain::types::Tier::Daily,
            provider: "nonexistent".to_string(),
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn env_override_applies_to_risk_config() {
        std::env::set_var("CRYPTOPULSE_MAX_DRAWDOWN_LIMIT", "0.33");
        let config = Config::load_from_env().unwrap();
        assert!((config.risk.max_drawdown_limit - 0.33).abs() < 1e-9);
        std::env::remove_var("CRYPTOPULSE_MAX_DRAWDOWN_LIMIT");
    }
}
