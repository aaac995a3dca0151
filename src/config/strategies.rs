use serde::Deserialize;
use std::collections::HashMap;

/// One entry in `[[strategies.strategy]]`. `params` is an open bag — unrecognized
/// keys are retained for introspection only (Open Question 3, SPEC_FULL.md §9).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    pub name: String,
    pub enabled: bool,
    pub weight: f64,
    pub params: HashMap<String, f64>,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            enabled: true,
            weight: 1.0,
            params: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StrategiesConfig {
    #[serde(rename = "strategy")]
    pub list: Vec<StrategyConfig>,
    pub execution_deadline_ms: u64,
}

impl Default for StrategiesConfig {
    fn default() -> Self {
        Self {
            list: vec![
                StrategyConfig {
                    name: "dual_sma".to_string(),
                    enabled: true,
                    weight: 1.0,
                    params: HashMap::new(),
                },
                StrategyConfig {
                    name: "zscore_mean_reversion".to_string(),
                    enabled: true,
                    weight: 1.0,
                    params: HashMap::new(),
                },
            ],
            execution_deadline_ms: 5_000,
        }
    }
}

impl StrategiesConfig {
    pub fn enabled(&self) -> impl Iterator<Item = &StrategyConfig> {
        self.list.iter().filter(|s| s.enabled)
    }
}
