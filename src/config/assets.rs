use crate::domain::types::Tier;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AssetConfig {
    pub asset_id: String,
    pub tier: Tier,
    pub provider: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
    #[serde(rename = "asset")]
    pub list: Vec<AssetConfig>,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            list: vec![AssetConfig {
                asset_id: "bitcoin".to_string(),
                tier: Tier::HighFrequency,
                provider: "coingecko".to_string(),
            }],
        }
    }
}
