use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ProviderConfig {
    pub name: String,
    pub rate_limit_per_window: u32,
    pub window_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    #[serde(rename = "provider")]
    pub list: Vec<ProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            list: vec![ProviderConfig {
                name: "coingecko".to_string(),
                rate_limit_per_window: 50,
                window_seconds: 60,
            }],
        }
    }
}

impl ProvidersConfig {
    pub fn get(&self, name: &str) -> Option<&ProviderConfig> {
        self.list.iter().find(|p| p.name == name)
    }
}
