use crate::domain::errors::ConfigError;
use serde::Deserialize;

/// C9 supervisor tuning (§4.9, §6.1).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SupervisorConfig {
    pub drain_deadline_seconds: u64,
    pub health_poll_seconds: u64,
    pub unhealthy_streak: u32,
    pub max_restarts: u32,
    pub disable_threshold: u32,
    pub collection_worker_pool_size: usize,
    pub strategy_worker_pool_size: usize,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            drain_deadline_seconds: 10,
            health_poll_seconds: 60,
            unhealthy_streak: 3,
            max_restarts: 5,
            disable_threshold: 10,
            collection_worker_pool_size: 8,
            strategy_worker_pool_size: 4,
        }
    }
}

impl SupervisorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.collection_worker_pool_size == 0 {
            return Err(ConfigError::Invalid {
                field: "supervisor.collection_worker_pool_size".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
