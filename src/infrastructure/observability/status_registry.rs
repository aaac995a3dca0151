//! Per-component health tracking, fed by the supervisor's health poll (C9).
//!
//! Grounded on the teacher's `AgentStatusRegistry`: a name-keyed map behind a
//! lock, updated by heartbeats, read by the supervisor's restart decision.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum HealthStatus {
    Starting,
    Healthy,
    Degraded,
    Dead,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ComponentStatus {
    pub name: String,
    pub health: HealthStatus,
    pub last_heartbeat: DateTime<Utc>,
    pub message: Option<String>,
    pub consecutive_unhealthy: u32,
}

/// Tracks the health of every supervised component by name.
pub struct ComponentStatusRegistry {
    statuses: RwLock<HashMap<String, ComponentStatus>>,
}

impl ComponentStatusRegistry {
    pub fn new() -> Self {
        Self {
            statuses: RwLock::new(HashMap::new()),
        }
    }

    pub async fn report(&self, name: &str, health: HealthStatus, message: Option<String>) {
        let mut statuses = self.statuses.write().await;
        let entry = statuses
            .entry(name.to_string())
            .or_insert_with(|| ComponentStatus {
                name: name.to_string(),
                health: HealthStatus::Starting,
                last_heartbeat: Utc::now(),
                message: None,
                consecutive_unhealthy: 0,
            });
        entry.last_heartbeat = Utc::now();
        entry.message = message;
        entry.consecutive_unhealthy = if matches!(health, HealthStatus::Degraded | HealthStatus::Dead) {
            entry.consecutive_unhealthy + 1
        } else {
            0
        };
        entry.health = health;
    }

    /// Whether `name` has been unhealthy for at least `unhealthy_streak` consecutive polls.
    pub async fn needs_restart(&self, name: &str, unhealthy_streak: u32) -> bool {
        self.statuses
            .read()
            .await
            .get(name)
            .map(|s| s.consecutive_unhealthy >= unhealthy_streak)
            .unwrap_or(false)
    }

    pub async fn get(&self, name: &str) -> Option<ComponentStatus> {
        self.statuses.read().await.get(name).cloned()
    }

    pub async fn snapshot(&self) -> HashMap<String, ComponentStatus> {
        self.statuses.read().await.clone()
    }
}

impl Default for ComponentStatusRegistry {
    fn default() -> Self {
        Self::new()
    }
}
