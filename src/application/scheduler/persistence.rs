//! Atomic load/save of scheduler state (§6.2), grounded on the teacher's
//! `SettingsPersistence` (temp-file-then-rename) and its forward-compatible
//! read-modify-write of unknown JSON fields.

use super::task_state::CollectionTask;
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const STATE_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedMetrics {
    pub api_calls_today: u64,
    pub last_reset_date: NaiveDate,

    /// Fields from a future schema version, preserved verbatim on read-modify-write.
    #[serde(flatten)]
    pub unknown: HashMap<String, serde_json::Value>,
}

impl Default for PersistedMetrics {
    fn default() -> Self {
        Self {
            api_calls_today: 0,
            last_reset_date: Utc::now().date_naive(),
            unknown: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedState {
    pub version: u32,
    pub last_updated: DateTime<Utc>,
    pub tasks: Vec<CollectionTask>,
    pub metrics: PersistedMetrics,

    #[serde(flatten)]
    pub unknown: HashMap<String, serde_json::Value>,
}

impl PersistedState {
    pub fn new(tasks: Vec<CollectionTask>, now: DateTime<Utc>) -> Self {
        Self {
            version: STATE_VERSION,
            last_updated: now,
            tasks,
            metrics: PersistedMetrics::default(),
            unknown: HashMap::new(),
        }
    }
}

/// Loads and atomically persists [`PersistedState`] at a fixed path.
pub struct SchedulerPersistence {
    path: PathBuf,
}

impl SchedulerPersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub async fn load(&self) -> Result<Option<PersistedState>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("reading scheduler state from {}", self.path.display()))?;
        let state: PersistedState = serde_json::from_str(&raw)
            .with_context(|| format!("parsing scheduler state at {}", self.path.display()))?;
        Ok(Some(state))
    }

    /// Write `state` via a temp file + rename so a crash mid-write never
    /// leaves a corrupt state file (same pattern as the alert file sink).
    pub async fn save(&self, state: &PersistedState) -> Result<()> {
        let tmp_path = tmp_path_for(&self.path);
        let body = serde_json::to_string_pretty(state).context("serializing scheduler state")?;
        tokio::fs::write(&tmp_path, body)
            .await
            .with_context(|| format!("writing temp scheduler state {}", tmp_path.display()))?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .with_context(|| format!("renaming scheduler state into place at {}", self.path.display()))?;
        Ok(())
    }
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{AssetId, Tier};

    #[tokio::test]
    async fn round_trips_through_disk_and_preserves_unknown_fields() {
        let dir = std::env::temp_dir().join(format!("cryptopulse-sched-test-{}", uuid::Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let path = dir.join("scheduler_state.json");
        let persistence = SchedulerPersistence::new(&path);

        let now = Utc::now();
        let mut state = PersistedState::new(
            vec![CollectionTask::new(
                AssetId::new("bitcoin"),
                Tier::HighFrequency,
                "coingecko",
                now,
            )],
            now,
        );
        state
            .unknown
            .insert("future_field".to_string(), serde_json::json!("keep me"));

        persistence.save(&state).await.unwrap();
        let loaded = persistence.load().await.unwrap().expect("state should exist");

        assert_eq!(loaded.tasks.len(), 1);
        assert_eq!(loaded.tasks[0].asset_id, AssetId::new("bitcoin"));
        assert_eq!(
            loaded.unknown.get("future_field").and_then(|v| v.as_str()),
            Some("keep me")
        );

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn load_returns_none_when_file_missing() {
        let path = std::env::temp_dir().join(format!("cryptopulse-missing-{}.json", uuid::Uuid::new_v4()));
        let persistence = SchedulerPersistence::new(&path);
        assert!(persistence.load().await.unwrap().is_none());
    }
}
