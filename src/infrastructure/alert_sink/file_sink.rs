//! File-based [`AlertSink`]: one JSON file per alert under a configured directory.
//!
//! Grounded on `SettingsPersistence`'s atomic write (write to a temp file,
//! then rename) so a reader never observes a half-written alert file.

use crate::domain::ports::AlertSink;
use crate::domain::types::AlertRecord;
use anyhow::Context;
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::info;

pub struct FileAlertSink {
    directory: PathBuf,
}

impl FileAlertSink {
    pub fn new(directory: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let directory = directory.into();
        std::fs::create_dir_all(&directory)
            .with_context(|| format!("failed to create alert directory {directory:?}"))?;
        Ok(Self { directory })
    }
}

#[async_trait]
impl AlertSink for FileAlertSink {
    async fn accept(&self, alert: AlertRecord) -> anyhow::Result<()> {
        let file_name = alert.file_name();
        let final_path = self.directory.join(&file_name);
        let temp_path = final_path.with_extension("tmp");

        let content = serde_json::to_string_pretty(&alert).context("failed to serialize alert")?;
        tokio::fs::write(&temp_path, content)
            .await
            .with_context(|| format!("failed to write temp alert file {temp_path:?}"))?;
        tokio::fs::rename(&temp_path, &final_path)
            .await
            .with_context(|| format!("failed to rename alert file to {final_path:?}"))?;

        info!(file = %file_name, kind = %alert.kind, asset = %alert.asset, "alert written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{AlertKind, AlertPayload, SignalPayload, AssetId, Direction, RiskLevel};
    use rust_decimal_macros::dec;

    fn sample_alert() -> AlertRecord {
        AlertRecord {
            schema_version: AlertRecord::SCHEMA_VERSION,
            timestamp: 1_700_000_000_000,
            kind: AlertKind::Signal,
            asset: "bitcoin".to_string(),
            payload: AlertPayload::Signal(SignalPayload {
                asset_id: AssetId::new("bitcoin"),
                direction: Direction::Long,
                price: dec!(50000),
                confidence: 0.8,
                position_size: dec!(3080),
                stop_loss: dec!(49000),
                take_profit: dec!(52000),
                contributing_strategies: vec!["dual_sma".into()],
                risk_level: RiskLevel::Low,
            }),
        }
    }

    #[tokio::test]
    async fn writes_one_file_per_alert_and_it_round_trips() {
        let dir = tempdir();
        let sink = FileAlertSink::new(&dir).unwrap();
        let alert = sample_alert();
        let expected_name = alert.file_name();

        sink.accept(alert.clone()).await.unwrap();

        let path = dir.join(&expected_name);
        assert!(path.exists());
        let content = tokio::fs::read_to_string(&path).await.unwrap();
        let round_tripped: AlertRecord = serde_json::from_str(&content).unwrap();
        assert_eq!(round_tripped.asset, alert.asset);
        assert_eq!(round_tripped.timestamp, alert.timestamp);

        tokio::fs::remove_dir_all(&dir).await.ok();
    }

    fn tempdir() -> PathBuf {
        let mut dir = std::env::temp_dir();
        dir.push(format!("cryptopulse-alert-test-{}", uuid::Uuid::new_v4()));
        dir
    }
}
