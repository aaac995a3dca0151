//! In-memory [`AlertSink`] for tests: records every accepted alert in order.

use crate::domain::ports::AlertSink;
use crate::domain::types::AlertRecord;
use async_trait::async_trait;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct InMemoryAlertSink {
    accepted: RwLock<Vec<AlertRecord>>,
}

impl InMemoryAlertSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn accepted(&self) -> Vec<AlertRecord> {
        self.accepted.read().await.clone()
    }
}

#[async_trait]
impl AlertSink for InMemoryAlertSink {
    async fn accept(&self, alert: AlertRecord) -> anyhow::Result<()> {
        self.accepted.write().await.push(alert);
        Ok(())
    }
}
