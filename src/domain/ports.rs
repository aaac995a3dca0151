//! Capability traits consumed from external collaborators (§6.4 of SPEC_FULL.md).
//!
//! The core never implements these for production use — only in-memory fakes
//! for tests live in `infrastructure`. Production implementations (concrete
//! HTTP clients, tabular storage, notification channels) are out of scope.

use crate::domain::errors::CollectionError;
use crate::domain::types::{AlertRecord, AssetId, MacroPoint, MarketSnapshot, OHLCVBar};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// The window of data a [`MarketDataSource::fetch`] call should cover.
#[derive(Debug, Clone, Copy)]
pub enum WindowSpec {
    /// Pull everything since `last_success_at` (incremental pull).
    Since(DateTime<Utc>),
    /// First run for this task: pull the provider's default bootstrap window.
    Bootstrap,
}

/// Bars and/or macro points returned by one `fetch` call.
#[derive(Debug, Clone, Default)]
pub struct FetchResult {
    pub bars: Vec<OHLCVBar>,
    pub macro_points: Vec<MacroPoint>,
}

/// External price/macro data provider, consumed by [`crate::application::collection_task`].
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn fetch(
        &self,
        asset_id: &AssetId,
        window: WindowSpec,
    ) -> Result<FetchResult, CollectionError>;
}

/// Persistent tabular storage of raw OHLCV/macro data, consumed by the core.
///
/// Implementations must be safe for concurrent upserts and idempotent on
/// `(asset_id, timestamp)` (testable property 3 of SPEC_FULL.md).
#[async_trait]
pub trait MarketDataRepository: Send + Sync {
    /// Upsert bars, returning the count actually inserted or updated.
    async fn upsert_bars(&self, bars: &[OHLCVBar]) -> anyhow::Result<usize>;

    /// Upsert macro points, returning the count actually inserted or updated.
    async fn upsert_macro_points(&self, points: &[MacroPoint]) -> anyhow::Result<usize>;

    /// Latest stored bar timestamp for an asset, if any (drives incremental pulls).
    async fn last_timestamp(&self, asset_id: &AssetId) -> anyhow::Result<Option<i64>>;

    /// Build an immutable snapshot over the given assets for the strategy harness.
    async fn get_snapshot(&self, asset_ids: &[AssetId]) -> anyhow::Result<MarketSnapshot>;
}

/// Notification channel for structured alerts; the core never awaits downstream delivery
/// beyond the single `accept` call (§9 of SPEC_FULL.md).
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn accept(&self, alert: AlertRecord) -> anyhow::Result<()>;
}
