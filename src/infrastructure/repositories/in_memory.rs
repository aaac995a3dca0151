//! In-memory [`MarketDataRepository`] implementation.
//!
//! Suitable for tests and single-instance demo deployments. A production
//! implementation (row-level isolation in a real database) is out of scope
//! for this crate — the core only depends on the trait.

use crate::domain::ports::MarketDataRepository;
use crate::domain::types::{AssetId, MacroPoint, MarketSnapshot, OHLCVBar};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

#[derive(Default)]
struct Store {
    bars: HashMap<AssetId, BTreeMap<i64, OHLCVBar>>,
    macro_points: HashMap<String, BTreeMap<chrono::NaiveDate, MacroPoint>>,
}

/// Thread-safe, in-memory implementation of [`MarketDataRepository`].
///
/// Upserts are keyed by `(asset_id, timestamp)` / `(indicator_id, date)`, so
/// applying the same batch twice leaves the store identical to applying it
/// once (testable property 3).
pub struct InMemoryMarketDataRepository {
    store: RwLock<Store>,
}

impl InMemoryMarketDataRepository {
    pub fn new() -> Self {
        Self {
            store: RwLock::new(Store::default()),
        }
    }
}

impl Default for InMemoryMarketDataRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketDataRepository for InMemoryMarketDataRepository {
    async fn upsert_bars(&self, bars: &[OHLCVBar]) -> anyhow::Result<usize> {
        let mut store = self.store.write().await;
        let mut count = 0;
        for bar in bars {
            let asset_bars = store.bars.entry(bar.asset_id.clone()).or_default();
            asset_bars.insert(bar.timestamp_ms, bar.clone());
            count += 1;
        }
        Ok(count)
    }

    async fn upsert_macro_points(&self, points: &[MacroPoint]) -> anyhow::Result<usize> {
        let mut store = self.store.write().await;
        let mut count = 0;
        for point in points {
            let series = store
                .macro_points
                .entry(point.indicator_id.clone())
                .or_default();
            series.insert(point.date, point.clone());
            count += 1;
        }
        Ok(count)
    }

    async fn last_timestamp(&self, asset_id: &AssetId) -> anyhow::Result<Option<i64>> {
        let store = self.store.read().await;
        Ok(store
            .bars
            .get(asset_id)
            .and_then(|series| series.keys().next_back().copied()))
    }

    async fn get_snapshot(&self, asset_ids: &[AssetId]) -> anyhow::Result<MarketSnapshot> {
        let store = self.store.read().await;
        let mut bars = HashMap::new();
        for asset_id in asset_ids {
            if let Some(series) = store.bars.get(asset_id) {
                bars.insert(asset_id.clone(), series.values().cloned().collect());
            }
        }
        let macro_series = store
            .macro_points
            .iter()
            .map(|(id, series)| (id.clone(), series.values().cloned().collect()))
            .collect();
        Ok(MarketSnapshot {
            bars,
            macro_series,
            produced_at: Some(chrono::Utc::now()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn bar(asset: &str, ts: i64, close: rust_decimal::Decimal) -> OHLCVBar {
        OHLCVBar::new(AssetId::new(asset), ts, close, close, close, close, dec!(10)).unwrap()
    }

    #[tokio::test]
    async fn upsert_is_idempotent() {
        let repo = InMemoryMarketDataRepository::new();
        let bars = vec![bar("bitcoin", 0, dec!(100)), bar("bitcoin", 900_000, dec!(101))];

        repo.upsert_bars(&bars).await.unwrap();
        repo.upsert_bars(&bars).await.unwrap();

        let snapshot = repo.get_snapshot(&[AssetId::new("bitcoin")]).await.unwrap();
        assert_eq!(snapshot.bars_for(&AssetId::new("bitcoin")).len(), 2);
    }

    #[tokio::test]
    async fn last_timestamp_tracks_most_recent_bar() {
        let repo = InMemoryMarketDataRepository::new();
        repo.upsert_bars(&[bar("bitcoin", 0, dec!(100)), bar("bitcoin", 900_000, dec!(101))])
            .await
            .unwrap();

        let last = repo.last_timestamp(&AssetId::new("bitcoin")).await.unwrap();
        assert_eq!(last, Some(900_000));
    }

    #[tokio::test]
    async fn snapshot_omits_unknown_assets() {
        let repo = InMemoryMarketDataRepository::new();
        let snapshot = repo
            .get_snapshot(&[AssetId::new("does-not-exist")])
            .await
            .unwrap();
        assert!(snapshot.bars_for(&AssetId::new("does-not-exist")).is_empty());
    }
}
