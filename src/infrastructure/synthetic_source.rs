//! Synthetic [`MarketDataSource`] implementation.
//!
//! Suitable for tests and single-instance demo deployments, same scoping as
//! [`crate::infrastructure::repositories::in_memory::InMemoryMarketDataRepository`]
//! — a real provider client (exchange/REST API) is out of scope for this
//! crate. Generates a deterministic random walk per asset so the `server`
//! binary has something to collect without a network dependency.

use crate::domain::errors::CollectionError;
use crate::domain::ports::{FetchResult, MarketDataSource, WindowSpec};
use crate::domain::types::{AssetId, OHLCVBar};
use async_trait::async_trait;
use rand::Rng;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use std::sync::Mutex;

pub struct SyntheticMarketDataSource {
    base_price: Decimal,
    last_price: Mutex<Decimal>,
    bar_period_ms: i64,
}

impl SyntheticMarketDataSource {
    pub fn new(base_price: Decimal, bar_period_ms: i64) -> Self {
        Self {
            base_price,
            last_price: Mutex::new(base_price),
            bar_period_ms,
        }
    }
}

#[async_trait]
impl MarketDataSource for SyntheticMarketDataSource {
    async fn fetch(&self, asset_id: &AssetId, window: WindowSpec) -> Result<FetchResult, CollectionError> {
        let now_ms = chrono::Utc::now().timestamp_millis();
        let since_ms = match window {
            WindowSpec::Since(dt) => dt.timestamp_millis(),
            WindowSpec::Bootstrap => now_ms - self.bar_period_ms * 20,
        };

        let mut bars = Vec::new();
        let mut price = {
            let guard = self
                .last_price
                .lock()
                .map_err(|_| CollectionError::Internal("synthetic source mutex poisoned".to_string()))?;
            *guard
        };
        let mut ts = since_ms + self.bar_period_ms;
        let mut rng = rand::rng();
        while ts <= now_ms {
            let drift = Decimal::from_f64(rng.random_range(-0.01..0.01)).unwrap_or_default();
            let open = price;
            price = (price * (Decimal::ONE + drift)).max(self.base_price * Decimal::new(1, 1));
            let high = open.max(price) * Decimal::new(1001, 3);
            let low = open.min(price) * Decimal::new(999, 3);
            let volume = Decimal::from_f64(rng.random_range(1.0..100.0)).unwrap_or(Decimal::ONE);
            match OHLCVBar::new(asset_id.clone(), ts, open, high, low, price, volume) {
                Ok(bar) => bars.push(bar),
                Err(_) => continue,
            }
            ts += self.bar_period_ms;
        }

        if let Ok(mut guard) = self.last_price.lock() {
            *guard = price;
        }

        Ok(FetchResult { bars, macro_points: vec![] })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bootstrap_window_produces_a_handful_of_bars() {
        let source = SyntheticMarketDataSource::new(Decimal::from(50000), 60_000);
        let result = source.fetch(&AssetId::new("bitcoin"), WindowSpec::Bootstrap).await.unwrap();
        assert!(!result.bars.is_empty());
        for bar in &result.bars {
            assert!(bar.validate().is_ok());
        }
    }

    #[tokio::test]
    async fn since_now_produces_no_bars_yet() {
        let source = SyntheticMarketDataSource::new(Decimal::from(50000), 60_000);
        let result = source
            .fetch(&AssetId::new("bitcoin"), WindowSpec::Since(chrono::Utc::now()))
            .await
            .unwrap();
        assert!(result.bars.is_empty());
    }
}
