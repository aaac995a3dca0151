//! One (asset, provider) unit of collection work (C3, §4.3).
//!
//! Grounded on the teacher's `MarketDataCollector::collect_symbol` for the
//! fetch-validate-persist shape, reworked around this spec's capability
//! traits (`MarketDataSource`/`MarketDataRepository`) instead of a concrete
//! exchange client.

use crate::domain::errors::{CollectionError, ErrorKind};
use crate::domain::ports::{MarketDataRepository, MarketDataSource, WindowSpec};
use crate::domain::types::AssetId;
use crate::infrastructure::rate_gate::RateGate;
use std::time::{Duration, Instant};

/// Result of one [`run`] call, mirroring `Outcome{success,...}` / `Outcome{failure,...}` of §4.3.
#[derive(Debug, Clone)]
pub enum Outcome {
    Success {
        bars_stored: usize,
        macro_points_stored: usize,
    },
    Failure {
        kind: ErrorKind,
        message: String,
        hinted_delay: Option<Duration>,
    },
    Canceled,
}

/// Execute one collection attempt for `asset_id` against `source`, persisting
/// through `repository`. Acquires one rate-gate token with a deadline of
/// `tier_interval / 4` before calling out to the provider (§4.3 step 1).
///
/// `overall_deadline` bounds the whole operation; exceeding it yields
/// [`Outcome::Canceled`] rather than blocking the scheduler indefinitely
/// (§4.3 guarantee: never blocks longer than `tierInterval/2`).
pub async fn run(
    asset_id: &AssetId,
    last_success_at_ms: Option<i64>,
    tier_interval: Duration,
    overall_deadline: Instant,
    source: &dyn MarketDataSource,
    repository: &dyn MarketDataRepository,
    rate_gate: &RateGate,
) -> Outcome {
    let gate_deadline = Instant::now() + (tier_interval / 4).min(overall_deadline.saturating_duration_since(Instant::now()));

    if let Err(err) = rate_gate.acquire(gate_deadline).await {
        return classify_failure(err);
    }

    if Instant::now() >= overall_deadline {
        return Outcome::Canceled;
    }

    let window = match last_success_at_ms {
        Some(ms) => {
            let since = chrono::DateTime::<chrono::Utc>::from_timestamp_millis(ms)
                .unwrap_or_else(chrono::Utc::now);
            WindowSpec::Since(since)
        }
        None => WindowSpec::Bootstrap,
    };

    let fetch_result = match tokio::time::timeout(
        overall_deadline.saturating_duration_since(Instant::now()),
        source.fetch(asset_id, window),
    )
    .await
    {
        Ok(Ok(result)) => result,
        Ok(Err(err)) => return classify_failure(err),
        Err(_elapsed) => return Outcome::Canceled,
    };

    let mut valid_bars = Vec::with_capacity(fetch_result.bars.len());
    let mut rejected = 0usize;
    for bar in fetch_result.bars {
        match bar.validate() {
            Ok(()) => valid_bars.push(bar),
            Err(err) => {
                rejected += 1;
                tracing::warn!(asset_id = %asset_id, error = %err, "dropping invalid bar");
            }
        }
    }
    if rejected > 0 {
        tracing::warn!(asset_id = %asset_id, rejected, "invalid bars discarded during validation");
    }

    let bars_stored = match repository.upsert_bars(&valid_bars).await {
        Ok(count) => count,
        Err(err) => {
            return Outcome::Failure {
                kind: ErrorKind::Internal,
                message: err.to_string(),
                hinted_delay: None,
            }
        }
    };

    let macro_points_stored = match repository
        .upsert_macro_points(&fetch_result.macro_points)
        .await
    {
        Ok(count) => count,
        Err(err) => {
            return Outcome::Failure {
                kind: ErrorKind::Internal,
                message: err.to_string(),
                hinted_delay: None,
            }
        }
    };

    Outcome::Success {
        bars_stored,
        macro_points_stored,
    }
}

fn classify_failure(err: CollectionError) -> Outcome {
    let hinted_delay = match &err {
        CollectionError::RateLimited {
            retry_after_ms: Some(ms),
            ..
        } => Some(Duration::from_millis(*ms)),
        _ => None,
    };
    Outcome::Failure {
        kind: err.kind(),
        message: err.to_string(),
        hinted_delay,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::FetchResult;
    use crate::domain::types::OHLCVBar;
    use crate::infrastructure::repositories::in_memory::InMemoryMarketDataRepository;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;

    struct StubSource {
        bars: Vec<OHLCVBar>,
        calls: AtomicUsize,
        fail_times: StdMutex<usize>,
    }

    #[async_trait]
    impl MarketDataSource for StubSource {
        async fn fetch(
            &self,
            _asset_id: &AssetId,
            _window: WindowSpec,
        ) -> Result<FetchResult, CollectionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut remaining = self.fail_times.lock().unwrap();
            if *remaining > 0 {
                *remaining -= 1;
                return Err(CollectionError::Timeout {
                    provider: "stub".into(),
                    timeout_ms: 1,
                });
            }
            Ok(FetchResult {
                bars: self.bars.clone(),
                macro_points: vec![],
            })
        }
    }

    fn bar(asset: &AssetId, ts: i64) -> OHLCVBar {
        OHLCVBar::new(asset.clone(), ts, dec!(100), dec!(110), dec!(90), dec!(105), dec!(10)).unwrap()
    }

    #[tokio::test]
    async fn successful_run_persists_bars() {
        let asset = AssetId::new("bitcoin");
        let source = StubSource {
            bars: vec![bar(&asset, 0), bar(&asset, 900_000)],
            calls: AtomicUsize::new(0),
            fail_times: StdMutex::new(0),
        };
        let repo = InMemoryMarketDataRepository::new();
        let gate = RateGate::new("stub", 10, Duration::from_secs(60));

        let outcome = run(
            &asset,
            None,
            Duration::from_secs(900),
            Instant::now() + Duration::from_secs(5),
            &source,
            &repo,
            &gate,
        )
        .await;

        match outcome {
            Outcome::Success { bars_stored, .. } => assert_eq!(bars_stored, 2),
            other => panic!("expected success, got {other:?}"),
        }
        assert_eq!(repo.last_timestamp(&asset).await.unwrap(), Some(900_000));
    }

    #[tokio::test]
    async fn invalid_bars_are_dropped_without_failing_the_task() {
        let asset = AssetId::new("bitcoin");
        let mut bad = bar(&asset, 0);
        bad.volume = dec!(-1);
        let source = StubSource {
            bars: vec![bad, bar(&asset, 900_000)],
            calls: AtomicUsize::new(0),
            fail_times: StdMutex::new(0),
        };
        let repo = InMemoryMarketDataRepository::new();
        let gate = RateGate::new("stub", 10, Duration::from_secs(60));

        let outcome = run(
            &asset,
            None,
            Duration::from_secs(900),
            Instant::now() + Duration::from_secs(5),
            &source,
            &repo,
            &gate,
        )
        .await;

        match outcome {
            Outcome::Success { bars_stored, .. } => assert_eq!(bars_stored, 1),
            other => panic!("expected success, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn rate_gate_exhaustion_yields_rate_limited_failure() {
        let asset = AssetId::new("bitcoin");
        let source = StubSource {
            bars: vec![],
            calls: AtomicUsize::new(0),
            fail_times: StdMutex::new(0),
        };
        let repo = InMemoryMarketDataRepository::new();
        let gate = RateGate::new("stub", 1, Duration::from_secs(3600));
        assert!(gate.try_acquire());

        let outcome = run(
            &asset,
            None,
            Duration::from_millis(4),
            Instant::now() + Duration::from_millis(1),
            &source,
            &repo,
            &gate,
        )
        .await;

        match outcome {
            Outcome::Failure { kind, .. } => assert_eq!(kind, ErrorKind::RateLimited),
            other => panic!("expected failure, got {other:?}"),
        }
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }
}
