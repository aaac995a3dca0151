use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Opaque symbolic identifier for a tradeable asset, e.g. `"bitcoin"`.
///
/// Stable across restarts and used as the join key between collection tasks,
/// snapshots, signals, and alerts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId(pub String);

impl AssetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AssetId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for AssetId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Cadence class assigning a collection interval to an asset.
///
/// `Ord` is derived in declaration order, which doubles as the tier priority
/// used by the scheduler's tie-break rule (HIGH_FREQUENCY > HOURLY > DAILY).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    HighFrequency,
    Hourly,
    Daily,
}

impl Tier {
    /// Lower number sorts first: this is the priority ordering for scheduler tie-breaks.
    pub fn priority(&self) -> u8 {
        match self {
            Tier::HighFrequency => 0,
            Tier::Hourly => 1,
            Tier::Daily => 2,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::HighFrequency => write!(f, "HIGH_FREQUENCY"),
            Tier::Hourly => write!(f, "HOURLY"),
            Tier::Daily => write!(f, "DAILY"),
        }
    }
}

/// A single OHLCV candle for one asset at one timestamp.
///
/// Uniqueness key is `(asset_id, timestamp_ms)`; invariant (3) of the data
/// model is enforced at construction by [`OHLCVBar::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OHLCVBar {
    pub asset_id: AssetId,
    pub timestamp_ms: i64,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum BarValidationError {
    #[error("bar for {asset_id} at {timestamp_ms} has low {low} above min(open, close)")]
    LowAboveBody {
        asset_id: String,
        timestamp_ms: i64,
        low: Decimal,
    },
    #[error("bar for {asset_id} at {timestamp_ms} has high {high} below max(open, close)")]
    HighBelowBody {
        asset_id: String,
        timestamp_ms: i64,
        high: Decimal,
    },
    #[error("bar for {asset_id} at {timestamp_ms} has negative volume {volume}")]
    NegativeVolume {
        asset_id: String,
        timestamp_ms: i64,
        volume: Decimal,
    },
    #[error("bar for {asset_id} at {timestamp_ms} has non-positive price")]
    NonPositivePrice {
        asset_id: String,
        timestamp_ms: i64,
    },
}

impl OHLCVBar {
    /// Construct a bar, rejecting anything that would violate data-model invariant (3).
    pub fn new(
        asset_id: AssetId,
        timestamp_ms: i64,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
        volume: Decimal,
    ) -> Result<Self, BarValidationError> {
        let bar = Self {
            asset_id,
            timestamp_ms,
            open,
            high,
            low,
            close,
            volume,
        };
        bar.validate()?;
        Ok(bar)
    }

    pub fn validate(&self) -> Result<(), BarValidationError> {
        if self.open <= Decimal::ZERO || self.high <= Decimal::ZERO
            || self.low <= Decimal::ZERO || self.close <= Decimal::ZERO
        {
            return Err(BarValidationError::NonPositivePrice {
                asset_id: self.asset_id.to_string(),
                timestamp_ms: self.timestamp_ms,
            });
        }
        let body_min = self.open.min(self.close);
        let body_max = self.open.max(self.close);
        if self.low > body_min {
            return Err(BarValidationError::LowAboveBody {
                asset_id: self.asset_id.to_string(),
                timestamp_ms: self.timestamp_ms,
                low: self.low,
            });
        }
        if self.high < body_max {
            return Err(BarValidationError::HighBelowBody {
                asset_id: self.asset_id.to_string(),
                timestamp_ms: self.timestamp_ms,
                high: self.high,
            });
        }
        if self.volume < Decimal::ZERO {
            return Err(BarValidationError::NegativeVolume {
                asset_id: self.asset_id.to_string(),
                timestamp_ms: self.timestamp_ms,
                volume: self.volume,
            });
        }
        Ok(())
    }
}

/// A single macro-economic indicator reading, e.g. CPI or Fed funds rate.
///
/// Uniqueness key is `(indicator_id, date)`. `interpolated` is set when the
/// value was carried forward from the last known reading rather than freshly
/// observed (see SPEC_FULL.md Open Question 2).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroPoint {
    pub indicator_id: String,
    pub date: chrono::NaiveDate,
    pub value: f64,
    pub interpolated: bool,
}

/// Immutable, per-tick bundle of recent bars and macro series handed to strategies.
///
/// Strategies must not mutate anything reachable from a snapshot; it is built
/// fresh by the harness for every tick from the repository's current state.
#[derive(Debug, Clone, Default)]
pub struct MarketSnapshot {
    pub bars: HashMap<AssetId, Vec<OHLCVBar>>,
    pub macro_series: HashMap<String, Vec<MacroPoint>>,
    pub produced_at: Option<DateTime<Utc>>,
}

impl MarketSnapshot {
    pub fn bars_for(&self, asset_id: &AssetId) -> &[OHLCVBar] {
        self.bars.get(asset_id).map(|v| v.as_slice()).unwrap_or(&[])
    }
}

/// Long/short directional suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Long,
    Short,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => write!(f, "LONG"),
            Direction::Short => write!(f, "SHORT"),
        }
    }
}

/// A single strategy's directional suggestion for one asset, immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingSignal {
    pub id: uuid::Uuid,
    pub strategy_name: String,
    pub asset_id: AssetId,
    pub direction: Direction,
    pub price: Decimal,
    pub confidence: f64,
    pub produced_at: DateTime<Utc>,
}

impl TradingSignal {
    pub fn new(
        strategy_name: impl Into<String>,
        asset_id: AssetId,
        direction: Direction,
        price: Decimal,
        confidence: f64,
        produced_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            strategy_name: strategy_name.into(),
            asset_id,
            direction,
            price,
            confidence: confidence.clamp(0.0, 1.0),
            produced_at,
        }
    }
}

/// Consensus output over one or more [`TradingSignal`]s for the same asset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatedSignal {
    pub asset_id: AssetId,
    pub direction: Direction,
    pub confidence: f64,
    pub contributing_strategies: Vec<String>,
    pub price: Decimal,
    pub produced_at: DateTime<Utc>,
}

/// Caller-supplied view of the portfolio; the core never owns this state.
#[derive(Debug, Clone)]
pub struct PortfolioState {
    pub total_equity: Decimal,
    pub current_drawdown: f64,
    pub daily_pnl: Decimal,
    pub positions: BTreeMap<AssetId, Decimal>,
    pub cash: Decimal,
}

/// Composite risk classification, increasing in severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "LOW"),
            RiskLevel::Medium => write!(f, "MEDIUM"),
            RiskLevel::High => write!(f, "HIGH"),
            RiskLevel::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// The complete decision record produced by the risk orchestrator for one
/// aggregated signal. Never constructed in a way that can panic — see
/// `application::risk::orchestrator`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub asset_id: AssetId,
    pub direction: Direction,
    pub recommended_position_size: Decimal,
    pub stop_loss_price: Decimal,
    pub take_profit_price: Decimal,
    pub risk_reward_ratio: f64,
    pub position_risk_pct: f64,
    pub portfolio_heat: f64,
    pub risk_level: RiskLevel,
    pub approved: bool,
    pub rejection_reason: Option<String>,
    pub warnings: Vec<String>,
    pub processing_time_ms: f64,
}

/// Which kind of alert a record carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertKind {
    VolatilitySpike,
    Signal,
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertKind::VolatilitySpike => write!(f, "VOLATILITY_SPIKE"),
            AlertKind::Signal => write!(f, "SIGNAL"),
        }
    }
}

/// Payload for a [`AlertKind::VolatilitySpike`] alert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolatilitySpikePayload {
    pub asset_id: AssetId,
    pub price: Decimal,
    pub volatility: f64,
    pub percentile: f64,
    pub threshold_exceeded: f64,
}

/// Payload for a [`AlertKind::Signal`] alert, mirrors an approved [`RiskAssessment`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalPayload {
    pub asset_id: AssetId,
    pub direction: Direction,
    pub price: Decimal,
    pub confidence: f64,
    pub position_size: Decimal,
    pub stop_loss: Decimal,
    pub take_profit: Decimal,
    pub contributing_strategies: Vec<String>,
    pub risk_level: RiskLevel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AlertPayload {
    VolatilitySpike(VolatilitySpikePayload),
    Signal(SignalPayload),
}

/// The externally visible, self-describing record handed to an [`crate::domain::ports::AlertSink`].
///
/// Schema is stable (§6.3 of SPEC_FULL.md): `schema_version` only increments on
/// a breaking change, never on a field addition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRecord {
    pub schema_version: u32,
    pub timestamp: i64,
    pub kind: AlertKind,
    pub asset: String,
    pub payload: AlertPayload,
}

impl AlertRecord {
    pub const SCHEMA_VERSION: u32 = 1;

    /// File name per §6.3: `<kind>_<asset>_<utcYYYYMMDD_HHMMSS>.json`.
    pub fn file_name(&self) -> String {
        let dt = DateTime::<Utc>::from_timestamp_millis(self.timestamp).unwrap_or_else(Utc::now);
        format!(
            "{}_{}_{}.json",
            self.kind,
            self.asset,
            dt.format("%Y%m%d_%H%M%S")
        )
    }
}
