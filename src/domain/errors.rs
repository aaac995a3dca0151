//! Per-subsystem error taxonomy (§7 of SPEC_FULL.md).
//!
//! Each subsystem gets its own `thiserror` enum with structured fields, the
//! way the teacher splits `TradingError` / `RiskViolation` / `MarketDataError`
//! / `PortfolioError`. [`ErrorKind`] is the coarse classification shared by
//! the retry classifier (C2) and the supervisor's restart policy.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coarse error classification used for retry/restart decisions, independent
/// of which subsystem produced the error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Transient,
    RateLimited,
    Validation,
    Config,
    Limit,
    Internal,
}

/// Errors surfaced while collecting market data for one (asset, tier) task.
#[derive(Debug, Error)]
pub enum CollectionError {
    #[error("network error contacting provider {provider}: {reason}")]
    Network { provider: String, reason: String },

    #[error("provider {provider} timed out after {timeout_ms}ms")]
    Timeout { provider: String, timeout_ms: u64 },

    #[error("provider {provider} returned 5xx: {status}")]
    ServerError { provider: String, status: u16 },

    #[error("rate limited by provider {provider}, retry after {retry_after_ms:?}ms")]
    RateLimited {
        provider: String,
        retry_after_ms: Option<u64>,
    },

    #[error("rate gate for provider {provider} exhausted before deadline")]
    RateGateDenied { provider: String },

    #[error("provider {provider} returned a client error: {status}")]
    ClientError { provider: String, status: u16 },

    #[error("invalid data for {asset_id}: {reason}")]
    InvalidData { asset_id: String, reason: String },

    #[error("task for {asset_id} was canceled at the tier deadline")]
    Canceled { asset_id: String },

    #[error("unexpected internal error: {0}")]
    Internal(String),
}

impl CollectionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CollectionError::Network { .. }
            | CollectionError::Timeout { .. }
            | CollectionError::ServerError { .. }
            | CollectionError::Canceled { .. } => ErrorKind::Transient,
            CollectionError::RateLimited { .. } | CollectionError::RateGateDenied { .. } => {
                ErrorKind::RateLimited
            }
            CollectionError::InvalidData { .. } => ErrorKind::Validation,
            CollectionError::ClientError { .. } => ErrorKind::Validation,
            CollectionError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Whether a task may retry this error within its attempt budget.
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Transient | ErrorKind::RateLimited)
    }
}

/// Errors surfaced while loading or validating configuration. Always fatal
/// at startup (CONFIG kind, §7).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("invalid config field {field}: {reason}")]
    Invalid { field: String, reason: String },
}

impl ConfigError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Config
    }
}

/// Errors surfaced by the risk orchestrator. Never propagated as an
/// exception — always converted into a CRITICAL [`crate::domain::types::RiskAssessment`].
#[derive(Debug, Error, Clone)]
pub enum RiskError {
    #[error("confidence {confidence} outside [0,1]")]
    InvalidConfidence { confidence: f64 },

    #[error("price must be positive, got {price}")]
    InvalidPrice { price: rust_decimal::Decimal },

    #[error("portfolio equity must be positive, got {equity}")]
    InvalidEquity { equity: rust_decimal::Decimal },

    #[error("drawdown {drawdown} outside [0,1]")]
    InvalidDrawdown { drawdown: f64 },

    #[error("position quantity for {asset_id} is negative: {quantity}")]
    NegativePosition {
        asset_id: String,
        quantity: rust_decimal::Decimal,
    },

    #[error("drawdown limit exceeded: projected {projected:.4} > limit {limit:.4}")]
    DrawdownLimit { projected: f64, limit: f64 },

    #[error("daily loss limit exceeded: projected pnl {projected} < floor {floor}")]
    DailyLossLimit {
        projected: rust_decimal::Decimal,
        floor: rust_decimal::Decimal,
    },

    #[error("position size {size} exceeds max allowed {max}")]
    PositionSizeLimit {
        size: rust_decimal::Decimal,
        max: rust_decimal::Decimal,
    },

    #[error("unexpected internal error computing risk: {0}")]
    Internal(String),
}

impl RiskError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RiskError::InvalidConfidence { .. }
            | RiskError::InvalidPrice { .. }
            | RiskError::InvalidEquity { .. }
            | RiskError::InvalidDrawdown { .. }
            | RiskError::NegativePosition { .. } => ErrorKind::Validation,
            RiskError::DrawdownLimit { .. }
            | RiskError::DailyLossLimit { .. }
            | RiskError::PositionSizeLimit { .. } => ErrorKind::Limit,
            RiskError::Internal(_) => ErrorKind::Internal,
        }
    }
}

/// Errors surfaced by the supervisor while starting, polling, or restarting components.
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("component {component} failed to start: {reason}")]
    StartupFailed { component: String, reason: String },

    #[error("component {component} exceeded max restarts ({max_restarts})")]
    RestartBudgetExhausted { component: String, max_restarts: u32 },

    #[error("graceful drain timed out after {deadline_ms}ms with {pending} tasks still running")]
    DrainTimeout { deadline_ms: u64, pending: usize },
}

impl SupervisorError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Internal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_error_classifies_transient() {
        let e = CollectionError::Timeout {
            provider: "coingecko".into(),
            timeout_ms: 1000,
        };
        assert_eq!(e.kind(), ErrorKind::Transient);
        assert!(e.is_retryable());
    }

    #[test]
    fn collection_error_classifies_client_error_as_non_retryable() {
        let e = CollectionError::ClientError {
            provider: "coingecko".into(),
            status: 404,
        };
        assert_eq!(e.kind(), ErrorKind::Validation);
        assert!(!e.is_retryable());
    }

    #[test]
    fn risk_error_formats_with_fields() {
        let e = RiskError::DrawdownLimit {
            projected: 0.21,
            limit: 0.20,
        };
        let msg = e.to_string();
        assert!(msg.contains("0.21"));
        assert!(msg.contains("0.2"));
    }
}
