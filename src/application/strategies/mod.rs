//! Pluggable trading strategies (C5, §4.5).

pub mod dual_sma;
pub mod registry;
pub mod traits;
pub mod zscore_mean_reversion;

pub use dual_sma::DualSmaStrategy;
pub use traits::{StrategyAnalysis, TradingStrategy};
pub use zscore_mean_reversion::ZScoreMeanReversionStrategy;
