//! Tiered crypto market-data collection, strategy signal generation, risk
//! assessment, and alerting. See `SPEC_FULL.md` for the module map.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
