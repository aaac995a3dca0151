//! Concrete adapters and test fakes. Production external clients (exchange
//! APIs, SQL storage, webhook sinks) are intentionally not implemented here —
//! the core only depends on the traits in `domain::ports`.

pub mod alert_sink;
pub mod clock;
pub mod observability;
pub mod rate_gate;
pub mod repositories;
pub mod synthetic_source;
