pub mod metrics;
pub mod status_registry;

pub use metrics::Metrics;
pub use status_registry::{ComponentStatusRegistry, HealthStatus};
