//! Tier-based collection scheduling (C4, §4.4).

pub mod persistence;
pub mod scheduler;
pub mod task_state;

pub use scheduler::{SchedulerDeps, TierScheduler};
pub use task_state::{CollectionTask, TaskState};
