//! Application layer: the use-case orchestration between `domain` and
//! `infrastructure`. Mirrors the teacher's split of `application/` into one
//! module per concern (scheduling, strategy execution, signal aggregation,
//! risk, alerting) wired together by the top-level `supervisor`.

pub mod aggregator;
pub mod alerts;
pub mod collection_task;
pub mod harness;
pub mod retry;
pub mod risk;
pub mod scheduler;
pub mod strategies;
pub mod supervisor;
