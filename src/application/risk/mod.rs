//! Risk orchestration (C7, §4.7).

pub mod orchestrator;

pub use orchestrator::assess;
