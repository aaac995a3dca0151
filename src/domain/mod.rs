//! Core domain model: entities, capability traits, and error taxonomy.
//!
//! Nothing in this module talks to the network, the filesystem, or a clock
//! directly — those live in `infrastructure` and are consumed here only
//! through the traits in `ports`.

pub mod errors;
pub mod ports;
pub mod types;
