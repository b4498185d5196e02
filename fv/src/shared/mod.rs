//! Runtime-mutable configuration shared by the enforcer and control sessions
//!
//! Each field is an independent atomic cell: reads never block, writes are
//! last-write-wins, and the two fields are not jointly consistent.

mod snapshot;
mod store;
mod values;

pub use snapshot::ConfigSnapshot;
pub use store::SharedConfig;
pub use values::{ConfigError, PollInterval, Volume};
