//! Enforcement loop
//!
//! The Enforcer reads the target from SharedConfig every tick and drives the
//! device toward it.

mod enforcer;

pub use enforcer::{EnforceOutcome, Enforcer};
