//! forcevolume - keep an audio endpoint pinned to a target volume
//!
//! An enforcement loop polls the device and corrects drift, while connected
//! control sessions adjust the target volume and poll interval live and are
//! kept in sync through a broadcast hub.

pub mod cli;
pub mod config;
pub mod control;
pub mod device;
pub mod enforcer;
pub mod shared;

pub use config::Config;
pub use control::{ControlConfig, ControlSession, ControlTransport, ControlUpdate, Hub, HubHandle, HubMetrics};
pub use device::{DeviceBackend, DeviceConfig, DeviceError, MemoryDevice, VolumeDevice};
pub use enforcer::{EnforceOutcome, Enforcer};
pub use shared::{ConfigError, ConfigSnapshot, PollInterval, SharedConfig, Volume};
