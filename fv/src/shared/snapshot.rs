//! Wire-level configuration snapshot

use serde::{Deserialize, Serialize};

use super::values::{PollInterval, Volume};

/// Point-in-time copy of the configuration sent to control clients
///
/// Serializes as `{"interval": <ms>, "volume": <percent>}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    /// Poll interval in milliseconds
    pub interval: u64,
    /// Volume in whole percent
    pub volume: u8,
}

impl ConfigSnapshot {
    pub fn new(interval: PollInterval, volume: Volume) -> Self {
        Self {
            interval: interval.millis(),
            volume: volume.percent(),
        }
    }
}
