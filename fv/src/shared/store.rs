//! SharedConfig - lock-free store for the enforced volume and poll interval

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use tracing::debug;

use super::snapshot::ConfigSnapshot;
use super::values::{PollInterval, Volume};

/// Process-wide configuration read on every enforcement tick
///
/// Volume is kept as the bit pattern of an `f32`, so a read always returns a
/// value some writer stored. Only validated `Volume`/`PollInterval` values can
/// be written.
#[derive(Debug)]
pub struct SharedConfig {
    volume_bits: AtomicU32,
    interval_ms: AtomicU64,
}

impl SharedConfig {
    pub fn new(volume: Volume, interval: PollInterval) -> Self {
        debug!(%volume, %interval, "SharedConfig::new: called");
        Self {
            volume_bits: AtomicU32::new(volume.to_bits()),
            interval_ms: AtomicU64::new(interval.millis()),
        }
    }

    pub fn volume(&self) -> Volume {
        Volume::from_bits(self.volume_bits.load(Ordering::Relaxed))
    }

    pub fn set_volume(&self, volume: Volume) {
        debug!(%volume, "SharedConfig::set_volume: called");
        self.volume_bits.store(volume.to_bits(), Ordering::Relaxed);
    }

    pub fn interval(&self) -> PollInterval {
        PollInterval::from_stored(self.interval_ms.load(Ordering::Relaxed))
    }

    pub fn set_interval(&self, interval: PollInterval) {
        debug!(%interval, "SharedConfig::set_interval: called");
        self.interval_ms.store(interval.millis(), Ordering::Relaxed);
    }

    /// Capture both fields; each is independently current
    pub fn snapshot(&self) -> ConfigSnapshot {
        ConfigSnapshot::new(self.interval(), self.volume())
    }
}
