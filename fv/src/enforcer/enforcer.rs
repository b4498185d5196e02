//! Volume enforcer implementation

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info};

use crate::device::{DeviceError, VolumeDevice};
use crate::shared::SharedConfig;

/// What a single tick did
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EnforceOutcome {
    /// Device already at the target
    Unchanged { level: f32 },
    /// Device was written to the target
    Corrected { from: f32, to: f32 },
}

/// Keeps one device at the volume held in SharedConfig
pub struct Enforcer {
    device: Arc<dyn VolumeDevice>,
    shared: Arc<SharedConfig>,
}

impl Enforcer {
    pub fn new(device: Arc<dyn VolumeDevice>, shared: Arc<SharedConfig>) -> Self {
        Self { device, shared }
    }

    /// Read the device and correct it if it differs from the target
    ///
    /// Comparison is exact; a device that rounds what it reports back gets
    /// written on every tick.
    pub async fn enforce_once(&self) -> Result<EnforceOutcome, DeviceError> {
        let target = self.shared.volume().scalar();
        let current = self.device.get_volume().await?;

        if current != target {
            info!(from = current, to = target, "Volume drifted, correcting");
            self.device.set_volume(target).await?;
            return Ok(EnforceOutcome::Corrected { from: current, to: target });
        }

        debug!(level = current, "Volume already at target");
        Ok(EnforceOutcome::Unchanged { level: current })
    }

    /// Delay before the next tick, read fresh from SharedConfig
    pub fn next_delay(&self) -> Duration {
        self.shared.interval().as_duration()
    }

    /// Run the enforcement loop
    ///
    /// Never returns; device errors are logged and retried on the next tick.
    pub async fn run(self) {
        info!(
            device = %self.device.name(),
            volume = %self.shared.volume(),
            interval = %self.shared.interval(),
            "Enforcer started"
        );

        loop {
            if let Err(e) = self.enforce_once().await {
                error!(error = %e, "Failed to enforce volume");
            }

            tokio::time::sleep(self.next_delay()).await;
        }
    }
}
