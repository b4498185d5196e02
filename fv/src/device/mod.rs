//! Audio endpoint capability
//!
//! The enforcer only sees [`VolumeDevice`]; the backend is chosen once at
//! startup by [`open`].

mod config;
mod error;
mod memory;
mod wpctl;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

pub use config::{DeviceBackend, DeviceConfig};
pub use error::DeviceError;
pub use memory::MemoryDevice;
pub use wpctl::WpctlDevice;

/// A single audio endpoint whose level can be read and written
#[async_trait]
pub trait VolumeDevice: Send + Sync {
    /// Human-readable endpoint name
    fn name(&self) -> &str;

    /// Current level as a scalar (1.0 = 100%)
    async fn get_volume(&self) -> Result<f32, DeviceError>;

    /// Set the level as a scalar
    async fn set_volume(&self, level: f32) -> Result<(), DeviceError>;

    /// Release the endpoint
    async fn close(&self) {}
}

/// Open the configured endpoint
///
/// Failure here is fatal to the process; there is nothing to enforce without
/// a device.
pub async fn open(config: &DeviceConfig) -> Result<Arc<dyn VolumeDevice>, DeviceError> {
    debug!(backend = %config.backend, target = %config.target, "open: called");
    let device: Arc<dyn VolumeDevice> = match config.backend {
        DeviceBackend::Wpctl => Arc::new(WpctlDevice::open(&config.target).await?),
        DeviceBackend::Memory => Arc::new(MemoryDevice::new(&config.target, config.initial_level)),
    };
    info!(backend = %config.backend, name = %device.name(), "Device opened");
    Ok(device)
}
