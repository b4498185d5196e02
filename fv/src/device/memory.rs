//! In-process endpoint
//!
//! Holds a level in memory. A pinned device ignores writes and keeps
//! reporting the same level, like hardware that drifts back on its own.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::debug;

use super::VolumeDevice;
use super::error::DeviceError;

#[derive(Debug, Default)]
struct MemoryState {
    level: f32,
    writes: Vec<f32>,
}

/// Volume endpoint that lives entirely in memory
#[derive(Debug)]
pub struct MemoryDevice {
    name: String,
    state: Mutex<MemoryState>,
    pinned: bool,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryDevice {
    pub fn new(name: &str, level: f32) -> Self {
        debug!(%name, level, "MemoryDevice::new: called");
        Self {
            name: name.to_string(),
            state: Mutex::new(MemoryState {
                level,
                writes: Vec::new(),
            }),
            pinned: false,
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// A device that always reports `level`, whatever is written
    pub fn pinned(name: &str, level: f32) -> Self {
        Self {
            pinned: true,
            ..Self::new(name, level)
        }
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::Relaxed);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::Relaxed);
    }

    /// Current level
    pub fn level(&self) -> f32 {
        self.lock().level
    }

    /// Every level passed to `set_volume`, in order
    pub fn writes(&self) -> Vec<f32> {
        self.lock().writes.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl VolumeDevice for MemoryDevice {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get_volume(&self) -> Result<f32, DeviceError> {
        if self.fail_reads.load(Ordering::Relaxed) {
            return Err(DeviceError::Read("simulated read failure".to_string()));
        }
        Ok(self.lock().level)
    }

    async fn set_volume(&self, level: f32) -> Result<(), DeviceError> {
        if self.fail_writes.load(Ordering::Relaxed) {
            return Err(DeviceError::Write {
                level,
                reason: "simulated write failure".to_string(),
            });
        }
        let mut state = self.lock();
        state.writes.push(level);
        if !self.pinned {
            state.level = level;
        }
        Ok(())
    }
}
