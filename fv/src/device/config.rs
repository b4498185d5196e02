//! Device configuration

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Which endpoint driver to use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceBackend {
    /// PipeWire endpoint through the `wpctl` CLI
    #[default]
    Wpctl,
    /// In-process endpoint (no audio hardware)
    Memory,
}

impl FromStr for DeviceBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "DeviceBackend::from_str: called");
        match s.to_lowercase().as_str() {
            "wpctl" | "pipewire" => Ok(Self::Wpctl),
            "memory" | "mem" => Ok(Self::Memory),
            _ => Err(format!("Unknown device backend: {}. Use: wpctl or memory", s)),
        }
    }
}

impl fmt::Display for DeviceBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wpctl => write!(f, "wpctl"),
            Self::Memory => write!(f, "memory"),
        }
    }
}

/// Device configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Endpoint driver
    pub backend: DeviceBackend,

    /// Endpoint to control (a wpctl node id or alias; a label for memory)
    pub target: String,

    /// Starting level of the memory backend
    #[serde(rename = "initial-level")]
    pub initial_level: f32,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            backend: DeviceBackend::Wpctl,
            target: "@DEFAULT_AUDIO_SOURCE@".to_string(),
            initial_level: 1.0,
        }
    }
}
