//! Control channel configuration

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Control channel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlConfig {
    /// Address to serve the control UI on; `None` disables the control channel
    #[serde(default)]
    pub listen: Option<String>,

    /// Channel buffer size for hub requests
    #[serde(default = "default_hub_buffer", rename = "hub-buffer")]
    pub hub_buffer: usize,
}

fn default_hub_buffer() -> usize {
    debug!("default_hub_buffer: called");
    256
}

impl Default for ControlConfig {
    fn default() -> Self {
        debug!("ControlConfig::default: called");
        Self {
            listen: None,
            hub_buffer: 256,
        }
    }
}

impl ControlConfig {
    /// Address to bind, accepting the `:port` shorthand for all interfaces
    pub fn bind_address(&self) -> Option<String> {
        let listen = self.listen.as_deref()?.trim();
        if listen.is_empty() {
            return None;
        }
        if listen.starts_with(':') {
            return Some(format!("0.0.0.0{}", listen));
        }
        Some(listen.to_string())
    }
}
