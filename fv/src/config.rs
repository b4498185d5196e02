//! forcevolume configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::control::ControlConfig;
use crate::device::DeviceConfig;
use crate::shared::{PollInterval, SharedConfig, Volume};

/// Main forcevolume configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Initial target volume in percent (0-100, fraction truncated)
    pub volume: f64,

    /// Initial poll interval in milliseconds (100-10000)
    #[serde(rename = "interval-ms")]
    pub interval_ms: i64,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// Audio endpoint configuration
    pub device: DeviceConfig,

    /// Control surface configuration
    pub control: ControlConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            volume: 95.0,
            interval_ms: 3000,
            log_level: None,
            device: DeviceConfig::default(),
            control: ControlConfig::default(),
        }
    }
}

impl Config {
    /// Validate the initial volume and interval and build the shared store
    ///
    /// Call this early in startup to fail fast with clear error messages.
    pub fn shared_config(&self) -> Result<SharedConfig> {
        let volume = Volume::from_percent_f64(self.volume).context("Invalid initial volume")?;
        let interval = PollInterval::from_millis(self.interval_ms).context("Invalid initial interval")?;
        Ok(SharedConfig::new(volume, interval))
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .forcevolume.yml
        let local_config = PathBuf::from(".forcevolume.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/forcevolume/forcevolume.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("forcevolume").join("forcevolume.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read just the log level, before logging is set up
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        Self::load(config_path).ok().and_then(|config| config.log_level)
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}
