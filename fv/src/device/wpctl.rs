//! PipeWire endpoint driven through the `wpctl` CLI

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::VolumeDevice;
use super::error::DeviceError;

const WPCTL: &str = "wpctl";

/// A PipeWire node (by id or alias such as `@DEFAULT_AUDIO_SOURCE@`)
#[derive(Debug)]
pub struct WpctlDevice {
    program: String,
    target: String,
    name: String,
}

impl WpctlDevice {
    /// Open a node, probing it once so a missing tool or node fails at startup
    pub async fn open(target: &str) -> Result<Self, DeviceError> {
        Self::open_with_program(WPCTL, target).await
    }

    /// Open using a specific `wpctl` executable
    pub async fn open_with_program(program: &str, target: &str) -> Result<Self, DeviceError> {
        debug!(%program, %target, "WpctlDevice::open: called");
        let mut device = Self {
            program: program.to_string(),
            target: target.to_string(),
            name: target.to_string(),
        };

        let level = device.read_volume().await.map_err(|e| DeviceError::Open {
            target: target.to_string(),
            reason: e.to_string(),
        })?;

        match device.describe().await {
            Ok(Some(name)) => device.name = name,
            Ok(None) => debug!(%target, "WpctlDevice::open: no node.description, using target"),
            Err(e) => warn!(%target, error = %e, "Failed to inspect device, using target as name"),
        }

        info!(name = %device.name, level, "WpctlDevice opened");
        Ok(device)
    }

    async fn run(&self, args: &[&str]) -> Result<String, DeviceError> {
        debug!(program = %self.program, ?args, "WpctlDevice::run: called");
        let output = Command::new(&self.program)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(DeviceError::Read(format!("{} {} failed: {}", self.program, args.join(" "), stderr)));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn read_volume(&self) -> Result<f32, DeviceError> {
        let output = self.run(&["get-volume", &self.target]).await?;
        parse_volume(&output).ok_or_else(|| DeviceError::Parse {
            program: self.program.clone(),
            output: output.trim().to_string(),
        })
    }

    async fn describe(&self) -> Result<Option<String>, DeviceError> {
        let output = self.run(&["inspect", &self.target]).await?;
        Ok(parse_description(&output))
    }
}

#[async_trait]
impl VolumeDevice for WpctlDevice {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get_volume(&self) -> Result<f32, DeviceError> {
        self.read_volume().await
    }

    async fn set_volume(&self, level: f32) -> Result<(), DeviceError> {
        debug!(target = %self.target, level, "WpctlDevice::set_volume: called");
        let value = level.to_string();
        self.run(&["set-volume", &self.target, &value])
            .await
            .map(|_| ())
            .map_err(|e| DeviceError::Write {
                level,
                reason: e.to_string(),
            })
    }
}

/// Parse `Volume: 0.95` (optionally followed by `[MUTED]`)
fn parse_volume(output: &str) -> Option<f32> {
    output
        .lines()
        .find_map(|line| line.trim().strip_prefix("Volume:"))
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|value| value.parse().ok())
}

/// Pull `node.description = "..."` out of `wpctl inspect`
fn parse_description(output: &str) -> Option<String> {
    output
        .lines()
        .find(|line| line.contains("node.description"))
        .and_then(|line| line.split_once('='))
        .map(|(_, value)| value.trim().trim_matches('"').to_string())
        .filter(|name| !name.is_empty())
}
