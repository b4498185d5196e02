//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

use crate::config::Config;
use crate::device::DeviceBackend;

/// forcevolume - pin a capture endpoint to a target volume
#[derive(Debug, Parser)]
#[command(
    name = "fv",
    about = "Keep an audio endpoint pinned to a target volume, with a live web control page",
    version = env!("GIT_DESCRIBE"),
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Target volume in percent (0-100)
    #[arg(long, global = true, value_name = "PERCENT")]
    pub volume: Option<f64>,

    /// Poll interval in milliseconds (100-10000)
    #[arg(long, global = true, value_name = "MS")]
    pub interval: Option<i64>,

    /// Serve the control page on this address (e.g. 127.0.0.1:8080 or :8080)
    #[arg(long, visible_alias = "html", global = true, value_name = "ADDR")]
    pub listen: Option<String>,

    /// Device backend (wpctl, memory)
    #[arg(short, long, global = true)]
    pub device: Option<DeviceBackend>,

    /// Endpoint to control
    #[arg(short, long, global = true)]
    pub target: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Enforce the target volume until interrupted (default)
    Run,

    /// Open the device, print its name and current level, and exit
    Probe,
}

impl Cli {
    /// Apply command line overrides on top of the loaded configuration
    pub fn apply_overrides(&self, config: &mut Config) {
        debug!(volume = ?self.volume, interval = ?self.interval, listen = ?self.listen, "Cli::apply_overrides: called");
        if let Some(volume) = self.volume {
            config.volume = volume;
        }
        if let Some(interval) = self.interval {
            config.interval_ms = interval;
        }
        if let Some(listen) = &self.listen {
            config.control.listen = Some(listen.clone());
        }
        if let Some(backend) = self.device {
            config.device.backend = backend;
        }
        if let Some(target) = &self.target {
            config.device.target = target.clone();
        }
    }
}
