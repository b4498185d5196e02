//! forcevolume - keep an audio endpoint pinned to a target volume
//!
//! CLI entry point: loads configuration, opens the device, and runs the
//! enforcement loop alongside the optional control server.

use std::sync::Arc;

use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result};
use tracing::{debug, info, warn};

use forcevolume::cli::{Cli, Command};
use forcevolume::config::Config;
use forcevolume::control::{self, AppState, Hub};
use forcevolume::device;
use forcevolume::enforcer::Enforcer;

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    // Determine log level with priority: CLI --log-level > config file > default (INFO)
    let level_str = cli_log_level.or(config_log_level);
    let level = if let Some(s) = level_str {
        match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        }
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .try_init()
        .map_err(|e| eyre::eyre!("Failed to install subscriber: {}", e))?;

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());

    // Setup logging with priority: CLI > config > INFO default
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let mut config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    cli.apply_overrides(&mut config);

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command.unwrap_or(Command::Run) {
        Command::Run => cmd_run(&config).await,
        Command::Probe => cmd_probe(&config).await,
    }
}

/// Enforce the target volume until SIGINT/SIGTERM
async fn cmd_run(config: &Config) -> Result<()> {
    debug!("cmd_run: called");
    // Validate before touching the device so bad flags fail fast
    let shared = Arc::new(config.shared_config()?);

    let device = device::open(&config.device)
        .await
        .context("Failed to open audio device")?;

    let enforcer_handle = tokio::spawn(Enforcer::new(device.clone(), shared.clone()).run());

    let mut server = None;
    if let Some(addr) = config.control.bind_address() {
        debug!(%addr, "cmd_run: starting control channel");
        let hub = Hub::new(config.control.clone(), shared.clone());
        let hub_handle = hub.handle();
        let hub_task = tokio::spawn(hub.run());

        let page = control::render_page(device.name())?;
        let listener = control::bind(&addr).await?;
        let state = AppState {
            hub: hub_handle.clone(),
            shared: shared.clone(),
            page: Arc::from(page),
        };
        let serve_task = tokio::spawn(async move {
            if let Err(e) = control::serve(listener, state).await {
                tracing::error!(error = %e, "Control server failed");
            }
        });
        server = Some((hub_handle, hub_task, serve_task));
    } else {
        info!("Control channel disabled");
    }

    wait_for_shutdown().await?;
    info!("Shutting down...");

    if let Some((hub_handle, hub_task, serve_task)) = server {
        serve_task.abort();
        if let Err(e) = hub_handle.shutdown().await {
            warn!(error = %e, "Hub already stopped");
        }
        let _ = hub_task.await;
    }
    enforcer_handle.abort();
    device.close().await;

    debug!("cmd_run: shutdown complete");
    Ok(())
}

/// Open the device and report its name and level
async fn cmd_probe(config: &Config) -> Result<()> {
    debug!("cmd_probe: called");
    let device = device::open(&config.device)
        .await
        .context("Failed to open audio device")?;
    let level = device.get_volume().await.context("Failed to read device volume")?;

    println!("{} {}", "Device:".bold(), device.name().cyan());
    println!("{} {:.2}%", "Volume:".bold(), level * 100.0);
    println!("{} {}", "Backend:".bold(), config.device.backend);

    device.close().await;
    Ok(())
}

async fn wait_for_shutdown() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;

        tokio::select! {
            _ = sigint.recv() => debug!("wait_for_shutdown: SIGINT received"),
            _ = sigterm.recv() => debug!("wait_for_shutdown: SIGTERM received"),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        debug!("wait_for_shutdown: ctrl_c received");
    }

    Ok(())
}
