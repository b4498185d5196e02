//! Message types for the control channel

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use tokio::sync::{oneshot, watch};
use tracing::debug;
use uuid::Uuid;

use crate::shared::{ConfigError, ConfigSnapshot, PollInterval, SharedConfig, Volume};

/// Opaque identity of one control session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Why an inbound control message was ignored
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseUpdateError {
    #[error("Missing ':' separator")]
    MissingSeparator,

    #[error("Unknown key: {0}")]
    UnknownKey(String),

    #[error("Not an integer: {0}")]
    InvalidNumber(String),

    #[error(transparent)]
    OutOfRange(#[from] ConfigError),
}

/// A validated `key:value` update from a control client
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlUpdate {
    /// `interval:<ms>`, 100-10000
    Interval(PollInterval),
    /// `volume:<percent>`, 0-100
    Volume(Volume),
}

impl ControlUpdate {
    /// Write the update into the shared configuration
    pub fn apply(self, shared: &SharedConfig) {
        match self {
            Self::Interval(interval) => shared.set_interval(interval),
            Self::Volume(volume) => shared.set_volume(volume),
        }
    }
}

impl FromStr for ControlUpdate {
    type Err = ParseUpdateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "ControlUpdate::from_str: called");
        let (key, value) = s.split_once(':').ok_or(ParseUpdateError::MissingSeparator)?;
        let number = |value: &str| {
            value
                .parse::<i64>()
                .map_err(|_| ParseUpdateError::InvalidNumber(value.to_string()))
        };

        match key {
            "interval" => Ok(Self::Interval(PollInterval::from_millis(number(value)?)?)),
            "volume" => Ok(Self::Volume(Volume::from_percent(number(value)?)?)),
            _ => Err(ParseUpdateError::UnknownKey(key.to_string())),
        }
    }
}

/// Requests to the Hub task
#[derive(Debug)]
pub enum HubRequest {
    /// Add a session; the reply yields the current snapshot straight away
    Register {
        id: SessionId,
        reply_tx: oneshot::Sender<watch::Receiver<ConfigSnapshot>>,
    },

    /// Remove a session
    Unregister { id: SessionId },

    /// Publish the current snapshot to every session
    Broadcast { origin: Option<SessionId> },

    /// Get current metrics
    GetMetrics { reply_tx: oneshot::Sender<HubMetrics> },

    /// Shutdown the hub
    Shutdown,
}

/// Hub metrics for observability
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct HubMetrics {
    pub registered_sessions: usize,
    pub broadcasts: u64,
}
