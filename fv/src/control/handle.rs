//! HubHandle - Client interface to the Hub task

use eyre::{Result, eyre};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::debug;

use super::messages::{HubMetrics, HubRequest, SessionId};
use crate::shared::ConfigSnapshot;

/// Cloneable handle for talking to the Hub
#[derive(Clone)]
pub struct HubHandle {
    tx: mpsc::Sender<HubRequest>,
}

impl HubHandle {
    pub(crate) fn new(tx: mpsc::Sender<HubRequest>) -> Self {
        Self { tx }
    }

    /// Register a new session
    ///
    /// The returned receiver is already marked changed with the current
    /// snapshot, then changes once per broadcast. Only the latest snapshot is
    /// kept. It closes when the hub shuts down.
    pub async fn register(&self) -> Result<(SessionId, watch::Receiver<ConfigSnapshot>)> {
        let id = SessionId::new();
        debug!(session = %id, "HubHandle::register: called");
        let (reply_tx, reply_rx) = oneshot::channel();

        self.tx
            .send(HubRequest::Register { id, reply_tx })
            .await
            .map_err(|_| eyre!("Hub channel closed"))?;

        let rx = reply_rx.await.map_err(|_| eyre!("Hub shutdown before reply"))?;
        Ok((id, rx))
    }

    /// Remove a session
    pub async fn unregister(&self, id: SessionId) -> Result<()> {
        debug!(session = %id, "HubHandle::unregister: called");
        self.tx
            .send(HubRequest::Unregister { id })
            .await
            .map_err(|_| eyre!("Hub channel closed"))
    }

    /// Ask the hub to publish the current snapshot to every session
    pub async fn broadcast(&self, origin: Option<SessionId>) -> Result<()> {
        debug!(origin = ?origin, "HubHandle::broadcast: called");
        self.tx
            .send(HubRequest::Broadcast { origin })
            .await
            .map_err(|_| eyre!("Hub channel closed"))
    }

    /// Get current hub metrics
    pub async fn metrics(&self) -> Result<HubMetrics> {
        let (reply_tx, reply_rx) = oneshot::channel();

        self.tx
            .send(HubRequest::GetMetrics { reply_tx })
            .await
            .map_err(|_| eyre!("Hub channel closed"))?;

        reply_rx.await.map_err(|_| eyre!("Hub shutdown before reply"))
    }

    /// Request shutdown of the Hub
    pub async fn shutdown(&self) -> Result<()> {
        debug!("HubHandle::shutdown: called");
        self.tx
            .send(HubRequest::Shutdown)
            .await
            .map_err(|_| eyre!("Hub channel closed"))
    }
}
