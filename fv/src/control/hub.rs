//! Hub task: owns the set of live control sessions and the latest snapshot

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

use super::config::ControlConfig;
use super::handle::HubHandle;
use super::messages::{HubMetrics, HubRequest, SessionId};
use crate::shared::{ConfigSnapshot, SharedConfig};

/// Fans configuration snapshots out to every connected session
///
/// Only this task touches the session set, so membership changes and
/// broadcasts are serialized without locks. Snapshots are published on a
/// watch channel: a session that falls behind skips straight to the latest
/// one, and publishing never waits on a session.
pub struct Hub {
    config: ControlConfig,
    shared: Arc<SharedConfig>,
    tx: mpsc::Sender<HubRequest>,
    rx: mpsc::Receiver<HubRequest>,
}

impl Hub {
    pub fn new(config: ControlConfig, shared: Arc<SharedConfig>) -> Self {
        let (tx, rx) = mpsc::channel(config.hub_buffer);
        Self { config, shared, tx, rx }
    }

    /// Get a handle for sessions and the server
    pub fn handle(&self) -> HubHandle {
        HubHandle::new(self.tx.clone())
    }

    /// Run the Hub task
    ///
    /// This consumes the Hub and runs until shutdown is requested. Dropping
    /// the snapshot sender on exit closes every session.
    pub async fn run(mut self) {
        let (snapshots, _) = watch::channel(self.shared.snapshot());
        let mut sessions: HashSet<SessionId> = HashSet::new();
        let mut metrics = HubMetrics::default();

        info!(hub_buffer = self.config.hub_buffer, "Hub started");

        while let Some(req) = self.rx.recv().await {
            match req {
                HubRequest::Register { id, reply_tx } => {
                    debug!(session = %id, "Registering session");
                    // Refresh without waking anyone if an update is still queued behind us
                    let current = self.shared.snapshot();
                    snapshots.send_if_modified(|latest| {
                        if *latest == current {
                            return false;
                        }
                        *latest = current;
                        true
                    });

                    let mut rx = snapshots.subscribe();
                    rx.mark_changed();
                    if reply_tx.send(rx).is_ok() {
                        sessions.insert(id);
                    } else {
                        debug!(session = %id, "Session gone before registration completed");
                    }
                    metrics.registered_sessions = sessions.len();
                }

                HubRequest::Unregister { id } => {
                    if sessions.remove(&id) {
                        debug!(session = %id, "Unregistering session");
                    }
                    metrics.registered_sessions = sessions.len();
                }

                HubRequest::Broadcast { origin } => {
                    metrics.broadcasts += 1;
                    let snapshot = self.shared.snapshot();
                    debug!(
                        origin = ?origin.map(|id| id.to_string()),
                        interval = snapshot.interval,
                        volume = snapshot.volume,
                        sessions = sessions.len(),
                        "Broadcasting snapshot"
                    );
                    // Always notifies, so an unchanged value is still echoed
                    snapshots.send_replace(snapshot);
                }

                HubRequest::GetMetrics { reply_tx } => {
                    let _ = reply_tx.send(metrics.clone());
                }

                HubRequest::Shutdown => {
                    info!(sessions = sessions.len(), "Hub shutting down");
                    break;
                }
            }
        }

        info!("Hub stopped");
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::shared::{PollInterval, Volume};

    fn shared() -> Arc<SharedConfig> {
        Arc::new(SharedConfig::new(
            Volume::from_percent(95).unwrap(),
            PollInterval::from_millis(3000).unwrap(),
        ))
    }

    fn spawn_hub(shared: Arc<SharedConfig>) -> (HubHandle, tokio::task::JoinHandle<()>) {
        let hub = Hub::new(ControlConfig::default(), shared);
        let handle = hub.handle();
        (handle, tokio::spawn(hub.run()))
    }

    async fn next(rx: &mut watch::Receiver<ConfigSnapshot>) -> Option<ConfigSnapshot> {
        match tokio::time::timeout(Duration::from_secs(5), rx.changed()).await {
            Ok(Ok(())) => Some(*rx.borrow_and_update()),
            Ok(Err(_)) => None,
            Err(_) => panic!("timed out waiting for snapshot"),
        }
    }

    #[tokio::test]
    async fn test_hub_starts_and_stops() {
        let (handle, task) = spawn_hub(shared());
        handle.shutdown().await.unwrap();
        let result = tokio::time::timeout(Duration::from_secs(5), task).await;
        assert!(result.is_ok(), "Hub should shut down");
    }

    #[tokio::test]
    async fn test_register_sends_current_snapshot() {
        let (handle, _task) = spawn_hub(shared());
        let (_id, mut rx) = handle.register().await.unwrap();

        assert_eq!(next(&mut rx).await, Some(ConfigSnapshot { interval: 3000, volume: 95 }));
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_register_sees_update_not_yet_broadcast() {
        let shared = shared();
        let (handle, _task) = spawn_hub(shared.clone());

        shared.set_volume(Volume::from_percent(10).unwrap());
        let (_id, mut rx) = handle.register().await.unwrap();

        assert_eq!(next(&mut rx).await, Some(ConfigSnapshot { interval: 3000, volume: 10 }));
    }

    #[tokio::test]
    async fn test_broadcast_reaches_every_session() {
        let shared = shared();
        let (handle, _task) = spawn_hub(shared.clone());
        let (id_a, mut rx_a) = handle.register().await.unwrap();
        let (_id_b, mut rx_b) = handle.register().await.unwrap();
        next(&mut rx_a).await.unwrap();
        next(&mut rx_b).await.unwrap();

        shared.set_volume(Volume::from_percent(50).unwrap());
        handle.broadcast(Some(id_a)).await.unwrap();

        let expected = ConfigSnapshot { interval: 3000, volume: 50 };
        assert_eq!(next(&mut rx_a).await, Some(expected));
        assert_eq!(next(&mut rx_b).await, Some(expected));
    }

    #[tokio::test]
    async fn test_unchanged_broadcast_still_notifies() {
        let (handle, _task) = spawn_hub(shared());
        let (_id, mut rx) = handle.register().await.unwrap();
        next(&mut rx).await.unwrap();

        handle.broadcast(None).await.unwrap();
        assert_eq!(next(&mut rx).await, Some(ConfigSnapshot { interval: 3000, volume: 95 }));
    }

    #[tokio::test]
    async fn test_idle_session_does_not_block_others() {
        let shared = shared();
        let (handle, _task) = spawn_hub(shared.clone());

        // Never reads
        let (_idle, _idle_rx) = handle.register().await.unwrap();
        let (_live, mut live_rx) = handle.register().await.unwrap();
        next(&mut live_rx).await.unwrap();

        for percent in 0..=100 {
            shared.set_volume(Volume::from_percent(percent).unwrap());
            handle.broadcast(None).await.unwrap();
        }

        let mut last = next(&mut live_rx).await.unwrap();
        while last.volume != 100 {
            last = next(&mut live_rx).await.unwrap();
        }

        let metrics = handle.metrics().await.unwrap();
        assert_eq!(metrics.registered_sessions, 2);
        assert_eq!(metrics.broadcasts, 101);
    }

    #[tokio::test]
    async fn test_unregister_removes_session() {
        let (handle, _task) = spawn_hub(shared());
        let (id, _rx) = handle.register().await.unwrap();
        assert_eq!(handle.metrics().await.unwrap().registered_sessions, 1);

        handle.unregister(id).await.unwrap();
        assert_eq!(handle.metrics().await.unwrap().registered_sessions, 0);
    }

    #[tokio::test]
    async fn test_shutdown_closes_snapshot_channels() {
        let (handle, task) = spawn_hub(shared());
        let (_id, mut rx) = handle.register().await.unwrap();
        next(&mut rx).await.unwrap();

        handle.shutdown().await.unwrap();
        task.await.unwrap();

        assert_eq!(next(&mut rx).await, None);
    }
}
