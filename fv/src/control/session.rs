//! One connected control client

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info};

use super::handle::HubHandle;
use super::messages::{ControlUpdate, SessionId};
use crate::shared::{ConfigSnapshot, SharedConfig};

/// Errors from a session's transport
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Failed to encode snapshot: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Send failed: {0}")]
    Send(String),

    #[error("Receive failed: {0}")]
    Recv(String),
}

/// Bidirectional message transport for one client
#[async_trait]
pub trait ControlTransport: Send {
    /// Push a snapshot to the client
    async fn send(&mut self, snapshot: &ConfigSnapshot) -> Result<(), TransportError>;

    /// Next inbound text message; `None` once the client has gone away
    ///
    /// Must be cancel-safe: it is raced against outbound snapshots.
    async fn recv(&mut self) -> Option<Result<String, TransportError>>;
}

/// A registered client: applies its updates and relays hub snapshots to it
pub struct ControlSession<T> {
    id: SessionId,
    transport: T,
    snapshots: watch::Receiver<ConfigSnapshot>,
    hub: HubHandle,
    shared: Arc<SharedConfig>,
}

impl<T: ControlTransport> ControlSession<T> {
    /// Register with the hub; the current snapshot is pending for the client
    pub async fn connect(transport: T, hub: HubHandle, shared: Arc<SharedConfig>) -> eyre::Result<Self> {
        let (id, snapshots) = hub.register().await?;
        info!(session = %id, "Control session connected");
        Ok(Self {
            id,
            transport,
            snapshots,
            hub,
            shared,
        })
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Drive the session until its transport fails or the hub shuts down
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                changed = self.snapshots.changed() => {
                    if changed.is_err() {
                        debug!(session = %self.id, "Hub closed snapshot channel");
                        break;
                    }
                    let snapshot = *self.snapshots.borrow_and_update();
                    if let Err(e) = self.transport.send(&snapshot).await {
                        debug!(session = %self.id, error = %e, "Send failed");
                        break;
                    }
                }
                inbound = self.transport.recv() => {
                    match inbound {
                        Some(Ok(text)) => {
                            if !apply_message(self.id, &self.shared, &self.hub, &text).await {
                                break;
                            }
                        }
                        Some(Err(e)) => {
                            debug!(session = %self.id, error = %e, "Receive failed");
                            break;
                        }
                        None => break,
                    }
                }
            }
        }

        if let Err(e) = self.hub.unregister(self.id).await {
            debug!(session = %self.id, error = %e, "Hub already stopped");
        }
        info!(session = %self.id, "Control session closed");
    }
}

/// Apply one inbound message; false if the hub is gone
///
/// Malformed or out-of-range messages are dropped without a reply or a
/// broadcast.
async fn apply_message(id: SessionId, shared: &SharedConfig, hub: &HubHandle, text: &str) -> bool {
    let update = match text.parse::<ControlUpdate>() {
        Ok(update) => update,
        Err(e) => {
            debug!(session = %id, %text, error = %e, "Ignoring control message");
            return true;
        }
    };

    debug!(session = %id, ?update, "Applying control update");
    update.apply(shared);
    hub.broadcast(Some(id)).await.is_ok()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::sync::mpsc;

    use super::*;
    use crate::control::{ControlConfig, Hub};
    use crate::shared::{PollInterval, Volume};

    /// Transport backed by channels: the test plays the client
    struct ChannelTransport {
        inbound: mpsc::UnboundedReceiver<String>,
        outbound: mpsc::UnboundedSender<ConfigSnapshot>,
    }

    struct Client {
        tx: mpsc::UnboundedSender<String>,
        rx: mpsc::UnboundedReceiver<ConfigSnapshot>,
    }

    impl Client {
        async fn next(&mut self) -> ConfigSnapshot {
            tokio::time::timeout(Duration::from_secs(5), self.rx.recv())
                .await
                .expect("timed out waiting for snapshot")
                .expect("session closed")
        }
    }

    #[async_trait]
    impl ControlTransport for ChannelTransport {
        async fn send(&mut self, snapshot: &ConfigSnapshot) -> Result<(), TransportError> {
            self.outbound
                .send(*snapshot)
                .map_err(|_| TransportError::Send("client gone".to_string()))
        }

        async fn recv(&mut self) -> Option<Result<String, TransportError>> {
            self.inbound.recv().await.map(Ok)
        }
    }

    fn transport() -> (ChannelTransport, Client) {
        let (in_tx, in_rx) = mpsc::unbounded_channel();
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        (
            ChannelTransport {
                inbound: in_rx,
                outbound: out_tx,
            },
            Client { tx: in_tx, rx: out_rx },
        )
    }

    fn setup() -> (Arc<SharedConfig>, HubHandle) {
        setup_with(ControlConfig::default())
    }

    fn setup_with(config: ControlConfig) -> (Arc<SharedConfig>, HubHandle) {
        let shared = Arc::new(SharedConfig::new(
            Volume::from_percent(95).unwrap(),
            PollInterval::from_millis(3000).unwrap(),
        ));
        let hub = Hub::new(config, shared.clone());
        let handle = hub.handle();
        tokio::spawn(hub.run());
        (shared, handle)
    }

    async fn wait_for_sessions(hub: &HubHandle, expected: usize) -> usize {
        let mut registered = hub.metrics().await.unwrap().registered_sessions;
        for _ in 0..50 {
            if registered == expected {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
            registered = hub.metrics().await.unwrap().registered_sessions;
        }
        registered
    }

    async fn connect(shared: &Arc<SharedConfig>, hub: &HubHandle) -> Client {
        let (transport, client) = transport();
        let session = ControlSession::connect(transport, hub.clone(), shared.clone()).await.unwrap();
        tokio::spawn(session.run());
        client
    }

    #[tokio::test]
    async fn test_initial_snapshot_on_connect() {
        let (shared, hub) = setup();
        let mut client = connect(&shared, &hub).await;

        assert_eq!(client.next().await, ConfigSnapshot { interval: 3000, volume: 95 });
    }

    #[tokio::test]
    async fn test_valid_update_echoes_to_sender() {
        let (shared, hub) = setup();
        let mut client = connect(&shared, &hub).await;
        client.next().await;

        client.tx.send("interval:500".to_string()).unwrap();
        assert_eq!(client.next().await, ConfigSnapshot { interval: 500, volume: 95 });
        assert_eq!(shared.interval().millis(), 500);
    }

    #[tokio::test]
    async fn test_invalid_update_is_silent() {
        let (shared, hub) = setup();
        let mut client = connect(&shared, &hub).await;
        client.next().await;

        for bad in ["volume:101", "volume:-1", "volume:abc", "bogus", "mute:1"] {
            client.tx.send(bad.to_string()).unwrap();
        }
        // Messages are processed in order, so this one's echo comes first
        client.tx.send("volume:40".to_string()).unwrap();

        assert_eq!(client.next().await, ConfigSnapshot { interval: 3000, volume: 40 });
        assert_eq!(hub.metrics().await.unwrap().broadcasts, 1);
    }

    #[tokio::test]
    async fn test_messages_processed_in_order() {
        let (shared, hub) = setup();
        let mut client = connect(&shared, &hub).await;
        client.next().await;

        for percent in [10, 20, 30] {
            client.tx.send(format!("volume:{percent}")).unwrap();
        }

        let mut last = client.next().await;
        while last.volume != 30 {
            last = client.next().await;
        }
        assert_eq!(shared.volume().percent(), 30);
    }

    #[tokio::test]
    async fn test_client_disconnect_unregisters() {
        let (shared, hub) = setup();
        let mut client = connect(&shared, &hub).await;
        client.next().await;
        assert_eq!(hub.metrics().await.unwrap().registered_sessions, 1);

        drop(client);

        assert_eq!(wait_for_sessions(&hub, 0).await, 0);
    }

    #[tokio::test]
    async fn test_write_failure_unregisters_only_that_session() {
        let (shared, hub) = setup();
        let Client {
            tx: _broken_tx,
            rx: mut broken_rx,
        } = connect(&shared, &hub).await;
        let mut healthy = connect(&shared, &hub).await;
        broken_rx.recv().await.unwrap();
        healthy.next().await;

        // Inbound stays open; only sends to this client fail from now on
        drop(broken_rx);

        healthy.tx.send("volume:40".to_string()).unwrap();
        assert_eq!(healthy.next().await, ConfigSnapshot { interval: 3000, volume: 40 });
        assert_eq!(wait_for_sessions(&hub, 1).await, 1);

        healthy.tx.send("volume:41".to_string()).unwrap();
        assert_eq!(healthy.next().await, ConfigSnapshot { interval: 3000, volume: 41 });
    }

    #[tokio::test]
    async fn test_update_burst_keeps_session_registered() {
        let (shared, hub) = setup_with(ControlConfig {
            hub_buffer: 1,
            ..Default::default()
        });
        let mut client = connect(&shared, &hub).await;
        client.next().await;

        for i in 0..5000 {
            client.tx.send(format!("volume:{}", i % 50)).unwrap();
        }
        client.tx.send("volume:77".to_string()).unwrap();

        let mut last = client.next().await;
        while last.volume != 77 {
            last = client.next().await;
        }

        let metrics = hub.metrics().await.unwrap();
        assert_eq!(metrics.registered_sessions, 1);
        assert_eq!(metrics.broadcasts, 5001);
        assert_eq!(shared.volume().percent(), 77);
    }
}
