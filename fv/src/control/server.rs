//! # Control Web Server
//!
//! Axum server for the control surface.
//!
//! | Path | Description |
//! |------|-------------|
//! | `/` | Control page |
//! | `/ws` | WebSocket control session |

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Router,
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::{Html, Response},
    routing::get,
};
use eyre::{Context, Result};
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use super::handle::HubHandle;
use super::session::{ControlSession, ControlTransport, TransportError};
use crate::shared::{ConfigSnapshot, SharedConfig};

/// Shared state passed to all request handlers
#[derive(Clone)]
pub struct AppState {
    pub hub: HubHandle,
    pub shared: Arc<SharedConfig>,
    /// Rendered control page
    pub page: Arc<str>,
}

/// Build the router with all control endpoints
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handle_index))
        .route("/ws", get(handle_websocket))
        .with_state(state)
}

/// Bind the control listener
pub async fn bind(addr: &str) -> Result<TcpListener> {
    debug!(%addr, "bind: called");
    TcpListener::bind(addr)
        .await
        .context(format!("Failed to bind control server to {}", addr))
}

/// Serve the control surface until the listener fails
pub async fn serve(listener: TcpListener, state: AppState) -> Result<()> {
    let addr = listener.local_addr()?;
    info!("Serving control UI at http://{}", addr);
    axum::serve(listener, router(state))
        .await
        .context("Control server terminated unexpectedly")
}

async fn handle_index(State(state): State<AppState>) -> Html<String> {
    Html(state.page.to_string())
}

async fn handle_websocket(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    match ControlSession::connect(WsTransport::new(socket), state.hub, state.shared).await {
        Ok(session) => session.run().await,
        Err(e) => warn!(error = %e, "Failed to register control session"),
    }
}

/// WebSocket transport: JSON text frames out, text frames in
pub struct WsTransport {
    socket: WebSocket,
}

impl WsTransport {
    pub fn new(socket: WebSocket) -> Self {
        Self { socket }
    }
}

#[async_trait]
impl ControlTransport for WsTransport {
    async fn send(&mut self, snapshot: &ConfigSnapshot) -> Result<(), TransportError> {
        let text = serde_json::to_string(snapshot)?;
        self.socket
            .send(Message::Text(text.into()))
            .await
            .map_err(|e| TransportError::Send(e.to_string()))
    }

    async fn recv(&mut self) -> Option<Result<String, TransportError>> {
        loop {
            match self.socket.recv().await? {
                Ok(Message::Text(text)) => return Some(Ok(text.as_str().to_owned())),
                Ok(Message::Binary(bytes)) => match String::from_utf8(bytes.to_vec()) {
                    Ok(text) => return Some(Ok(text)),
                    Err(_) => debug!("Ignoring non-UTF-8 binary frame"),
                },
                Ok(Message::Close(_)) => return None,
                // Ping/pong are answered by axum
                Ok(_) => {}
                Err(e) => return Some(Err(TransportError::Recv(e.to_string()))),
            }
        }
    }
}
