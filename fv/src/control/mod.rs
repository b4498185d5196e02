//! Control channel for live reconfiguration
//!
//! Clients connect over a WebSocket, send `interval:<ms>` / `volume:<percent>`
//! updates, and receive a JSON snapshot of the configuration whenever it
//! changes. Session membership is owned by the [`Hub`] task:
//! - **Register:** add a session and hand it the current snapshot
//! - **Broadcast:** publish the current snapshot; slow sessions skip to the latest
//! - **Unregister:** drop a session whose transport has failed

mod config;
mod handle;
mod hub;
mod messages;
mod page;
mod server;
mod session;

pub use config::ControlConfig;
pub use handle::HubHandle;
pub use hub::Hub;
pub use messages::{ControlUpdate, HubMetrics, HubRequest, ParseUpdateError, SessionId};
pub use page::render_page;
pub use server::{AppState, WsTransport, bind, router, serve};
pub use session::{ControlSession, ControlTransport, TransportError};
