//! # Switch Connection Service
//!
//! Accepts switch connections over TCP or TLS and connects them to the codec
//! layer and a controller-supplied [`SwitchConnectionHandler`].
//!
//! ## Components
//! - **Provider**: configuration, handler and the startup/shutdown state machine
//! - **Server**: accept loop with online and shutdown-complete signals
//! - **Connection**: per-switch task with idle timeout and ordered delivery
//! - **Signal**: one-shot awaitable lifecycle outcome
//!
//! ## Example
//! ```no_run
//! use std::net::{IpAddr, Ipv4Addr};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use openflow_protocol::config::ConnectionConfig;
//! use openflow_protocol::protocol::Message;
//! use openflow_protocol::service::{
//!     CloseReason, ConnectionHandle, ConnectionId, SwitchConnectionHandler,
//!     SwitchConnectionProvider,
//! };
//!
//! struct Controller;
//!
//! impl SwitchConnectionHandler for Controller {
//!     fn on_switch_connected(&self, switch: ConnectionHandle) {
//!         println!("switch {} from {}", switch.id(), switch.peer());
//!     }
//!     fn on_message(&self, switch: &ConnectionId, message: Message) {
//!         println!("{switch}: {}", message.kind());
//!     }
//!     fn on_connection_closed(&self, switch: &ConnectionId, reason: CloseReason) {
//!         println!("{switch} closed: {reason}");
//!     }
//! }
//!
//! # async fn run() -> openflow_protocol::error::Result<()> {
//! let provider = SwitchConnectionProvider::new();
//! provider.set_configuration(ConnectionConfig::new(
//!     IpAddr::V4(Ipv4Addr::UNSPECIFIED),
//!     6653,
//!     Duration::from_secs(15),
//! ))?;
//! provider.set_switch_connection_handler(Arc::new(Controller))?;
//!
//! let address = provider.startup()?.wait().await.map_err(|e| {
//!     openflow_protocol::error::ProtocolError::Custom(e.to_string())
//! })?;
//! println!("listening on {address}");
//!
//! let _ = provider.shutdown()?.wait().await;
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod handler;
pub mod provider;
pub mod server;
pub mod signal;

pub use handler::{CloseReason, ConnectionHandle, ConnectionId, SwitchConnectionHandler};
pub use provider::SwitchConnectionProvider;
pub use server::SwitchServer;
pub use signal::{Signal, SignalResult};
