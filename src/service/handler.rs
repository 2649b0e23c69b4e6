//! Callback surface between the connection service and the controller.

use std::fmt;
use std::net::SocketAddr;

use bytes::BytesMut;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::error::{constants, ProtocolError, Result};
use crate::protocol::message::Message;
use crate::protocol::serialization::SerializationFactory;

/// Identity of one accepted switch connection, unique per server run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "switch-{}", self.0)
    }
}

/// Why a connection ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// The switch closed its side.
    RemoteClosed,
    /// No bytes arrived within the idle timeout.
    IdleTimeout,
    /// The server is shutting down.
    Shutdown,
    /// A frame could not be framed or decoded.
    ProtocolError(String),
    /// The socket failed.
    TransportError(String),
    /// TLS negotiation failed or timed out.
    HandshakeFailed(String),
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloseReason::RemoteClosed => f.write_str("closed by switch"),
            CloseReason::IdleTimeout => f.write_str("idle timeout"),
            CloseReason::Shutdown => f.write_str("server shutdown"),
            CloseReason::ProtocolError(e) => write!(f, "protocol error: {e}"),
            CloseReason::TransportError(e) => write!(f, "transport error: {e}"),
            CloseReason::HandshakeFailed(e) => write!(f, "TLS handshake failed: {e}"),
        }
    }
}

/// Sending side of a live switch connection.
///
/// Messages are encoded on the caller's side, so encoding errors surface
/// here; the connection task only writes finished frames, in queue order.
#[derive(Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    peer: SocketAddr,
    serializer: SerializationFactory,
    tx: mpsc::Sender<bytes::Bytes>,
}

impl ConnectionHandle {
    pub(crate) fn new(
        id: ConnectionId,
        peer: SocketAddr,
        serializer: SerializationFactory,
        tx: mpsc::Sender<bytes::Bytes>,
    ) -> Self {
        Self {
            id,
            peer,
            serializer,
            tx,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Queue `message`, waiting for room in the outbound queue.
    pub async fn send(&self, message: &Message) -> Result<()> {
        let frame = self.encode(message)?;
        self.tx
            .send(frame)
            .await
            .map_err(|_| ProtocolError::ConnectionClosed)
    }

    /// Queue `message` without waiting; a full queue is an error.
    pub fn try_send(&self, message: &Message) -> Result<()> {
        let frame = self.encode(message)?;
        self.tx.try_send(frame).map_err(|e| match e {
            TrySendError::Full(_) => {
                ProtocolError::Custom(constants::ERR_OUTBOUND_QUEUE_FULL.to_string())
            }
            TrySendError::Closed(_) => ProtocolError::ConnectionClosed,
        })
    }

    fn encode(&self, message: &Message) -> Result<bytes::Bytes> {
        let mut out = BytesMut::new();
        self.serializer.serialize(message, &mut out)?;
        Ok(out.freeze())
    }
}

impl fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("id", &self.id)
            .field("peer", &self.peer)
            .finish()
    }
}

/// Receives connection and message events from the switch server.
///
/// Callbacks run on the connection's own task: messages of one connection are
/// delivered in arrival order, and a slow callback only delays that
/// connection. Long work should be handed off.
///
/// When a TLS handshake fails, `on_connection_closed` is called for an id
/// that was never announced through `on_switch_connected`.
pub trait SwitchConnectionHandler: Send + Sync + 'static {
    /// A switch connected and completed any TLS handshake.
    fn on_switch_connected(&self, connection: ConnectionHandle);

    /// A frame from `connection` was decoded.
    fn on_message(&self, connection: &ConnectionId, message: Message);

    /// `connection` ended; called exactly once per accepted connection.
    fn on_connection_closed(&self, connection: &ConnectionId, reason: CloseReason);
}
