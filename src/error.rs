//! # Error Types
//!
//! Error handling for the OpenFlow protocol engine.
//!
//! This module defines every error variant that can surface from the codec
//! layer, the registries and the switch connection lifecycle.
//!
//! ## Error Categories
//! - **Codec Errors**: unknown message types, malformed frames, unrepresentable values
//! - **Registry Errors**: duplicate codec registrations
//! - **Lifecycle Errors**: startup/shutdown misuse of the connection provider
//! - **Transport Errors**: I/O, TLS and connection closure
//!
//! An unknown message type is a capability gap (no codec registered) and is kept
//! distinct from a malformed frame, which is a data-integrity problem.
//!
//! ## Example Usage
//! ```rust
//! use openflow_protocol::error::{ProtocolError, Result};
//!
//! fn check_length(declared: u16) -> Result<()> {
//!     if declared < 8 {
//!         return Err(ProtocolError::MalformedFrame(format!(
//!             "declared length {declared} is shorter than the header"
//!         )));
//!     }
//!     Ok(())
//! }
//!
//! assert!(check_length(4).is_err());
//! ```

use std::io;
use thiserror::Error;

use crate::protocol::kind::MessageKind;

/// Error message constants to reduce allocations in error paths.
pub mod constants {
    /// Registry-related error messages
    pub const ERR_REGISTRY_WRITE_LOCK: &str = "Failed to acquire write lock on codec registry";
    pub const ERR_REGISTRY_READ_LOCK: &str = "Failed to acquire read lock on codec registry";

    /// Frame validation errors
    pub const ERR_EMPTY_FRAME: &str = "Frame is empty";
    pub const ERR_TRUNCATED_HEADER: &str = "Frame shorter than the common header";
    pub const ERR_TRAILING_BYTES: &str = "Deserializer left unread bytes in frame";

    /// Connection errors
    pub const ERR_OUTBOUND_QUEUE_FULL: &str = "Outbound queue full";

    /// Lifecycle errors
    pub const ERR_NO_CONFIGURATION: &str = "No connection configuration set";
    pub const ERR_NO_HANDLER: &str = "Switch connection handler is not set";
    pub const ERR_NO_RUNTIME: &str = "No tokio runtime available";
    pub const ERR_LOCK_POISONED: &str = "Synchronization primitive poisoned";
    pub const ERR_STARTUP_CANCELLED: &str = "Shutdown requested before the listener was bound";
    pub const ERR_SIGNAL_DROPPED: &str = "Lifecycle signal dropped before it was resolved";
}

// ProtocolError is the primary error type for all protocol operations
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Unknown message type {code} for version {version:#04x}")]
    UnknownMessageType { version: u8, code: u8 },

    #[error("No serializer for {kind:?} in version {version:#04x}")]
    UnsupportedMessage { version: u8, kind: MessageKind },

    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("Codec already registered for {0}")]
    DuplicateRegistration(String),

    #[error("Server already running")]
    AlreadyRunning,

    #[error("Not configured: {0}")]
    NotConfigured(String),

    #[error("Server not started")]
    NotStarted,

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("TLS error: {0}")]
    TlsError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Custom error: {0}")]
    Custom(String),
}

impl ProtocolError {
    /// Whether the error indicates a broken frame rather than a missing codec.
    pub fn is_malformed(&self) -> bool {
        matches!(self, ProtocolError::MalformedFrame(_))
    }
}

/// Type alias for Results using ProtocolError
pub type Result<T> = std::result::Result<T, ProtocolError>;
