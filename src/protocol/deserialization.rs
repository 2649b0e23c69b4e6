//! # Deserialization Factory
//!
//! Turns one framed message back into a typed [`Message`].
//!
//! Input is a frame with the version byte already stripped (see
//! [`crate::core::codec::Frame`]): `[type:1] [length:2] [xid:4] [body]`.
//!
//! ## Steps
//! 1. Read the type code. An empty buffer is a malformed frame.
//! 2. Resolve the kind from the static type table, falling back to a
//!    registered `Custom(code)` deserializer. Neither present means
//!    `UnknownMessageType`, reported before anything else is read.
//! 3. Skip the length field; framing already validated it.
//! 4. Look up the deserializer for `(version, code, kind)`.
//! 5. Run it and require that it consumed the whole frame.

use std::sync::Arc;

use bytes::{Buf, Bytes};
use tracing::trace;

use crate::error::{constants, ProtocolError, Result};
use crate::protocol::kind::{MessageCodeKey, MessageKind};
use crate::protocol::message::Message;
use crate::protocol::registry::{DeserializerRegistry, SharedDeserializerRegistry};
use crate::protocol::type_table::TypeTable;

const LENGTH_FIELD_SIZE: usize = 2;

#[derive(Clone)]
pub struct DeserializationFactory {
    table: Arc<TypeTable>,
    registry: Arc<SharedDeserializerRegistry>,
}

impl DeserializationFactory {
    pub fn new(registry: Arc<SharedDeserializerRegistry>) -> Self {
        Self {
            table: Arc::new(TypeTable::builtin()),
            registry,
        }
    }

    /// Factory over the built-in deserializers only.
    pub fn builtin() -> Self {
        Self::new(Arc::new(SharedDeserializerRegistry::new(
            DeserializerRegistry::builtin(),
        )))
    }

    pub fn registry(&self) -> &Arc<SharedDeserializerRegistry> {
        &self.registry
    }

    /// Decode one frame received on a connection speaking `version`.
    pub fn deserialize(&self, buf: &mut Bytes, version: u8) -> Result<Message> {
        if !buf.has_remaining() {
            return Err(ProtocolError::MalformedFrame(
                constants::ERR_EMPTY_FRAME.to_string(),
            ));
        }
        let code = buf.get_u8();
        let registry = self.registry.snapshot()?;

        let kind = match self.table.kind_of(version, code) {
            Some(kind) => kind,
            None => {
                let custom = MessageCodeKey::new(version, code, MessageKind::Custom(code));
                if !registry.contains(&custom) {
                    return Err(ProtocolError::UnknownMessageType { version, code });
                }
                custom.kind
            }
        };

        if buf.remaining() < LENGTH_FIELD_SIZE {
            return Err(ProtocolError::MalformedFrame(format!(
                "{}: length field missing",
                constants::ERR_TRUNCATED_HEADER
            )));
        }
        buf.advance(LENGTH_FIELD_SIZE);

        let key = MessageCodeKey::new(version, code, kind);
        let deserializer = registry.lookup(&key)?;
        let message = deserializer.deserialize(&key, buf)?;

        if buf.has_remaining() {
            return Err(ProtocolError::MalformedFrame(format!(
                "{}: {} byte(s) after {key}",
                constants::ERR_TRAILING_BYTES,
                buf.remaining()
            )));
        }
        trace!(%key, xid = message.xid, "Message deserialized");
        Ok(message)
    }
}

impl std::fmt::Debug for DeserializationFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeserializationFactory")
            .field("types", &self.table.len())
            .finish_non_exhaustive()
    }
}
