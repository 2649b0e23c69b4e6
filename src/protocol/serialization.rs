//! # Serialization Factory
//!
//! Turns a typed [`Message`] into wire bytes by looking up the serializer
//! registered for the message's `(version, kind)` and running it.

use std::sync::Arc;

use bytes::BytesMut;
use tracing::trace;

use crate::error::Result;
use crate::protocol::kind::MessageTypeKey;
use crate::protocol::message::Message;
use crate::protocol::registry::{SerializerRegistry, SharedSerializerRegistry};

/// Stateless dispatcher over a serializer registry.
#[derive(Clone)]
pub struct SerializationFactory {
    registry: Arc<SharedSerializerRegistry>,
}

impl SerializationFactory {
    pub fn new(registry: Arc<SharedSerializerRegistry>) -> Self {
        Self { registry }
    }

    /// Factory over the built-in serializers only.
    pub fn builtin() -> Self {
        Self::new(Arc::new(SharedSerializerRegistry::new(
            SerializerRegistry::builtin(),
        )))
    }

    pub fn registry(&self) -> &Arc<SharedSerializerRegistry> {
        &self.registry
    }

    /// Append the encoded `message` to `out`.
    ///
    /// Fails with `UnsupportedMessage` when no serializer is registered for
    /// the message's version and kind. On any error `out` keeps only the
    /// bytes it held before the call.
    pub fn serialize(&self, message: &Message, out: &mut BytesMut) -> Result<()> {
        let key = MessageTypeKey::new(message.version, message.kind());
        let serializer = self.registry.lookup(&key)?;
        let before = out.len();
        if let Err(e) = serializer.serialize(message, out) {
            out.truncate(before);
            return Err(e);
        }
        trace!(%key, xid = message.xid, bytes = out.len() - before, "Message serialized");
        Ok(())
    }
}

impl std::fmt::Debug for SerializationFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerializationFactory").finish_non_exhaustive()
    }
}
