//! # Codec Registries
//!
//! Version-and-kind keyed lookup tables of serialization routines.
//!
//! Registries are filled through a [`CodecRegistryBuilder`] during start-up and
//! frozen by `build()`; a frozen [`CodecRegistry`] is an `Arc` around an
//! immutable map, so concurrent lookups need no locking.
//!
//! Extensions registered after publication go through a [`SharedRegistry`],
//! which copies the current map, applies the change and swaps the whole map in
//! one step. Readers holding an older snapshot keep a consistent view.
//!
//! ## Re-registration policy
//! - `register` rejects an existing key with `DuplicateRegistration`.
//! - `register_override` replaces it and logs the replacement.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, RwLock};

use bytes::{Bytes, BytesMut};
use tracing::{debug, warn};

use crate::error::{constants, ProtocolError, Result};
use crate::protocol::kind::{MessageCodeKey, MessageTypeKey};
use crate::protocol::message::Message;

/// Encodes one message kind, header included, into `out`.
pub trait MessageSerializer: Send + Sync {
    fn serialize(&self, message: &Message, out: &mut BytesMut) -> Result<()>;
}

impl<F> MessageSerializer for F
where
    F: Fn(&Message, &mut BytesMut) -> Result<()> + Send + Sync,
{
    fn serialize(&self, message: &Message, out: &mut BytesMut) -> Result<()> {
        self(message, out)
    }
}

/// Decodes one message kind.
///
/// `buf` is positioned at the transaction id: version, type and length have
/// already been consumed. The deserializer must consume the rest of the frame
/// exactly.
pub trait MessageDeserializer: Send + Sync {
    fn deserialize(&self, key: &MessageCodeKey, buf: &mut Bytes) -> Result<Message>;
}

impl<F> MessageDeserializer for F
where
    F: Fn(&MessageCodeKey, &mut Bytes) -> Result<Message> + Send + Sync,
{
    fn deserialize(&self, key: &MessageCodeKey, buf: &mut Bytes) -> Result<Message> {
        self(key, buf)
    }
}

/// Keys a registry can be indexed by.
pub trait RegistryKey: Copy + Eq + Hash + fmt::Display + Send + Sync + 'static {
    /// Error reported when nothing is registered under this key.
    fn missing(&self) -> ProtocolError;
}

impl RegistryKey for MessageTypeKey {
    fn missing(&self) -> ProtocolError {
        ProtocolError::UnsupportedMessage {
            version: self.version,
            kind: self.kind,
        }
    }
}

impl RegistryKey for MessageCodeKey {
    fn missing(&self) -> ProtocolError {
        ProtocolError::UnknownMessageType {
            version: self.version,
            code: self.code,
        }
    }
}

type Entries<K, C> = HashMap<K, Arc<C>>;

/// Frozen, cheaply clonable registry.
pub struct CodecRegistry<K, C: ?Sized> {
    entries: Arc<Entries<K, C>>,
}

impl<K, C: ?Sized> Clone for CodecRegistry<K, C> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<K: RegistryKey, C: ?Sized> CodecRegistry<K, C> {
    pub fn builder() -> CodecRegistryBuilder<K, C> {
        CodecRegistryBuilder::new()
    }

    pub fn lookup(&self, key: &K) -> Result<Arc<C>> {
        self.entries
            .get(key)
            .cloned()
            .ok_or_else(|| key.missing())
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reopen for modification, starting from a copy of the current entries.
    pub fn to_builder(&self) -> CodecRegistryBuilder<K, C> {
        CodecRegistryBuilder {
            entries: (*self.entries).clone(),
        }
    }
}

impl<K: fmt::Debug, C: ?Sized> fmt::Debug for CodecRegistry<K, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.entries.keys()).finish()
    }
}

/// Mutable registry used during initialization.
pub struct CodecRegistryBuilder<K, C: ?Sized> {
    entries: Entries<K, C>,
}

impl<K: RegistryKey, C: ?Sized> Default for CodecRegistryBuilder<K, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: RegistryKey, C: ?Sized> CodecRegistryBuilder<K, C> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Add a codec; an existing entry for `key` is left untouched and reported.
    pub fn register(&mut self, key: K, codec: Arc<C>) -> Result<()> {
        if self.entries.contains_key(&key) {
            return Err(ProtocolError::DuplicateRegistration(key.to_string()));
        }
        debug!(%key, "Codec registered");
        self.entries.insert(key, codec);
        Ok(())
    }

    /// Add or replace a codec, returning the replaced one.
    pub fn register_override(&mut self, key: K, codec: Arc<C>) -> Option<Arc<C>> {
        let previous = self.entries.insert(key, codec);
        if previous.is_some() {
            warn!(%key, "Codec registration overridden");
        }
        previous
    }

    pub fn build(self) -> CodecRegistry<K, C> {
        CodecRegistry {
            entries: Arc::new(self.entries),
        }
    }
}

/// Published registry that accepts extensions after start-up.
pub struct SharedRegistry<K, C: ?Sized> {
    current: RwLock<CodecRegistry<K, C>>,
}

impl<K: RegistryKey, C: ?Sized> SharedRegistry<K, C> {
    pub fn new(initial: CodecRegistry<K, C>) -> Self {
        Self {
            current: RwLock::new(initial),
        }
    }

    /// Current snapshot; later registrations do not affect it.
    pub fn snapshot(&self) -> Result<CodecRegistry<K, C>> {
        let current = self.current.read().map_err(|_| {
            ProtocolError::Custom(constants::ERR_REGISTRY_READ_LOCK.to_string())
        })?;
        Ok(current.clone())
    }

    pub fn lookup(&self, key: &K) -> Result<Arc<C>> {
        self.snapshot()?.lookup(key)
    }

    /// Publish a copy of the registry with `codec` added under `key`.
    pub fn register(&self, key: K, codec: Arc<C>) -> Result<()> {
        self.publish(|builder| builder.register(key, codec))
    }

    /// Publish a copy of the registry with `codec` added or replacing `key`.
    pub fn register_override(&self, key: K, codec: Arc<C>) -> Result<Option<Arc<C>>> {
        self.publish(|builder| Ok(builder.register_override(key, codec)))
    }

    fn publish<T>(
        &self,
        change: impl FnOnce(&mut CodecRegistryBuilder<K, C>) -> Result<T>,
    ) -> Result<T> {
        let mut current = self.current.write().map_err(|_| {
            ProtocolError::Custom(constants::ERR_REGISTRY_WRITE_LOCK.to_string())
        })?;

        let mut builder = current.to_builder();
        let outcome = change(&mut builder)?;
        *current = builder.build();
        Ok(outcome)
    }
}

/// Serializers keyed by `(version, kind)`.
pub type SerializerRegistry = CodecRegistry<MessageTypeKey, dyn MessageSerializer>;
pub type SerializerRegistryBuilder = CodecRegistryBuilder<MessageTypeKey, dyn MessageSerializer>;
pub type SharedSerializerRegistry = SharedRegistry<MessageTypeKey, dyn MessageSerializer>;

/// Deserializers keyed by `(version, code, kind)`.
pub type DeserializerRegistry = CodecRegistry<MessageCodeKey, dyn MessageDeserializer>;
pub type DeserializerRegistryBuilder =
    CodecRegistryBuilder<MessageCodeKey, dyn MessageDeserializer>;
pub type SharedDeserializerRegistry = SharedRegistry<MessageCodeKey, dyn MessageDeserializer>;

impl SerializerRegistry {
    /// Registry holding every built-in serializer.
    pub fn builtin() -> Self {
        let mut builder = SerializerRegistryBuilder::new();
        crate::protocol::factories::register_serializers(&mut builder);
        builder.build()
    }
}

impl DeserializerRegistry {
    /// Registry holding every built-in deserializer.
    pub fn builtin() -> Self {
        let mut builder = DeserializerRegistryBuilder::new();
        crate::protocol::factories::register_deserializers(&mut builder);
        builder.build()
    }
}
