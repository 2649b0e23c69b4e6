//! # Built-in Message Factories
//!
//! Encode/decode routines for every built-in message kind of every supported
//! version, plus [`register_serializers`] / [`register_deserializers`] which
//! populate fresh registries with them.
//!
//! Serializers follow one pattern (see [`port_mod`]): write the common header
//! with a placeholder length, write the body field by field, then patch the
//! length. Deserializers receive the buffer positioned at the transaction id
//! and check every read against the bytes actually present.

pub mod error;
pub mod experimenter;
pub mod features;
pub mod port;
pub mod port_mod;
pub mod port_status;
pub mod simple;

use std::sync::Arc;

use bytes::{Buf, Bytes, BytesMut};
use tracing::debug;

use crate::core::header::{patch_length, write_header};
use crate::error::{ProtocolError, Result};
use crate::protocol::kind::{
    MessageCodeKey, MessageKind, MessageTypeKey, SUPPORTED_VERSIONS,
};
use crate::protocol::message::{Message, MessageBody};
use crate::protocol::registry::{
    DeserializerRegistryBuilder, MessageDeserializer, MessageSerializer, SerializerRegistryBuilder,
};
use crate::protocol::type_table::TypeTable;

/// Register the built-in serializer of every `(version, kind)` pair.
pub fn register_serializers(builder: &mut SerializerRegistryBuilder) {
    let table = TypeTable::builtin();
    for version in SUPPORTED_VERSIONS {
        for kind in MessageKind::BUILTIN {
            let Some(code) = table.code_of(version, kind) else {
                continue;
            };
            builder.register_override(MessageTypeKey::new(version, kind), serializer_for(kind, code));
        }
    }
    debug!("Built-in serializers registered");
}

/// Register the built-in deserializer of every `(version, code, kind)` triple.
pub fn register_deserializers(builder: &mut DeserializerRegistryBuilder) {
    let table = TypeTable::builtin();
    for version in SUPPORTED_VERSIONS {
        for kind in MessageKind::BUILTIN {
            let Some(code) = table.code_of(version, kind) else {
                continue;
            };
            builder.register_override(
                MessageCodeKey::new(version, code, kind),
                deserializer_for(kind),
            );
        }
    }
    debug!("Built-in deserializers registered");
}

fn serializer_for(kind: MessageKind, code: u8) -> Arc<dyn MessageSerializer> {
    match kind {
        MessageKind::Error => Arc::new(error::ErrorSerializer { code }),
        MessageKind::Experimenter => Arc::new(experimenter::ExperimenterSerializer { code }),
        MessageKind::FeaturesReply => Arc::new(features::FeaturesReplySerializer { code }),
        MessageKind::PortStatus => Arc::new(port_status::PortStatusSerializer { code }),
        MessageKind::PortMod => Arc::new(port_mod::PortModSerializer { code }),
        other => Arc::new(simple::SimpleSerializer { kind: other, code }),
    }
}

fn deserializer_for(kind: MessageKind) -> Arc<dyn MessageDeserializer> {
    match kind {
        MessageKind::Error => Arc::new(error::ErrorDeserializer),
        MessageKind::Experimenter => Arc::new(experimenter::ExperimenterDeserializer),
        MessageKind::FeaturesReply => Arc::new(features::FeaturesReplyDeserializer),
        MessageKind::PortStatus => Arc::new(port_status::PortStatusDeserializer),
        MessageKind::PortMod => Arc::new(port_mod::PortModDeserializer),
        other => Arc::new(simple::SimpleDeserializer { kind: other }),
    }
}

/// Opaque codec for vendor messages outside the built-in set.
///
/// Serializes `MessageBody::Custom { code, payload }` as header + payload and
/// decodes any frame registered under `(version, code, Custom(code))` back to it.
#[derive(Debug, Clone, Copy, Default)]
pub struct CustomPayloadCodec;

impl MessageSerializer for CustomPayloadCodec {
    fn serialize(&self, message: &Message, out: &mut BytesMut) -> Result<()> {
        let MessageBody::Custom { code, payload } = &message.body else {
            return Err(unexpected_body(MessageKind::Custom(0), message));
        };
        let start = write_header(*code, message.version, message.xid, out);
        out.extend_from_slice(payload);
        patch_length(out, start)
    }
}

impl MessageDeserializer for CustomPayloadCodec {
    fn deserialize(&self, key: &MessageCodeKey, buf: &mut Bytes) -> Result<Message> {
        let xid = read_xid(buf)?;
        let payload = buf.split_to(buf.len());
        Ok(Message::new(
            key.version,
            xid,
            MessageBody::Custom {
                code: key.code,
                payload,
            },
        ))
    }
}

/// Fail with `MalformedFrame` unless `buf` still holds `needed` bytes.
pub(crate) fn ensure_remaining(buf: &Bytes, needed: usize, what: &str) -> Result<()> {
    if buf.remaining() < needed {
        return Err(ProtocolError::MalformedFrame(format!(
            "{what}: need {needed} bytes, {} left",
            buf.remaining()
        )));
    }
    Ok(())
}

pub(crate) fn read_xid(buf: &mut Bytes) -> Result<u32> {
    ensure_remaining(buf, 4, "transaction id")?;
    Ok(buf.get_u32())
}

pub(crate) fn skip_padding(buf: &mut Bytes, count: usize) -> Result<()> {
    ensure_remaining(buf, count, "padding")?;
    buf.advance(count);
    Ok(())
}

pub(crate) fn unexpected_body(expected: MessageKind, message: &Message) -> ProtocolError {
    ProtocolError::EncodingError(format!(
        "serializer for {expected} given a {} message",
        message.kind()
    ))
}
