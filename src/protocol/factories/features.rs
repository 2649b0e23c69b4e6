//! Features-reply messages.
//!
//! 1.0: `[datapath_id:8] [n_buffers:4] [n_tables:1] [pad:3] [capabilities:4] [actions:4] [ports...]`
//! 1.3: `[datapath_id:8] [n_buffers:4] [n_tables:1] [auxiliary_id:1] [pad:2] [capabilities:4] [reserved:4]`

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::{ensure_remaining, read_xid, skip_padding, unexpected_body};
use crate::core::header::{patch_length, write_header, write_zeros};
use crate::error::{ProtocolError, Result};
use crate::protocol::kind::{MessageCodeKey, MessageKind, OFP_VERSION_1_0};
use crate::protocol::message::{FeaturesReply, Message, MessageBody};
use crate::protocol::registry::{MessageDeserializer, MessageSerializer};

const FIXED_BODY: usize = 24;

#[derive(Debug, Clone, Copy)]
pub struct FeaturesReplySerializer {
    pub code: u8,
}

impl MessageSerializer for FeaturesReplySerializer {
    fn serialize(&self, message: &Message, out: &mut BytesMut) -> Result<()> {
        let MessageBody::FeaturesReply(features) = &message.body else {
            return Err(unexpected_body(MessageKind::FeaturesReply, message));
        };
        let v10 = message.version == OFP_VERSION_1_0;
        if v10 && features.auxiliary_id != 0 {
            return Err(ProtocolError::EncodingError(
                "auxiliary connection id does not exist in version 0x01".into(),
            ));
        }
        if !v10 && !features.ports.is_empty() {
            return Err(ProtocolError::EncodingError(format!(
                "features-reply in version {:#04x} carries no port list",
                message.version
            )));
        }

        let start = write_header(self.code, message.version, message.xid, out);
        out.put_u64(features.datapath_id);
        out.put_u32(features.buffers);
        out.put_u8(features.tables);
        if v10 {
            write_zeros(out, 3);
        } else {
            out.put_u8(features.auxiliary_id);
            write_zeros(out, 2);
        }
        out.put_u32(features.capabilities);
        out.put_u32(features.reserved);
        out.put_slice(&features.ports);
        patch_length(out, start)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FeaturesReplyDeserializer;

impl MessageDeserializer for FeaturesReplyDeserializer {
    fn deserialize(&self, key: &MessageCodeKey, buf: &mut Bytes) -> Result<Message> {
        let xid = read_xid(buf)?;
        ensure_remaining(buf, FIXED_BODY, "features-reply body")?;
        let v10 = key.version == OFP_VERSION_1_0;

        let datapath_id = buf.get_u64();
        let buffers = buf.get_u32();
        let tables = buf.get_u8();
        let auxiliary_id = if v10 {
            skip_padding(buf, 3)?;
            0
        } else {
            let id = buf.get_u8();
            skip_padding(buf, 2)?;
            id
        };
        let capabilities = buf.get_u32();
        let reserved = buf.get_u32();
        let ports = if v10 {
            buf.split_to(buf.len())
        } else {
            Bytes::new()
        };

        Ok(Message::new(
            key.version,
            xid,
            MessageBody::FeaturesReply(FeaturesReply {
                datapath_id,
                buffers,
                tables,
                auxiliary_id,
                capabilities,
                reserved,
                ports,
            }),
        ))
    }
}
