//! Vendor / experimenter messages.
//!
//! 1.0: `[vendor:4] [data...]`
//! 1.3: `[experimenter:4] [exp_type:4] [data...]`

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::{ensure_remaining, read_xid, unexpected_body};
use crate::core::header::{patch_length, write_header};
use crate::error::{ProtocolError, Result};
use crate::protocol::kind::{MessageCodeKey, MessageKind, OFP_VERSION_1_0};
use crate::protocol::message::{ExperimenterMessage, Message, MessageBody};
use crate::protocol::registry::{MessageDeserializer, MessageSerializer};

#[derive(Debug, Clone, Copy)]
pub struct ExperimenterSerializer {
    pub code: u8,
}

impl MessageSerializer for ExperimenterSerializer {
    fn serialize(&self, message: &Message, out: &mut BytesMut) -> Result<()> {
        let MessageBody::Experimenter(experimenter) = &message.body else {
            return Err(unexpected_body(MessageKind::Experimenter, message));
        };
        let v10 = message.version == OFP_VERSION_1_0;
        if v10 && experimenter.exp_type != 0 {
            return Err(ProtocolError::EncodingError(
                "vendor messages in version 0x01 have no experimenter type".into(),
            ));
        }

        let start = write_header(self.code, message.version, message.xid, out);
        out.put_u32(experimenter.experimenter);
        if !v10 {
            out.put_u32(experimenter.exp_type);
        }
        out.put_slice(&experimenter.data);
        patch_length(out, start)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ExperimenterDeserializer;

impl MessageDeserializer for ExperimenterDeserializer {
    fn deserialize(&self, key: &MessageCodeKey, buf: &mut Bytes) -> Result<Message> {
        let xid = read_xid(buf)?;
        let v10 = key.version == OFP_VERSION_1_0;

        ensure_remaining(buf, if v10 { 4 } else { 8 }, "experimenter id")?;
        let experimenter = buf.get_u32();
        let exp_type = if v10 { 0 } else { buf.get_u32() };
        let data = buf.split_to(buf.len());

        Ok(Message::new(
            key.version,
            xid,
            MessageBody::Experimenter(ExperimenterMessage {
                experimenter,
                exp_type,
                data,
            }),
        ))
    }
}
