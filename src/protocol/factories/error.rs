//! Error messages: `[type:2] [code:2] [data...]`, identical in 1.0 and 1.3.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::{ensure_remaining, read_xid, unexpected_body};
use crate::core::header::{patch_length, write_header};
use crate::error::Result;
use crate::protocol::kind::{MessageCodeKey, MessageKind};
use crate::protocol::message::{ErrorMessage, Message, MessageBody};
use crate::protocol::registry::{MessageDeserializer, MessageSerializer};

#[derive(Debug, Clone, Copy)]
pub struct ErrorSerializer {
    pub code: u8,
}

impl MessageSerializer for ErrorSerializer {
    fn serialize(&self, message: &Message, out: &mut BytesMut) -> Result<()> {
        let MessageBody::Error(error) = &message.body else {
            return Err(unexpected_body(MessageKind::Error, message));
        };
        let start = write_header(self.code, message.version, message.xid, out);
        out.put_u16(error.error_type);
        out.put_u16(error.code);
        out.put_slice(&error.data);
        patch_length(out, start)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorDeserializer;

impl MessageDeserializer for ErrorDeserializer {
    fn deserialize(&self, key: &MessageCodeKey, buf: &mut Bytes) -> Result<Message> {
        let xid = read_xid(buf)?;
        ensure_remaining(buf, 4, "error type and code")?;
        let error_type = buf.get_u16();
        let code = buf.get_u16();
        let data = buf.split_to(buf.len());
        Ok(Message::new(
            key.version,
            xid,
            MessageBody::Error(ErrorMessage {
                error_type,
                code,
                data,
            }),
        ))
    }
}
