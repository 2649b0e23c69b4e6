//! Messages whose body is empty or a single opaque blob: hello, echo,
//! features-request and the barrier pair.

use bytes::{Bytes, BytesMut};

use super::{read_xid, unexpected_body};
use crate::core::header::{patch_length, write_header};
use crate::error::{ProtocolError, Result};
use crate::protocol::kind::{MessageCodeKey, MessageKind};
use crate::protocol::message::{Message, MessageBody};
use crate::protocol::registry::{MessageDeserializer, MessageSerializer};

#[derive(Debug, Clone, Copy)]
pub struct SimpleSerializer {
    pub kind: MessageKind,
    pub code: u8,
}

impl MessageSerializer for SimpleSerializer {
    fn serialize(&self, message: &Message, out: &mut BytesMut) -> Result<()> {
        let payload: &[u8] = match (&message.body, self.kind) {
            (MessageBody::Hello { elements }, MessageKind::Hello) => elements,
            (MessageBody::EchoRequest { data }, MessageKind::EchoRequest) => data,
            (MessageBody::EchoReply { data }, MessageKind::EchoReply) => data,
            (MessageBody::FeaturesRequest, MessageKind::FeaturesRequest)
            | (MessageBody::BarrierRequest, MessageKind::BarrierRequest)
            | (MessageBody::BarrierReply, MessageKind::BarrierReply) => &[],
            _ => return Err(unexpected_body(self.kind, message)),
        };

        let start = write_header(self.code, message.version, message.xid, out);
        out.extend_from_slice(payload);
        patch_length(out, start)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SimpleDeserializer {
    pub kind: MessageKind,
}

impl MessageDeserializer for SimpleDeserializer {
    fn deserialize(&self, key: &MessageCodeKey, buf: &mut Bytes) -> Result<Message> {
        let xid = read_xid(buf)?;
        let rest = buf.split_to(buf.len());

        let body = match self.kind {
            MessageKind::Hello => MessageBody::Hello { elements: rest },
            MessageKind::EchoRequest => MessageBody::EchoRequest { data: rest },
            MessageKind::EchoReply => MessageBody::EchoReply { data: rest },
            MessageKind::FeaturesRequest
            | MessageKind::BarrierRequest
            | MessageKind::BarrierReply => {
                if !rest.is_empty() {
                    return Err(ProtocolError::MalformedFrame(format!(
                        "{} carries {} unexpected body bytes",
                        self.kind,
                        rest.len()
                    )));
                }
                match self.kind {
                    MessageKind::FeaturesRequest => MessageBody::FeaturesRequest,
                    MessageKind::BarrierRequest => MessageBody::BarrierRequest,
                    _ => MessageBody::BarrierReply,
                }
            }
            other => {
                return Err(ProtocolError::Custom(format!(
                    "{other} has no empty-body decoder"
                )))
            }
        };

        Ok(Message::new(key.version, xid, body))
    }
}
