//! Port-status messages: `[reason:1] [pad:7] [port description]`.
//!
//! Port description, 1.0 (48 bytes):
//! ```text
//! [port_no:2] [hw_addr:6] [name:16] [config:4] [state:4]
//! [curr:4] [advertised:4] [supported:4] [peer:4]
//! ```
//!
//! Port description, 1.3 (64 bytes):
//! ```text
//! [port_no:4] [pad:4] [hw_addr:6] [pad:2] [name:16] [config:4] [state:4]
//! [curr:4] [advertised:4] [supported:4] [peer:4] [curr_speed:4] [max_speed:4]
//! ```

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::port::{decode_config, decode_features, encode_config, encode_features};
use super::{ensure_remaining, read_xid, skip_padding, unexpected_body};
use crate::core::header::{patch_length, write_header, write_zeros};
use crate::error::{ProtocolError, Result};
use crate::protocol::kind::{MessageCodeKey, MessageKind, OFP_VERSION_1_0};
use crate::protocol::message::{Message, MessageBody, PortDescription, PortReason, PortStatus};
use crate::protocol::registry::{MessageDeserializer, MessageSerializer};
use crate::utils::address::{MacAddress, MAC_ADDRESS_LENGTH};

/// Fixed width of the NUL-padded port name.
pub const PORT_NAME_LENGTH: usize = 16;

const PADDING_AFTER_REASON: usize = 7;
const PORT_DESC_V10: usize = 48;
const PORT_DESC_V13: usize = 64;

#[derive(Debug, Clone, Copy)]
pub struct PortStatusSerializer {
    pub code: u8,
}

impl MessageSerializer for PortStatusSerializer {
    fn serialize(&self, message: &Message, out: &mut BytesMut) -> Result<()> {
        let MessageBody::PortStatus(status) = &message.body else {
            return Err(unexpected_body(MessageKind::PortStatus, message));
        };

        let mut port = BytesMut::with_capacity(PORT_DESC_V13);
        write_port_description(message.version, &status.port, &mut port)?;

        let start = write_header(self.code, message.version, message.xid, out);
        out.put_u8(status.reason.to_wire());
        write_zeros(out, PADDING_AFTER_REASON);
        out.put_slice(&port);
        patch_length(out, start)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PortStatusDeserializer;

impl MessageDeserializer for PortStatusDeserializer {
    fn deserialize(&self, key: &MessageCodeKey, buf: &mut Bytes) -> Result<Message> {
        let xid = read_xid(buf)?;
        ensure_remaining(buf, 1 + PADDING_AFTER_REASON, "port-status reason")?;
        let raw_reason = buf.get_u8();
        let reason = PortReason::from_wire(raw_reason).ok_or_else(|| {
            ProtocolError::MalformedFrame(format!("unknown port-status reason {raw_reason}"))
        })?;
        skip_padding(buf, PADDING_AFTER_REASON)?;
        let port = read_port_description(key.version, buf)?;

        Ok(Message::new(
            key.version,
            xid,
            MessageBody::PortStatus(PortStatus { reason, port }),
        ))
    }
}

fn write_port_description(version: u8, port: &PortDescription, out: &mut BytesMut) -> Result<()> {
    let name = port.name.as_bytes();
    if name.contains(&0) {
        return Err(ProtocolError::EncodingError(format!(
            "port name {:?} contains a NUL byte",
            port.name
        )));
    }
    if name.len() >= PORT_NAME_LENGTH {
        return Err(ProtocolError::EncodingError(format!(
            "port name '{}' longer than {} bytes",
            port.name,
            PORT_NAME_LENGTH - 1
        )));
    }
    let config = encode_config(version, &port.config)?;
    let features = [
        encode_features(version, &port.current)?,
        encode_features(version, &port.advertised)?,
        encode_features(version, &port.supported)?,
        encode_features(version, &port.peer)?,
    ];

    if version == OFP_VERSION_1_0 {
        let port_no = u16::try_from(port.port_no).map_err(|_| {
            ProtocolError::EncodingError(format!(
                "port number {} does not fit version 0x01",
                port.port_no
            ))
        })?;
        if port.curr_speed != 0 || port.max_speed != 0 {
            return Err(ProtocolError::EncodingError(
                "port speeds do not exist in version 0x01".into(),
            ));
        }
        out.put_u16(port_no);
        out.put_slice(&port.hw_address.octets());
    } else {
        out.put_u32(port.port_no);
        write_zeros(out, 4);
        out.put_slice(&port.hw_address.octets());
        write_zeros(out, 2);
    }

    out.put_slice(name);
    write_zeros(out, PORT_NAME_LENGTH - name.len());
    out.put_u32(config);
    out.put_u32(port.state);
    for mask in features {
        out.put_u32(mask);
    }
    if version != OFP_VERSION_1_0 {
        out.put_u32(port.curr_speed);
        out.put_u32(port.max_speed);
    }
    Ok(())
}

fn read_port_description(version: u8, buf: &mut Bytes) -> Result<PortDescription> {
    let v10 = version == OFP_VERSION_1_0;
    ensure_remaining(
        buf,
        if v10 { PORT_DESC_V10 } else { PORT_DESC_V13 },
        "port description",
    )?;

    let port_no = if v10 {
        u32::from(buf.get_u16())
    } else {
        let port_no = buf.get_u32();
        buf.advance(4);
        port_no
    };
    let hw_address = MacAddress::from_slice(&buf.split_to(MAC_ADDRESS_LENGTH))?;
    if !v10 {
        buf.advance(2);
    }

    let raw_name = buf.split_to(PORT_NAME_LENGTH);
    let name_end = raw_name.iter().position(|&b| b == 0).unwrap_or(PORT_NAME_LENGTH);
    let name = String::from_utf8_lossy(&raw_name[..name_end]).into_owned();

    let config = decode_config(version, buf.get_u32());
    let state = buf.get_u32();
    let current = decode_features(version, buf.get_u32());
    let advertised = decode_features(version, buf.get_u32());
    let supported = decode_features(version, buf.get_u32());
    let peer = decode_features(version, buf.get_u32());
    let (curr_speed, max_speed) = if v10 {
        (0, 0)
    } else {
        (buf.get_u32(), buf.get_u32())
    };

    Ok(PortDescription {
        port_no,
        hw_address,
        name,
        config,
        state,
        current,
        advertised,
        supported,
        peer,
        curr_speed,
        max_speed,
    })
}
