//! Port-modification messages.
//!
//! OpenFlow 1.3 (type 16, 40 bytes):
//! ```text
//! [header:8] [port_no:4] [pad:4] [hw_addr:6] [pad:2]
//! [config:4] [mask:4] [advertise:4] [pad:4]
//! ```
//!
//! OpenFlow 1.0 (type 15, 32 bytes):
//! ```text
//! [header:8] [port_no:2] [hw_addr:6] [config:4] [mask:4] [advertise:4] [pad:4]
//! ```

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::port::{decode_config, decode_features, encode_config, encode_features};
use super::{ensure_remaining, read_xid, skip_padding, unexpected_body};
use crate::core::header::{patch_length, write_header, write_zeros};
use crate::error::{ProtocolError, Result};
use crate::protocol::kind::{MessageCodeKey, MessageKind, OFP_VERSION_1_0};
use crate::protocol::message::{Message, MessageBody, PortMod};
use crate::protocol::registry::{MessageDeserializer, MessageSerializer};
use crate::utils::address::{MacAddress, MAC_ADDRESS_LENGTH};

const PADDING_V13_AFTER_PORT: usize = 4;
const PADDING_V13_AFTER_HW_ADDR: usize = 2;
const PADDING_TRAILER: usize = 4;

/// Body length after the transaction id.
const BODY_V13: usize = 4 + PADDING_V13_AFTER_PORT + MAC_ADDRESS_LENGTH + PADDING_V13_AFTER_HW_ADDR + 12 + PADDING_TRAILER;
const BODY_V10: usize = 2 + MAC_ADDRESS_LENGTH + 12 + PADDING_TRAILER;

#[derive(Debug, Clone, Copy)]
pub struct PortModSerializer {
    pub code: u8,
}

impl MessageSerializer for PortModSerializer {
    fn serialize(&self, message: &Message, out: &mut BytesMut) -> Result<()> {
        let MessageBody::PortMod(port_mod) = &message.body else {
            return Err(unexpected_body(MessageKind::PortMod, message));
        };
        let version = message.version;

        // Encode the masks first so a bad value leaves `out` untouched.
        let config = encode_config(version, &port_mod.config)?;
        let mask = encode_config(version, &port_mod.mask)?;
        let advertise = encode_features(version, &port_mod.advertise)?;

        if version == OFP_VERSION_1_0 {
            let port_no = u16::try_from(port_mod.port_no).map_err(|_| {
                ProtocolError::EncodingError(format!(
                    "port number {} does not fit version 0x01",
                    port_mod.port_no
                ))
            })?;
            let start = write_header(self.code, version, message.xid, out);
            out.put_u16(port_no);
            out.put_slice(&port_mod.hw_address.octets());
            out.put_u32(config);
            out.put_u32(mask);
            out.put_u32(advertise);
            write_zeros(out, PADDING_TRAILER);
            return patch_length(out, start);
        }

        let start = write_header(self.code, version, message.xid, out);
        out.put_u32(port_mod.port_no);
        write_zeros(out, PADDING_V13_AFTER_PORT);
        out.put_slice(&port_mod.hw_address.octets());
        write_zeros(out, PADDING_V13_AFTER_HW_ADDR);
        out.put_u32(config);
        out.put_u32(mask);
        out.put_u32(advertise);
        write_zeros(out, PADDING_TRAILER);
        patch_length(out, start)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PortModDeserializer;

impl MessageDeserializer for PortModDeserializer {
    fn deserialize(&self, key: &MessageCodeKey, buf: &mut Bytes) -> Result<Message> {
        let version = key.version;
        let xid = read_xid(buf)?;

        let port_no = if version == OFP_VERSION_1_0 {
            ensure_remaining(buf, BODY_V10, "port-mod body")?;
            u32::from(buf.get_u16())
        } else {
            ensure_remaining(buf, BODY_V13, "port-mod body")?;
            let port_no = buf.get_u32();
            skip_padding(buf, PADDING_V13_AFTER_PORT)?;
            port_no
        };

        let hw_address = MacAddress::from_slice(&buf.split_to(MAC_ADDRESS_LENGTH))?;
        if version != OFP_VERSION_1_0 {
            skip_padding(buf, PADDING_V13_AFTER_HW_ADDR)?;
        }
        let config = decode_config(version, buf.get_u32());
        let mask = decode_config(version, buf.get_u32());
        let advertise = decode_features(version, buf.get_u32());
        skip_padding(buf, PADDING_TRAILER)?;

        Ok(Message::new(
            version,
            xid,
            MessageBody::PortMod(PortMod {
                port_no,
                hw_address,
                config,
                mask,
                advertise,
            }),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::kind::OFP_VERSION_1_3;
    use crate::protocol::message::{PortConfig, PortFeatures};

    fn sample(version: u8) -> Message {
        Message::new(
            version,
            0x0102_0304,
            MessageBody::PortMod(PortMod {
                port_no: 5,
                hw_address: MacAddress::new([0x08, 0x00, 0x27, 0x00, 0xb0, 0xeb]),
                config: PortConfig::default(),
                mask: PortConfig {
                    port_down: true,
                    ..PortConfig::default()
                },
                advertise: PortFeatures {
                    rate_10gb_fd: true,
                    ..PortFeatures::default()
                },
            }),
        )
    }

    #[test]
    fn test_v13_layout() {
        let mut out = BytesMut::new();
        PortModSerializer { code: 16 }
            .serialize(&sample(OFP_VERSION_1_3), &mut out)
            .unwrap();

        let expected: Vec<u8> = [
            &[0x04, 16, 0, 40, 1, 2, 3, 4][..],
            &[0, 0, 0, 5],
            &[0, 0, 0, 0],
            &[0x08, 0x00, 0x27, 0x00, 0xb0, 0xeb],
            &[0, 0],
            &[0, 0, 0, 0],
            &[0, 0, 0, 1],
            &[0, 0, 0, 0x40],
            &[0, 0, 0, 0],
        ]
        .concat();
        assert_eq!(&out[..], &expected[..]);
    }

    #[test]
    fn test_v10_layout() {
        let mut out = BytesMut::new();
        PortModSerializer { code: 15 }
            .serialize(&sample(OFP_VERSION_1_0), &mut out)
            .unwrap();

        assert_eq!(out.len(), 32);
        assert_eq!(&out[..4], &[0x01, 15, 0, 32]);
        assert_eq!(&out[8..10], &[0, 5]);
        assert_eq!(&out[10..16], &[0x08, 0x00, 0x27, 0x00, 0xb0, 0xeb]);
        assert_eq!(&out[24..28], &[0, 0, 0, 0x40]);
    }

    #[test]
    fn test_v10_port_number_range() {
        let mut message = sample(OFP_VERSION_1_0);
        if let MessageBody::PortMod(port_mod) = &mut message.body {
            port_mod.port_no = 0x1_0000;
        }
        let mut out = BytesMut::new();
        let err = PortModSerializer { code: 15 }
            .serialize(&message, &mut out)
            .unwrap_err();
        assert!(matches!(err, ProtocolError::EncodingError(_)));
        assert!(out.is_empty());
    }

    #[test]
    fn test_roundtrip_both_versions() {
        for (version, code) in [(OFP_VERSION_1_0, 15), (OFP_VERSION_1_3, 16)] {
            let message = sample(version);
            let mut out = BytesMut::new();
            PortModSerializer { code }.serialize(&message, &mut out).unwrap();

            let mut buf = out.freeze().slice(4..);
            let key = MessageCodeKey::new(version, code, MessageKind::PortMod);
            let decoded = PortModDeserializer.deserialize(&key, &mut buf).unwrap();
            assert_eq!(decoded, message);
            assert!(buf.is_empty());
        }
    }

    #[test]
    fn test_truncated_body() {
        let key = MessageCodeKey::new(OFP_VERSION_1_3, 16, MessageKind::PortMod);
        let mut buf = Bytes::from_static(&[0, 0, 0, 1, 0, 0, 0, 5, 0, 0]);
        let err = PortModDeserializer.deserialize(&key, &mut buf).unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn test_wrong_body_rejected() {
        let message = Message::new(OFP_VERSION_1_3, 1, MessageBody::BarrierRequest);
        let mut out = BytesMut::new();
        assert!(PortModSerializer { code: 16 }.serialize(&message, &mut out).is_err());
    }
}
