//! # Frame Codec
//!
//! Splits a switch byte stream into complete OpenFlow frames for use with
//! `tokio_util::codec::Framed`.
//!
//! The decoder only checks what it needs to frame: the declared length must
//! cover at least the common header. It then strips the version byte and hands
//! the rest (type code onward) to the deserialization factory together with the
//! version, so the factory never sees a partial frame.
//!
//! The encoder writes already-serialized frames as-is.

use bytes::{Buf, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::trace;

use crate::core::header::{FrameHeader, OFHEADER_SIZE};
use crate::error::{ProtocolError, Result};

/// One complete frame read off the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Version byte from the common header.
    pub version: u8,
    /// Frame bytes after the version byte: `[type][length][xid][body]`.
    pub payload: Bytes,
}

impl Frame {
    /// Total size on the wire, version byte included.
    pub fn wire_len(&self) -> usize {
        self.payload.len() + 1
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct OfFrameCodec;

impl Decoder for OfFrameCodec {
    type Item = Frame;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        if src.len() < OFHEADER_SIZE {
            src.reserve(OFHEADER_SIZE - src.len());
            return Ok(None);
        }

        let header = FrameHeader::parse(&src[..OFHEADER_SIZE])?;
        let frame_len = header.length as usize;

        if src.len() < frame_len {
            src.reserve(frame_len - src.len());
            return Ok(None);
        }

        trace!(
            version = header.version,
            type_code = header.type_code,
            length = frame_len,
            "Frame complete"
        );

        let mut frame = src.split_to(frame_len);
        frame.advance(1);
        Ok(Some(Frame {
            version: header.version,
            payload: frame.freeze(),
        }))
    }
}

impl Encoder<Bytes> for OfFrameCodec {
    type Error = ProtocolError;

    fn encode(&mut self, frame: Bytes, dst: &mut BytesMut) -> Result<()> {
        dst.extend_from_slice(&frame);
        Ok(())
    }
}
