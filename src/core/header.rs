//! # Common Header
//!
//! Every OpenFlow frame starts with the same eight bytes:
//!
//! ```text
//! [version:1] [type:1] [length:2 BE] [xid:4 BE] [body: length - 8]
//! ```
//!
//! `length` covers the whole frame, header included. Serializers write the
//! header with a placeholder length, write the body, then patch the length
//! once the body size is known.

use bytes::{BufMut, BytesMut};

use crate::error::{constants, ProtocolError, Result};

/// Size of the common header in bytes.
pub const OFHEADER_SIZE: usize = 8;

/// Offset of the 2-byte length field from the start of a frame.
pub const LENGTH_FIELD_OFFSET: usize = 2;

/// Placeholder written before the body length is known.
pub const EMPTY_LENGTH: u16 = 0;

/// Largest frame the 16-bit length field can describe.
pub const MAX_FRAME_SIZE: usize = u16::MAX as usize;

/// Decoded common header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub version: u8,
    pub type_code: u8,
    pub length: u16,
    pub xid: u32,
}

impl FrameHeader {
    /// Parse the header at the start of `bytes` without consuming anything.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Err(ProtocolError::MalformedFrame(
                constants::ERR_EMPTY_FRAME.to_string(),
            ));
        }
        if bytes.len() < OFHEADER_SIZE {
            return Err(ProtocolError::MalformedFrame(format!(
                "{}: {} of {OFHEADER_SIZE} bytes",
                constants::ERR_TRUNCATED_HEADER,
                bytes.len()
            )));
        }

        let header = Self {
            version: bytes[0],
            type_code: bytes[1],
            length: u16::from_be_bytes([bytes[2], bytes[3]]),
            xid: u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        };

        if (header.length as usize) < OFHEADER_SIZE {
            return Err(ProtocolError::MalformedFrame(format!(
                "declared length {} is shorter than the {OFHEADER_SIZE}-byte header",
                header.length
            )));
        }
        Ok(header)
    }

    /// Body size implied by the declared length.
    pub fn body_len(&self) -> usize {
        self.length as usize - OFHEADER_SIZE
    }
}

/// Write a common header with a placeholder length.
///
/// Returns the offset the header starts at, to be handed to [`patch_length`]
/// after the body has been written.
pub fn write_header(type_code: u8, version: u8, xid: u32, out: &mut BytesMut) -> usize {
    let start = out.len();
    out.reserve(OFHEADER_SIZE);
    out.put_u8(version);
    out.put_u8(type_code);
    out.put_u16(EMPTY_LENGTH);
    out.put_u32(xid);
    start
}

/// Overwrite the length field of the frame starting at `header_start` with the
/// number of bytes written since.
///
/// Must run exactly once per frame, after the whole body is written. Fails with
/// `EncodingError` if the frame does not fit the 16-bit length field.
pub fn patch_length(out: &mut BytesMut, header_start: usize) -> Result<()> {
    let frame_len = out.len().checked_sub(header_start).ok_or_else(|| {
        ProtocolError::EncodingError(format!(
            "header offset {header_start} is past the end of the buffer"
        ))
    })?;
    if frame_len < OFHEADER_SIZE {
        return Err(ProtocolError::EncodingError(format!(
            "frame at offset {header_start} has no complete header"
        )));
    }
    let length = u16::try_from(frame_len).map_err(|_| {
        ProtocolError::EncodingError(format!(
            "frame of {frame_len} bytes exceeds maximum {MAX_FRAME_SIZE}"
        ))
    })?;

    let at = header_start + LENGTH_FIELD_OFFSET;
    out[at..at + 2].copy_from_slice(&length.to_be_bytes());
    Ok(())
}

/// Append `count` zero bytes.
#[inline]
pub fn write_zeros(out: &mut BytesMut, count: usize) {
    out.put_bytes(0, count);
}
