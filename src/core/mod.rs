//! # Core Framing Components
//!
//! The OpenFlow common header and the stream codec built on it.
//!
//! ## Components
//! - **Header**: header constants, `write_header` and `patch_length`
//! - **Codec**: Tokio codec splitting a byte stream into frames
//!
//! ## Wire Format
//! ```text
//! [version:1] [type:1] [length:2] [xid:4] [body: length - 8]
//! ```
//!
//! ## Limits
//! - Maximum frame size: 65535 bytes (16-bit length field)
//! - Declared lengths below the header size are rejected before buffering

pub mod codec;
pub mod header;
