//! # OpenFlow Protocol
//!
//! Southbound protocol engine for OpenFlow switches: extensible wire codecs
//! and the lifecycle of switch connections.
//!
//! ## Modules
//! - [`core`]: common header helpers and the stream frame codec
//! - [`protocol`]: typed messages, codec registries, serialization factories
//! - [`service`]: switch connection provider, accept loop and per-switch tasks
//! - [`transport`]: TLS acceptor set-up
//! - [`config`]: TOML/env configuration and validation
//! - [`utils`]: bitmasks, addresses, logging and metrics
//! - [`error`]: the [`ProtocolError`](error::ProtocolError) taxonomy
//!
//! ## Codec example
//! ```rust
//! use bytes::BytesMut;
//! use openflow_protocol::protocol::{
//!     DeserializationFactory, Message, MessageBody, SerializationFactory, OFP_VERSION_1_3,
//! };
//!
//! let serializer = SerializationFactory::builtin();
//! let deserializer = DeserializationFactory::builtin();
//!
//! let hello = Message::new(OFP_VERSION_1_3, 7, MessageBody::Hello { elements: Default::default() });
//! let mut out = BytesMut::new();
//! serializer.serialize(&hello, &mut out).unwrap();
//! assert_eq!(&out[..], &[0x04, 0, 0, 8, 0, 0, 0, 7]);
//!
//! // The frame codec strips the version byte before decoding.
//! let mut frame = out.freeze().slice(1..);
//! assert_eq!(deserializer.deserialize(&mut frame, OFP_VERSION_1_3).unwrap(), hello);
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

pub mod config;
pub mod core;
pub mod error;
pub mod protocol;
pub mod service;
pub mod transport;
pub mod utils;

pub use error::{ProtocolError, Result};
