//! # Protocol Layer
//!
//! Typed messages, codec registries and the factories that dispatch through
//! them.
//!
//! ## Components
//! - **Message / Kind**: typed data model and the keys codecs are registered under
//! - **Type table**: static `(version, type code) -> kind` mapping
//! - **Registry**: frozen serializer/deserializer tables plus a publish cell for extensions
//! - **Factories**: serialization and deserialization dispatch, built-in codecs
//!
//! ## Wire Format
//! ```text
//! [version:1] [type:1] [length:2 BE] [xid:4 BE] [body]
//! ```

pub mod deserialization;
pub mod factories;
pub mod kind;
pub mod message;
pub mod registry;
pub mod serialization;
pub mod type_table;


pub use deserialization::DeserializationFactory;
pub use kind::{MessageCodeKey, MessageKind, MessageTypeKey, OFP_VERSION_1_0, OFP_VERSION_1_3};
pub use message::{Message, MessageBody};
pub use serialization::SerializationFactory;
