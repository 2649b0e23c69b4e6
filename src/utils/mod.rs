//! # Utility Modules
//!
//! Supporting utilities for flag encoding, addresses, logging and metrics.
//!
//! ## Components
//! - **Bitmask**: positional and explicit-position flag encoding
//! - **Address**: hardware and IPv4 addresses in raw wire form
//! - **Logging**: tracing subscriber set-up
//! - **Metrics**: thread-safe connection and message counters

pub mod address;
pub mod bitmask;
pub mod logging;
pub mod metrics;

pub use address::MacAddress;
pub use bitmask::{fill_bit_mask, fill_bit_mask_from_map, BitMaskReader};
