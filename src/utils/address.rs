//! Typed address fields and their raw wire form.

use std::fmt;
use std::str::FromStr;

use crate::error::{ProtocolError, Result};

/// Length of a hardware (MAC) address on the wire.
pub const MAC_ADDRESS_LENGTH: usize = 6;

/// Ethernet hardware address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MacAddress(pub [u8; MAC_ADDRESS_LENGTH]);

impl MacAddress {
    pub const fn new(octets: [u8; MAC_ADDRESS_LENGTH]) -> Self {
        Self(octets)
    }

    pub fn octets(&self) -> [u8; MAC_ADDRESS_LENGTH] {
        self.0
    }

    /// Build from raw bytes; the slice must be exactly six bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let octets: [u8; MAC_ADDRESS_LENGTH] = bytes.try_into().map_err(|_| {
            ProtocolError::EncodingError(format!(
                "hardware address needs {MAC_ADDRESS_LENGTH} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(octets))
    }
}

impl FromStr for MacAddress {
    type Err = ProtocolError;

    /// Parses `aa:bb:cc:dd:ee:ff` (`-` also accepted as separator).
    fn from_str(s: &str) -> Result<Self> {
        mac_address_to_bytes(s).map(Self)
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

/// Convert a textual hardware address into its six raw bytes.
///
/// Fails with `EncodingError` on a wrong field count or a field that is not a
/// one- or two-digit hex number.
pub fn mac_address_to_bytes(text: &str) -> Result<[u8; MAC_ADDRESS_LENGTH]> {
    let fields: Vec<&str> = text.split([':', '-']).collect();
    if fields.len() != MAC_ADDRESS_LENGTH {
        return Err(ProtocolError::EncodingError(format!(
            "hardware address '{text}' has {} fields, expected {MAC_ADDRESS_LENGTH}",
            fields.len()
        )));
    }

    let mut octets = [0u8; MAC_ADDRESS_LENGTH];
    for (octet, field) in octets.iter_mut().zip(&fields) {
        if field.is_empty() || field.len() > 2 {
            return Err(ProtocolError::EncodingError(format!(
                "hardware address field '{field}' in '{text}' is not one octet"
            )));
        }
        // from_str_radix alone would take a leading '+'
        if !field.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ProtocolError::EncodingError(format!(
                "hardware address field '{field}' in '{text}' is not hex"
            )));
        }
        *octet = u8::from_str_radix(field, 16).map_err(|_| {
            ProtocolError::EncodingError(format!(
                "hardware address field '{field}' in '{text}' is not hex"
            ))
        })?;
    }
    Ok(octets)
}

/// Convert a dotted-quad IPv4 address into its four raw bytes.
pub fn ipv4_address_to_bytes(text: &str) -> Result<[u8; 4]> {
    text.parse::<std::net::Ipv4Addr>()
        .map(|addr| addr.octets())
        .map_err(|_| ProtocolError::EncodingError(format!("'{text}' is not an IPv4 address")))
}
