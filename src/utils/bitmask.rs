//! # Bitmask Encoding
//!
//! OpenFlow packs groups of boolean flags into fixed-width integers. The bit a
//! flag occupies is part of the flag's protocol definition, so callers always
//! pass flags in definition order (positional form) or with explicit bit
//! positions (map form, for fields whose flags are non-contiguous).

use std::collections::BTreeMap;

use crate::error::{ProtocolError, Result};

/// Width of every bitmask field handled here.
pub const BITMASK_WIDTH: usize = u32::BITS as usize;

/// Build a bitmask where bit `offset + i` is set iff `flags[i]` is true.
///
/// `offset` is the bit the first flag lands on (usually 0).
pub fn fill_bit_mask(offset: usize, flags: &[bool]) -> Result<u32> {
    if offset + flags.len() > BITMASK_WIDTH {
        return Err(ProtocolError::EncodingError(format!(
            "{} flags starting at bit {} exceed {}-bit mask",
            flags.len(),
            offset,
            BITMASK_WIDTH
        )));
    }

    Ok(flags
        .iter()
        .enumerate()
        .filter(|&(_, &set)| set)
        .fold(0u32, |mask, (i, _)| mask | (1 << (offset + i))))
}

/// Build a bitmask from explicit `bit position -> flag` pairs.
pub fn fill_bit_mask_from_map(flags: &BTreeMap<u32, bool>) -> Result<u32> {
    let mut mask = 0u32;
    for (&position, &set) in flags {
        if position as usize >= BITMASK_WIDTH {
            return Err(ProtocolError::EncodingError(format!(
                "bit position {position} exceeds {BITMASK_WIDTH}-bit mask"
            )));
        }
        if set {
            mask |= 1 << position;
        }
    }
    Ok(mask)
}

/// Read side of [`fill_bit_mask`]: query individual bits of a decoded mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitMaskReader(pub u32);

impl BitMaskReader {
    #[inline]
    pub fn is_set(self, position: u32) -> bool {
        position < u32::BITS && self.0 & (1 << position) != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positional_flags() {
        assert_eq!(fill_bit_mask(0, &[true, false, true]).unwrap(), 0b101);
        assert_eq!(fill_bit_mask(0, &[]).unwrap(), 0);
        assert_eq!(fill_bit_mask(4, &[true]).unwrap(), 0b1_0000);
    }

    #[test]
    fn test_too_many_flags_rejected() {
        let flags = [true; 33];
        assert!(matches!(
            fill_bit_mask(0, &flags),
            Err(ProtocolError::EncodingError(_))
        ));
        assert!(fill_bit_mask(1, &[false; 32]).is_err());
        assert!(fill_bit_mask(0, &[true; 32]).is_ok());
    }

    #[test]
    fn test_map_flags_are_non_contiguous() {
        let flags = BTreeMap::from([(0, true), (2, false), (5, true), (6, true)]);
        assert_eq!(fill_bit_mask_from_map(&flags).unwrap(), 0b110_0001);
    }

    #[test]
    fn test_map_position_out_of_range() {
        let flags = BTreeMap::from([(32, false)]);
        assert!(fill_bit_mask_from_map(&flags).is_err());
    }

    #[test]
    fn test_reader() {
        let reader = BitMaskReader(0b100_0001);
        assert!(reader.is_set(0));
        assert!(!reader.is_set(1));
        assert!(reader.is_set(6));
        assert!(!reader.is_set(40));
    }
}
