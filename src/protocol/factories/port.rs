//! Port configuration and feature bitmasks, shared by port-mod and
//! port-status codecs.
//!
//! Config flags sit on fixed, non-contiguous bit positions. Feature flags are
//! positional, in the order the version defines them.

use std::collections::BTreeMap;

use crate::error::{ProtocolError, Result};
use crate::protocol::kind::OFP_VERSION_1_0;
use crate::protocol::message::{PortConfig, PortFeatures};
use crate::utils::bitmask::{fill_bit_mask, fill_bit_mask_from_map, BitMaskReader};

const PORT_DOWN: u32 = 0;
const NO_STP: u32 = 1;
const NO_RECV: u32 = 2;
const NO_RECV_STP: u32 = 3;
const NO_FLOOD: u32 = 4;
const NO_FWD: u32 = 5;
const NO_PACKET_IN: u32 = 6;

pub(crate) fn encode_config(version: u8, config: &PortConfig) -> Result<u32> {
    let mut bits = BTreeMap::from([
        (PORT_DOWN, config.port_down),
        (NO_RECV, config.no_recv),
        (NO_FWD, config.no_fwd),
        (NO_PACKET_IN, config.no_packet_in),
    ]);

    if version == OFP_VERSION_1_0 {
        bits.insert(NO_STP, config.no_stp);
        bits.insert(NO_RECV_STP, config.no_recv_stp);
        bits.insert(NO_FLOOD, config.no_flood);
    } else if config.no_stp || config.no_recv_stp || config.no_flood {
        return Err(ProtocolError::EncodingError(format!(
            "port config flags no_stp/no_recv_stp/no_flood do not exist in version {version:#04x}"
        )));
    }

    fill_bit_mask_from_map(&bits)
}

pub(crate) fn decode_config(version: u8, mask: u32) -> PortConfig {
    let bits = BitMaskReader(mask);
    let v10 = version == OFP_VERSION_1_0;
    PortConfig {
        port_down: bits.is_set(PORT_DOWN),
        no_stp: v10 && bits.is_set(NO_STP),
        no_recv: bits.is_set(NO_RECV),
        no_recv_stp: v10 && bits.is_set(NO_RECV_STP),
        no_flood: v10 && bits.is_set(NO_FLOOD),
        no_fwd: bits.is_set(NO_FWD),
        no_packet_in: bits.is_set(NO_PACKET_IN),
    }
}

pub(crate) fn encode_features(version: u8, features: &PortFeatures) -> Result<u32> {
    if version == OFP_VERSION_1_0 {
        if features.rate_40gb_fd || features.rate_100gb_fd || features.rate_1tb_fd || features.other
        {
            return Err(ProtocolError::EncodingError(
                "port features 40gb_fd/100gb_fd/1tb_fd/other do not exist in version 0x01".into(),
            ));
        }
        return fill_bit_mask(
            0,
            &[
                features.rate_10mb_hd,
                features.rate_10mb_fd,
                features.rate_100mb_hd,
                features.rate_100mb_fd,
                features.rate_1gb_hd,
                features.rate_1gb_fd,
                features.rate_10gb_fd,
                features.copper,
                features.fiber,
                features.autoneg,
                features.pause,
                features.pause_asym,
            ],
        );
    }

    fill_bit_mask(
        0,
        &[
            features.rate_10mb_hd,
            features.rate_10mb_fd,
            features.rate_100mb_hd,
            features.rate_100mb_fd,
            features.rate_1gb_hd,
            features.rate_1gb_fd,
            features.rate_10gb_fd,
            features.rate_40gb_fd,
            features.rate_100gb_fd,
            features.rate_1tb_fd,
            features.other,
            features.copper,
            features.fiber,
            features.autoneg,
            features.pause,
            features.pause_asym,
        ],
    )
}

pub(crate) fn decode_features(version: u8, mask: u32) -> PortFeatures {
    let bits = BitMaskReader(mask);
    if version == OFP_VERSION_1_0 {
        return PortFeatures {
            rate_10mb_hd: bits.is_set(0),
            rate_10mb_fd: bits.is_set(1),
            rate_100mb_hd: bits.is_set(2),
            rate_100mb_fd: bits.is_set(3),
            rate_1gb_hd: bits.is_set(4),
            rate_1gb_fd: bits.is_set(5),
            rate_10gb_fd: bits.is_set(6),
            copper: bits.is_set(7),
            fiber: bits.is_set(8),
            autoneg: bits.is_set(9),
            pause: bits.is_set(10),
            pause_asym: bits.is_set(11),
            ..PortFeatures::default()
        };
    }

    PortFeatures {
        rate_10mb_hd: bits.is_set(0),
        rate_10mb_fd: bits.is_set(1),
        rate_100mb_hd: bits.is_set(2),
        rate_100mb_fd: bits.is_set(3),
        rate_1gb_hd: bits.is_set(4),
        rate_1gb_fd: bits.is_set(5),
        rate_10gb_fd: bits.is_set(6),
        rate_40gb_fd: bits.is_set(7),
        rate_100gb_fd: bits.is_set(8),
        rate_1tb_fd: bits.is_set(9),
        other: bits.is_set(10),
        copper: bits.is_set(11),
        fiber: bits.is_set(12),
        autoneg: bits.is_set(13),
        pause: bits.is_set(14),
        pause_asym: bits.is_set(15),
    }
}
