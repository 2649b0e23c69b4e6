//! Typed in-memory representation of OpenFlow messages.
//!
//! A [`Message`] carries the version it is exchanged under and its transaction
//! id; the body is a closed sum over the built-in kinds plus an opaque
//! `Custom` variant for vendor extensions.

use bytes::Bytes;

use crate::protocol::kind::MessageKind;
use crate::utils::address::MacAddress;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub version: u8,
    pub xid: u32,
    pub body: MessageBody,
}

impl Message {
    pub fn new(version: u8, xid: u32, body: MessageBody) -> Self {
        Self { version, xid, body }
    }

    pub fn kind(&self) -> MessageKind {
        self.body.kind()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageBody {
    /// Hello elements are not interpreted; they are carried as raw bytes.
    Hello { elements: Bytes },
    Error(ErrorMessage),
    EchoRequest { data: Bytes },
    EchoReply { data: Bytes },
    Experimenter(ExperimenterMessage),
    FeaturesRequest,
    FeaturesReply(FeaturesReply),
    PortStatus(PortStatus),
    PortMod(PortMod),
    BarrierRequest,
    BarrierReply,
    /// Vendor message outside the closed set, keyed by its type code.
    Custom { code: u8, payload: Bytes },
}

impl MessageBody {
    pub fn kind(&self) -> MessageKind {
        match self {
            MessageBody::Hello { .. } => MessageKind::Hello,
            MessageBody::Error(_) => MessageKind::Error,
            MessageBody::EchoRequest { .. } => MessageKind::EchoRequest,
            MessageBody::EchoReply { .. } => MessageKind::EchoReply,
            MessageBody::Experimenter(_) => MessageKind::Experimenter,
            MessageBody::FeaturesRequest => MessageKind::FeaturesRequest,
            MessageBody::FeaturesReply(_) => MessageKind::FeaturesReply,
            MessageBody::PortStatus(_) => MessageKind::PortStatus,
            MessageBody::PortMod(_) => MessageKind::PortMod,
            MessageBody::BarrierRequest => MessageKind::BarrierRequest,
            MessageBody::BarrierReply => MessageKind::BarrierReply,
            MessageBody::Custom { code, .. } => MessageKind::Custom(*code),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorMessage {
    pub error_type: u16,
    pub code: u16,
    pub data: Bytes,
}

/// Vendor (1.0) / experimenter (1.3) message. `exp_type` does not exist in
/// 1.0 and must be zero there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperimenterMessage {
    pub experimenter: u32,
    pub exp_type: u32,
    pub data: Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeaturesReply {
    pub datapath_id: u64,
    pub buffers: u32,
    pub tables: u8,
    /// 1.3 only; zero in 1.0.
    pub auxiliary_id: u8,
    pub capabilities: u32,
    /// `actions` in 1.0, `reserved` in 1.3.
    pub reserved: u32,
    /// 1.0 physical port list, kept undecoded.
    pub ports: Bytes,
}

/// Why a switch reported a port change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortReason {
    Add,
    Delete,
    Modify,
}

impl PortReason {
    pub fn to_wire(self) -> u8 {
        match self {
            PortReason::Add => 0,
            PortReason::Delete => 1,
            PortReason::Modify => 2,
        }
    }

    pub fn from_wire(value: u8) -> Option<Self> {
        match value {
            0 => Some(PortReason::Add),
            1 => Some(PortReason::Delete),
            2 => Some(PortReason::Modify),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortStatus {
    pub reason: PortReason,
    pub port: PortDescription,
}

/// Physical port description as carried in port-status messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortDescription {
    pub port_no: u32,
    pub hw_address: MacAddress,
    pub name: String,
    pub config: PortConfig,
    /// Link state bits, carried as-is.
    pub state: u32,
    pub current: PortFeatures,
    pub advertised: PortFeatures,
    pub supported: PortFeatures,
    pub peer: PortFeatures,
    /// 1.3 only; zero in 1.0.
    pub curr_speed: u32,
    /// 1.3 only; zero in 1.0.
    pub max_speed: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortMod {
    pub port_no: u32,
    pub hw_address: MacAddress,
    pub config: PortConfig,
    pub mask: PortConfig,
    pub advertise: PortFeatures,
}

/// Administrative port configuration flags.
///
/// `no_stp`, `no_recv_stp` and `no_flood` only exist in OpenFlow 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PortConfig {
    pub port_down: bool,
    pub no_stp: bool,
    pub no_recv: bool,
    pub no_recv_stp: bool,
    pub no_flood: bool,
    pub no_fwd: bool,
    pub no_packet_in: bool,
}

/// Port feature flags.
///
/// `rate_40gb_fd`, `rate_100gb_fd`, `rate_1tb_fd` and `other` only exist in
/// OpenFlow 1.3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PortFeatures {
    pub rate_10mb_hd: bool,
    pub rate_10mb_fd: bool,
    pub rate_100mb_hd: bool,
    pub rate_100mb_fd: bool,
    pub rate_1gb_hd: bool,
    pub rate_1gb_fd: bool,
    pub rate_10gb_fd: bool,
    pub rate_40gb_fd: bool,
    pub rate_100gb_fd: bool,
    pub rate_1tb_fd: bool,
    pub other: bool,
    pub copper: bool,
    pub fiber: bool,
    pub autoneg: bool,
    pub pause: bool,
    pub pause_asym: bool,
}
