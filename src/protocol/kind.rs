//! Message kinds and the keys codecs are registered under.

use std::fmt;

/// OpenFlow 1.0 wire version.
pub const OFP_VERSION_1_0: u8 = 0x01;

/// OpenFlow 1.3 wire version.
pub const OFP_VERSION_1_3: u8 = 0x04;

/// Versions the built-in codecs are registered for.
pub const SUPPORTED_VERSIONS: [u8; 2] = [OFP_VERSION_1_0, OFP_VERSION_1_3];

/// Logical message variant a frame's type code resolves to.
///
/// The type code of a kind is version specific (see [`crate::protocol::type_table`]).
/// Vendor extensions that are not part of the closed set are carried as
/// `Custom(code)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Hello,
    Error,
    EchoRequest,
    EchoReply,
    Experimenter,
    FeaturesRequest,
    FeaturesReply,
    PortStatus,
    PortMod,
    BarrierRequest,
    BarrierReply,
    Custom(u8),
}

impl MessageKind {
    /// All built-in kinds, in type-code order of OpenFlow 1.3.
    pub const BUILTIN: [MessageKind; 11] = [
        MessageKind::Hello,
        MessageKind::Error,
        MessageKind::EchoRequest,
        MessageKind::EchoReply,
        MessageKind::Experimenter,
        MessageKind::FeaturesRequest,
        MessageKind::FeaturesReply,
        MessageKind::PortStatus,
        MessageKind::PortMod,
        MessageKind::BarrierRequest,
        MessageKind::BarrierReply,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MessageKind::Hello => "HELLO",
            MessageKind::Error => "ERROR",
            MessageKind::EchoRequest => "ECHO_REQUEST",
            MessageKind::EchoReply => "ECHO_REPLY",
            MessageKind::Experimenter => "EXPERIMENTER",
            MessageKind::FeaturesRequest => "FEATURES_REQUEST",
            MessageKind::FeaturesReply => "FEATURES_REPLY",
            MessageKind::PortStatus => "PORT_STATUS",
            MessageKind::PortMod => "PORT_MOD",
            MessageKind::BarrierRequest => "BARRIER_REQUEST",
            MessageKind::BarrierReply => "BARRIER_REPLY",
            MessageKind::Custom(_) => "CUSTOM",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageKind::Custom(code) => write!(f, "CUSTOM({code})"),
            other => f.write_str(other.name()),
        }
    }
}

/// Serializer registry key: protocol version plus logical message kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageTypeKey {
    pub version: u8,
    pub kind: MessageKind,
}

impl MessageTypeKey {
    pub const fn new(version: u8, kind: MessageKind) -> Self {
        Self { version, kind }
    }
}

impl fmt::Display for MessageTypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(version {:#04x}, {})", self.version, self.kind)
    }
}

/// Deserializer registry key: version, raw type code and the kind the code
/// resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageCodeKey {
    pub version: u8,
    pub code: u8,
    pub kind: MessageKind,
}

impl MessageCodeKey {
    pub const fn new(version: u8, code: u8, kind: MessageKind) -> Self {
        Self {
            version,
            code,
            kind,
        }
    }
}

impl fmt::Display for MessageCodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(version {:#04x}, code {}, {})",
            self.version, self.code, self.kind
        )
    }
}
