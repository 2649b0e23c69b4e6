//! Static `(version, type code) -> MessageKind` table.
//!
//! Consulted by the deserialization factory before anything past the type byte
//! is read: a code missing from this table means the rest of the frame cannot
//! be interpreted.

use std::collections::HashMap;

use crate::protocol::kind::{MessageKind, OFP_VERSION_1_0, OFP_VERSION_1_3};

/// Type codes per version. The only codes that differ between 1.0 and 1.3 are
/// port-mod and the barrier pair.
const V10_CODES: [(u8, MessageKind); 11] = [
    (0, MessageKind::Hello),
    (1, MessageKind::Error),
    (2, MessageKind::EchoRequest),
    (3, MessageKind::EchoReply),
    (4, MessageKind::Experimenter),
    (5, MessageKind::FeaturesRequest),
    (6, MessageKind::FeaturesReply),
    (12, MessageKind::PortStatus),
    (15, MessageKind::PortMod),
    (18, MessageKind::BarrierRequest),
    (19, MessageKind::BarrierReply),
];

const V13_CODES: [(u8, MessageKind); 11] = [
    (0, MessageKind::Hello),
    (1, MessageKind::Error),
    (2, MessageKind::EchoRequest),
    (3, MessageKind::EchoReply),
    (4, MessageKind::Experimenter),
    (5, MessageKind::FeaturesRequest),
    (6, MessageKind::FeaturesReply),
    (12, MessageKind::PortStatus),
    (16, MessageKind::PortMod),
    (20, MessageKind::BarrierRequest),
    (21, MessageKind::BarrierReply),
];

/// Immutable bidirectional map between type codes and message kinds.
#[derive(Debug, Clone)]
pub struct TypeTable {
    by_code: HashMap<(u8, u8), MessageKind>,
    by_kind: HashMap<(u8, MessageKind), u8>,
}

impl TypeTable {
    /// Table covering every built-in kind of every supported version.
    pub fn builtin() -> Self {
        let mut by_code = HashMap::new();
        let mut by_kind = HashMap::new();

        for (version, codes) in [(OFP_VERSION_1_0, &V10_CODES), (OFP_VERSION_1_3, &V13_CODES)] {
            for &(code, kind) in codes.iter() {
                by_code.insert((version, code), kind);
                by_kind.insert((version, kind), code);
            }
        }

        Self { by_code, by_kind }
    }

    /// Resolve a raw type code. Custom kinds are never in the table.
    pub fn kind_of(&self, version: u8, code: u8) -> Option<MessageKind> {
        self.by_code.get(&(version, code)).copied()
    }

    /// Wire code for a kind in the given version.
    pub fn code_of(&self, version: u8, kind: MessageKind) -> Option<u8> {
        match kind {
            MessageKind::Custom(code) => Some(code),
            kind => self.by_kind.get(&(version, kind)).copied(),
        }
    }

    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::builtin()
    }
}
