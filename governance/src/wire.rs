//! The leading discriminator on OP_RETURN governance payloads.

/// Wire version governance objects are encoded with.
pub const NETWORK_VERSION: u8 = 0x01;

/// Governance object kinds carried in OP_RETURN outputs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum ObjectKind {
    Proposal = 1,
    Vote = 2,
}

/// Inspects the first two payload bytes and routes to the typed parser.
///
/// Anything that does not carry the current network version and a known
/// object kind is silently ignored.
pub fn classify(payload: &[u8]) -> Option<ObjectKind> {
    match payload {
        [NETWORK_VERSION, 1, ..] => Some(ObjectKind::Proposal),
        [NETWORK_VERSION, 2, ..] => Some(ObjectKind::Vote),
        _ => None,
    }
}
