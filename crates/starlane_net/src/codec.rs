//! # Packet Codec Seam
//!
//! The delivery layer treats packets as opaque. Serialization is owned by
//! an external codec collaborator; this module defines the seam it plugs
//! into, plus the delivery guarantee a sender requests per packet.

use crate::error::CodecError;

/// Delivery guarantee requested for a single packet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeliveryGuarantee {
    /// Best effort. No retransmission, no ordering promise. Used for
    /// high-frequency state that tolerates loss (position updates).
    Unreliable,
    /// In-order, loss-free arrival, provided by the transport's native
    /// reliable-ordered primitive.
    ReliableOrdered,
}

/// Serializes and deserializes application packets.
///
/// The packet's byte layout is self-describing: `decode` consumes exactly
/// the bytes belonging to one packet from the front of the cursor, which
/// is what lets multiple packets be concatenated inside one frame.
pub trait PacketCodec: Send + Sync + 'static {
    /// The application packet type this codec understands.
    type Packet: Send + 'static;

    /// Appends the encoded packet to `out`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError`] if the packet cannot be represented.
    fn encode(&self, packet: &Self::Packet, out: &mut Vec<u8>) -> Result<(), CodecError>;

    /// Decodes one packet from the front of `input`, advancing the cursor
    /// past the consumed bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError`] if the bytes are truncated or malformed.
    fn decode(&self, input: &mut &[u8]) -> Result<Self::Packet, CodecError>;
}
