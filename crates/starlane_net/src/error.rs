//! # Delivery Layer Error Types
//!
//! All errors that can cross the delivery-layer API boundary.
//!
//! ## Design
//!
//! - Caller misuse is rejected synchronously, before any transport call
//! - Asynchronous transport failures arrive through the connection's own
//!   failure path (`RemoteChannel::notify_disconnected`), never through a
//!   stale send result

use thiserror::Error;

/// Errors returned by [`Channel`](crate::Channel) operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChannelError {
    /// A delivery notification was requested for a guarantee that cannot
    /// carry one. Ack callbacks ride the reliable-ordered path only.
    #[error("delivery notification requires reliable-ordered delivery")]
    AckRequiresReliable,

    /// The channel was shut down, or the peer reported disconnection.
    /// Sends fail fast instead of queueing into the void.
    #[error("channel is disconnected")]
    Disconnected,

    /// The underlying transport rejected a send.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// A packet or frame could not be encoded or decoded.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
}

/// Failures reported by a [`TransportPeer`](crate::TransportPeer).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The peer connection is gone.
    #[error("peer is disconnected")]
    Disconnected,

    /// The transport's send buffer is full.
    #[error("transport send buffer exhausted")]
    BufferExhausted,

    /// Any other transport-specific failure.
    #[error("transport failure: {0}")]
    Other(String),
}

/// Packet and frame encoding/decoding errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The buffer ended before a complete packet was read.
    #[error("unexpected end of buffer")]
    Truncated,

    /// The packet bytes were recognizably invalid.
    #[error("malformed packet: {0}")]
    Malformed(String),

    /// A frame must carry between 1 and 255 packets.
    #[error("frame packet count must be 1..=255, got {0}")]
    InvalidFrameCount(usize),

    /// Bytes remained after the last packet of a frame was decoded.
    #[error("trailing bytes after frame payload")]
    TrailingData,
}
