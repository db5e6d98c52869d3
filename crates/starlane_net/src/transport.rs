//! # Transport Peer Seam
//!
//! The remote channel sits on top of an unreliable datagram library that
//! already provides raw unreliable sends, native reliable-ordered sends,
//! and per-send delivery notifications. This module defines the handle
//! the channel drives; retransmission and congestion control stay on the
//! transport's side of the line.

use crate::error::TransportError;

/// Identity of one in-flight reliable transmission, assigned by the
/// transport. Keys the pending delivery-notification table.
pub type DeliveryToken = u64;

/// Handle to an established remote peer connection.
///
/// All sends are immediate from the channel's point of view: the
/// transport either accepts the buffer or reports a [`TransportError`].
/// Implementations must be callable from multiple threads.
pub trait TransportPeer: Send + Sync + 'static {
    /// Sends a frame with no delivery or ordering promise.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the transport rejects the send.
    fn send_unreliable(&self, frame: &[u8]) -> Result<(), TransportError>;

    /// Sends a frame on the transport's native reliable-ordered stream.
    /// Frames sent through here arrive loss-free, in send order.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the transport rejects the send.
    fn send_reliable_ordered(&self, frame: &[u8]) -> Result<(), TransportError>;

    /// Sends a reliable-ordered frame and requests a delivery
    /// notification for it. The returned token identifies the frame when
    /// the transport later reports it delivered.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the transport rejects the send; no
    /// token is issued in that case.
    fn send_reliable_with_notification(&self, frame: &[u8]) -> Result<DeliveryToken, TransportError>;
}
