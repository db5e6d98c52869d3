//! # Packet Channels
//!
//! The unit this layer exists for: a [`Channel`] moves application
//! packets between two peers.
//!
//! ```text
//!  sim thread ──┐
//!  console  ────┼── send_packet / send_with_ack ──▶ ┌─────────┐
//!  (any thread) ┘                                   │ Channel │──▶ peer
//!                                                   └─────────┘
//!  owning thread ── update (flush) / poll_packet ◀──────┘
//! ```
//!
//! ## Design
//!
//! - [`LoopbackChannel`]: in-process queue, used when client and server
//!   share a process (single-player)
//! - [`RemoteChannel`]: batched frames over an unreliable datagram
//!   transport, with delivery-notification callbacks
//! - No operation blocks the calling thread

use std::time::Duration;

use crate::codec::DeliveryGuarantee;
use crate::error::ChannelError;

pub mod loopback;
pub mod remote;

pub use loopback::LoopbackChannel;
pub use remote::{ChannelStats, RemoteChannel};

/// One-shot delivery-notification callback. Invoked at most once, and
/// only after the transport confirms the associated frame arrived.
pub type AckCallback = Box<dyn FnOnce() + Send + 'static>;

/// Contract shared by loopback and remote packet channels.
///
/// Senders may call the send operations from any number of threads; one
/// designated thread drives [`update`](Channel::update) and
/// [`poll_packet`](Channel::poll_packet) on a fixed cadence.
pub trait Channel: Send + Sync {
    /// The application packet type moved by this channel.
    type Packet: Send + 'static;

    /// Enqueues or immediately transmits a packet. Never blocks.
    ///
    /// # Errors
    ///
    /// [`ChannelError::Disconnected`] after shutdown or peer loss;
    /// [`ChannelError::Transport`] if an immediate send is rejected.
    fn send_packet(
        &self,
        packet: Self::Packet,
        guarantee: DeliveryGuarantee,
    ) -> Result<(), ChannelError>;

    /// Sends a packet with a one-shot delivery notification.
    ///
    /// # Errors
    ///
    /// [`ChannelError::AckRequiresReliable`] — synchronously, before any
    /// transmission — when the implementation cannot honor a notification
    /// for `guarantee`; otherwise as [`send_packet`](Channel::send_packet).
    fn send_with_ack(
        &self,
        packet: Self::Packet,
        guarantee: DeliveryGuarantee,
        on_delivered: AckCallback,
    ) -> Result<(), ChannelError>;

    /// Returns the next inbound packet, or `None` when the queue is
    /// empty. Non-blocking.
    fn poll_packet(&self) -> Option<Self::Packet>;

    /// Advances internal timers by `elapsed` and performs due work
    /// (flushing the reliable queue). A no-op for channels with nothing
    /// to do.
    ///
    /// # Errors
    ///
    /// [`ChannelError::Transport`] if a due flush hit a transport
    /// failure; the pending queue stays intact for packets not yet
    /// drained.
    fn update(&self, elapsed: Duration) -> Result<(), ChannelError>;

    /// Flushes pending reliable work, discards pending delivery
    /// callbacks, and releases the transport peer or loopback queue.
    /// Idempotent.
    fn shutdown(&self);
}
