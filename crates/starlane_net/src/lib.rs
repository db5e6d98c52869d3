//! # STARLANE Net - Packet Delivery Layer
//!
//! Moves application-level game packets between peers over two transport
//! substrates: an in-process loopback for single-player, and a remote
//! connection layered over an unreliable datagram transport.
//!
//! ## Architecture
//!
//! ```text
//!  gameplay threads                     owning thread (fixed cadence)
//!  ─────────────────                    ─────────────────────────────
//!  send_packet ────┐                    update ──▶ flush due frames
//!  send_with_ack ──┼──▶ ┌────────────┐  poll_packet ◀── inbound queue
//!                  │    │  Channel   │
//!                  └──▶ └─────┬──────┘
//!                             │
//!              ┌──────────────┴──────────────┐
//!       ┌──────▼───────┐             ┌───────▼───────┐
//!       │ Loopback     │             │ Remote        │
//!       │ (in-process  │             │ (frames over  │
//!       │  queue)      │             │  datagrams)   │
//!       └──────────────┘             └───────────────┘
//! ```
//!
//! The remote side batches reliable-ordered packets into bounded frames
//! on a ~66Hz tick, sends unreliable packets immediately, and tracks
//! one-shot delivery-notification callbacks per dedicated frame.
//!
//! Packet payload encoding is owned by an external [`PacketCodec`];
//! retransmission and congestion control are owned by the transport
//! behind [`TransportPeer`].
//!
//! ## Example
//!
//! ```rust,ignore
//! use starlane_net::{Channel, ChannelConfig, DeliveryGuarantee, RemoteChannel};
//!
//! let channel = RemoteChannel::new(codec, peer, ChannelConfig::default());
//! channel.send_packet(update_packet, DeliveryGuarantee::ReliableOrdered)?;
//! channel.update(frame_time)?; // owning thread, every tick
//! while let Some(packet) = channel.poll_packet() {
//!     session.handle(packet);
//! }
//! ```

pub mod channel;
pub mod codec;
pub mod config;
pub mod console;
pub mod error;
pub mod frame;
pub mod transport;

// Re-exports for convenience
pub use channel::{AckCallback, Channel, ChannelStats, LoopbackChannel, RemoteChannel};
pub use codec::{DeliveryGuarantee, PacketCodec};
pub use config::{ChannelConfig, FLUSH_RATE_HZ};
pub use console::{CommandHandler, CommandRegistry, ConsoleCommand, ConsoleContext};
pub use error::{ChannelError, CodecError, TransportError};
pub use frame::{decode_frame, encode_frame, MAX_FRAME_PACKETS};
pub use transport::{DeliveryToken, TransportPeer};
