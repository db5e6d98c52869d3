//! # Frame Wire Format
//!
//! A frame is one reliable-ordered (or unreliable, with `count = 1`)
//! transmission: `[count: u8][packet_1][packet_2]...[packet_count]`.
//!
//! ## Design
//!
//! - `1 <= count <= 255`, so the one-byte header is always sufficient
//! - Packets inside a frame keep the order they were drained in
//! - Packet byte layouts are owned by the [`PacketCodec`]

use crate::codec::PacketCodec;
use crate::error::CodecError;

/// Maximum number of packets a single frame can carry.
///
/// Bounded by the one-byte count header; also keeps frames from growing
/// past what the transport can move in one reliable send.
pub const MAX_FRAME_PACKETS: usize = 255;

/// Encodes `packets` as one frame, appending to `out`.
///
/// # Errors
///
/// Returns [`CodecError::InvalidFrameCount`] when `packets` is empty or
/// holds more than [`MAX_FRAME_PACKETS`] entries, or any error the codec
/// reports for an individual packet.
pub fn encode_frame<C: PacketCodec>(
    codec: &C,
    packets: &[C::Packet],
    out: &mut Vec<u8>,
) -> Result<(), CodecError> {
    if packets.is_empty() || packets.len() > MAX_FRAME_PACKETS {
        return Err(CodecError::InvalidFrameCount(packets.len()));
    }
    out.push(packets.len() as u8);
    for packet in packets {
        codec.encode(packet, out)?;
    }
    Ok(())
}

/// Decodes a complete frame buffer back into its packets, in order.
///
/// # Errors
///
/// Returns [`CodecError`] when the buffer is empty, declares a zero
/// count, ends before `count` packets were read, or carries bytes past
/// the last packet.
pub fn decode_frame<C: PacketCodec>(codec: &C, bytes: &[u8]) -> Result<Vec<C::Packet>, CodecError> {
    let (&count, mut rest) = bytes.split_first().ok_or(CodecError::Truncated)?;
    if count == 0 {
        return Err(CodecError::InvalidFrameCount(0));
    }
    let mut packets = Vec::with_capacity(usize::from(count));
    for _ in 0..count {
        packets.push(codec.decode(&mut rest)?);
    }
    if !rest.is_empty() {
        return Err(CodecError::TrailingData);
    }
    Ok(packets)
}
