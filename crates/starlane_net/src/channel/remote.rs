//! # Remote Channel
//!
//! Channel over a [`TransportPeer`] on an unreliable datagram substrate.
//!
//! ## Design
//!
//! - Unreliable packets go out immediately as one-entry frames and never
//!   touch the reliable queue
//! - Reliable-ordered packets queue up and are flushed on a fixed
//!   interval (~66Hz), batched up to 255 per frame in strict FIFO order
//! - The queue mutex covers enqueue and drain-to-local-buffer only; it is
//!   never held across a transport send, so a slow send cannot starve
//!   producer threads
//! - Delivery notifications are one-shot callbacks keyed by the
//!   transport-assigned token; teardown discards outstanding entries
//!   without invoking them

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;

use crate::channel::{AckCallback, Channel};
use crate::codec::{DeliveryGuarantee, PacketCodec};
use crate::config::ChannelConfig;
use crate::error::ChannelError;
use crate::frame::{decode_frame, encode_frame, MAX_FRAME_PACKETS};
use crate::transport::{DeliveryToken, TransportPeer};

/// Counters for one remote channel's traffic.
#[derive(Clone, Copy, Debug, Default)]
pub struct ChannelStats {
    /// Packets handed to the transport (both guarantees).
    pub packets_sent: u64,
    /// Packets decoded from inbound frames.
    pub packets_received: u64,
    /// Frames handed to the transport.
    pub frames_sent: u64,
    /// Frame bytes handed to the transport.
    pub bytes_sent: u64,
    /// Delivery callbacks invoked after confirmation.
    pub acks_confirmed: u64,
    /// Delivery callbacks discarded on teardown.
    pub acks_discarded: u64,
}

/// Channel endpoint for a connected remote peer.
pub struct RemoteChannel<C: PacketCodec, T: TransportPeer> {
    /// External packet codec.
    codec: C,
    /// Transport handle for the established connection.
    peer: T,
    /// Flush cadence.
    config: ChannelConfig,
    /// Pending reliable-ordered packets, FIFO. The only state mutated by
    /// sender threads.
    outgoing: Mutex<VecDeque<C::Packet>>,
    /// Time left until the next flush. Touched by the owning thread only.
    countdown: Mutex<Duration>,
    /// In-flight delivery notifications keyed by frame identity.
    pending_acks: Mutex<HashMap<DeliveryToken, AckCallback>>,
    /// Inbound packet queue: decoded on the network thread, drained by
    /// `poll_packet` on the owning thread.
    inbound_tx: Sender<C::Packet>,
    inbound_rx: Receiver<C::Packet>,
    /// Cleared on shutdown or peer-reported disconnection.
    open: AtomicBool,
    /// Traffic counters.
    stats: Mutex<ChannelStats>,
}

impl<C: PacketCodec, T: TransportPeer> RemoteChannel<C, T> {
    /// Creates a channel over an established peer connection.
    #[must_use]
    pub fn new(codec: C, peer: T, config: ChannelConfig) -> Self {
        let (inbound_tx, inbound_rx) = crossbeam_channel::unbounded();
        Self {
            codec,
            peer,
            config,
            outgoing: Mutex::new(VecDeque::new()),
            countdown: Mutex::new(config.flush_interval),
            pending_acks: Mutex::new(HashMap::new()),
            inbound_tx,
            inbound_rx,
            open: AtomicBool::new(true),
            stats: Mutex::new(ChannelStats::default()),
        }
    }

    /// Returns true until shutdown or peer disconnection.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Returns a copy of the traffic counters.
    #[must_use]
    pub fn stats(&self) -> ChannelStats {
        *self.stats.lock()
    }

    /// Decodes an inbound frame buffer from the transport and queues its
    /// packets for `poll_packet`. Called by the network glue for both
    /// reliable and unreliable receives.
    ///
    /// # Errors
    ///
    /// [`ChannelError::Codec`] when the buffer is not a valid frame; any
    /// packets decoded before the error are dropped with it.
    pub fn receive(&self, bytes: &[u8]) -> Result<(), ChannelError> {
        let packets = decode_frame(&self.codec, bytes)?;
        self.stats.lock().packets_received += packets.len() as u64;
        for packet in packets {
            if self.inbound_tx.send(packet).is_err() {
                return Err(ChannelError::Disconnected);
            }
        }
        Ok(())
    }

    /// Reports that the transport confirmed delivery of the frame behind
    /// `token`. Invokes the associated callback exactly once; a token
    /// with no entry (already confirmed, or discarded at teardown) is a
    /// logged no-op.
    pub fn notify_delivered(&self, token: DeliveryToken) {
        let callback = self.pending_acks.lock().remove(&token);
        match callback {
            Some(callback) => {
                self.stats.lock().acks_confirmed += 1;
                callback();
            }
            None => {
                tracing::debug!(token, "delivery notification for unknown frame");
            }
        }
    }

    /// Reports that the peer connection is gone. Pending packets and
    /// delivery callbacks are discarded; subsequent sends fail fast with
    /// [`ChannelError::Disconnected`].
    pub fn notify_disconnected(&self) {
        if !self.open.swap(false, Ordering::AcqRel) {
            return;
        }
        let dropped = {
            let mut outgoing = self.outgoing.lock();
            let n = outgoing.len();
            outgoing.clear();
            n
        };
        if dropped > 0 {
            tracing::warn!(dropped, "peer disconnected with packets still queued");
        }
        self.discard_pending_acks();
        tracing::info!("remote channel disconnected");
    }

    /// Drains the outgoing queue into frames of at most
    /// [`MAX_FRAME_PACKETS`] packets and sends each on the reliable
    /// stream. FIFO order is preserved across frames because the
    /// transport delivers reliable-ordered sends in send order.
    fn flush(&self) -> Result<(), ChannelError> {
        let mut first_err: Option<ChannelError> = None;
        let mut buf = Vec::new();
        loop {
            // Drain into a local buffer; the lock is released before the
            // transport call below.
            let batch: Vec<C::Packet> = {
                let mut outgoing = self.outgoing.lock();
                if outgoing.is_empty() {
                    break;
                }
                let take = outgoing.len().min(MAX_FRAME_PACKETS);
                outgoing.drain(..take).collect()
            };

            buf.clear();
            encode_frame(&self.codec, &batch, &mut buf)?;
            match self.peer.send_reliable_ordered(&buf) {
                Ok(()) => {
                    let mut stats = self.stats.lock();
                    stats.frames_sent += 1;
                    stats.packets_sent += batch.len() as u64;
                    stats.bytes_sent += buf.len() as u64;
                }
                Err(e) => {
                    // Keep flushing the remaining frames; report the
                    // first failure to the caller.
                    tracing::warn!(error = %e, count = batch.len(), "reliable frame send failed");
                    if first_err.is_none() {
                        first_err = Some(e.into());
                    }
                }
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    fn discard_pending_acks(&self) {
        let discarded = {
            let mut pending = self.pending_acks.lock();
            let n = pending.len();
            pending.clear();
            n
        };
        if discarded > 0 {
            self.stats.lock().acks_discarded += discarded as u64;
            tracing::debug!(discarded, "abandoned pending delivery callbacks");
        }
    }
}

impl<C: PacketCodec, T: TransportPeer> Channel for RemoteChannel<C, T> {
    type Packet = C::Packet;

    fn send_packet(&self, packet: C::Packet, guarantee: DeliveryGuarantee) -> Result<(), ChannelError> {
        if !self.is_open() {
            return Err(ChannelError::Disconnected);
        }
        match guarantee {
            DeliveryGuarantee::Unreliable => {
                // Sent immediately as a one-entry frame; never delayed
                // behind the batch window.
                let mut buf = Vec::new();
                encode_frame(&self.codec, std::slice::from_ref(&packet), &mut buf)?;
                self.peer.send_unreliable(&buf)?;
                let mut stats = self.stats.lock();
                stats.frames_sent += 1;
                stats.packets_sent += 1;
                stats.bytes_sent += buf.len() as u64;
                Ok(())
            }
            DeliveryGuarantee::ReliableOrdered => {
                self.outgoing.lock().push_back(packet);
                Ok(())
            }
        }
    }

    fn send_with_ack(
        &self,
        packet: C::Packet,
        guarantee: DeliveryGuarantee,
        on_delivered: AckCallback,
    ) -> Result<(), ChannelError> {
        // Caller error, not a runtime fault: rejected before any
        // transport call.
        if guarantee != DeliveryGuarantee::ReliableOrdered {
            return Err(ChannelError::AckRequiresReliable);
        }
        if !self.is_open() {
            return Err(ChannelError::Disconnected);
        }
        // A dedicated single-packet frame, never coalesced with the
        // periodic batch, so the notification maps to exactly this frame.
        let mut buf = Vec::new();
        encode_frame(&self.codec, std::slice::from_ref(&packet), &mut buf)?;
        let token = self.peer.send_reliable_with_notification(&buf)?;
        self.pending_acks.lock().insert(token, on_delivered);
        let mut stats = self.stats.lock();
        stats.frames_sent += 1;
        stats.packets_sent += 1;
        stats.bytes_sent += buf.len() as u64;
        Ok(())
    }

    fn poll_packet(&self) -> Option<C::Packet> {
        self.inbound_rx.try_recv().ok()
    }

    fn update(&self, elapsed: Duration) -> Result<(), ChannelError> {
        {
            let mut countdown = self.countdown.lock();
            if elapsed < *countdown {
                *countdown -= elapsed;
                return Ok(());
            }
            *countdown = self.config.flush_interval;
        }
        self.flush()
    }

    fn shutdown(&self) {
        if !self.open.swap(false, Ordering::AcqRel) {
            return;
        }
        if let Err(e) = self.flush() {
            tracing::warn!(error = %e, "flush during shutdown failed");
        }
        self.discard_pending_acks();
        tracing::debug!("remote channel shut down");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::error::{CodecError, TransportError};

    /// Codec for tests: a packet is a `u32`, encoded big-endian.
    struct U32Codec;

    impl PacketCodec for U32Codec {
        type Packet = u32;

        fn encode(&self, packet: &u32, out: &mut Vec<u8>) -> Result<(), CodecError> {
            out.extend_from_slice(&packet.to_be_bytes());
            Ok(())
        }

        fn decode(&self, input: &mut &[u8]) -> Result<u32, CodecError> {
            if input.len() < 4 {
                return Err(CodecError::Truncated);
            }
            let (head, tail) = input.split_at(4);
            *input = tail;
            let mut raw = [0u8; 4];
            raw.copy_from_slice(head);
            Ok(u32::from_be_bytes(raw))
        }
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    enum SendKind {
        Unreliable,
        Reliable,
        ReliableNotify,
    }

    /// Records every transport call; shared handles let the test inspect
    /// traffic after the peer moves into the channel.
    #[derive(Clone, Default)]
    struct MockPeer {
        sent: Arc<Mutex<Vec<(SendKind, Vec<u8>)>>>,
        next_token: Arc<AtomicU64>,
        fail_next_reliable: Arc<AtomicBool>,
    }

    impl MockPeer {
        fn sent(&self) -> Vec<(SendKind, Vec<u8>)> {
            self.sent.lock().clone()
        }
    }

    impl TransportPeer for MockPeer {
        fn send_unreliable(&self, frame: &[u8]) -> Result<(), TransportError> {
            self.sent.lock().push((SendKind::Unreliable, frame.to_vec()));
            Ok(())
        }

        fn send_reliable_ordered(&self, frame: &[u8]) -> Result<(), TransportError> {
            if self.fail_next_reliable.swap(false, Ordering::SeqCst) {
                return Err(TransportError::BufferExhausted);
            }
            self.sent.lock().push((SendKind::Reliable, frame.to_vec()));
            Ok(())
        }

        fn send_reliable_with_notification(&self, frame: &[u8]) -> Result<DeliveryToken, TransportError> {
            self.sent
                .lock()
                .push((SendKind::ReliableNotify, frame.to_vec()));
            Ok(self.next_token.fetch_add(1, Ordering::SeqCst))
        }
    }

    fn channel() -> (RemoteChannel<U32Codec, MockPeer>, MockPeer) {
        let peer = MockPeer::default();
        let channel = RemoteChannel::new(U32Codec, peer.clone(), ChannelConfig::default());
        (channel, peer)
    }

    fn interval() -> Duration {
        ChannelConfig::default().flush_interval
    }

    #[test]
    fn test_unreliable_sends_immediately_as_single_frame() {
        let (channel, peer) = channel();
        channel
            .send_packet(99, DeliveryGuarantee::Unreliable)
            .unwrap();

        let sent = peer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, SendKind::Unreliable);
        assert_eq!(decode_frame(&U32Codec, &sent[0].1).unwrap(), vec![99]);

        // Nothing queued for the reliable path.
        channel.update(interval()).unwrap();
        assert_eq!(peer.sent().len(), 1);
    }

    #[test]
    fn test_reliable_waits_for_flush_interval() {
        let (channel, peer) = channel();
        channel
            .send_packet(1, DeliveryGuarantee::ReliableOrdered)
            .unwrap();

        // Below the interval: no transmission.
        channel.update(Duration::from_millis(5)).unwrap();
        assert!(peer.sent().is_empty());

        // Accumulated past the interval: exactly one flush cycle.
        channel.update(Duration::from_millis(11)).unwrap();
        let sent = peer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, SendKind::Reliable);
        assert_eq!(decode_frame(&U32Codec, &sent[0].1).unwrap(), vec![1]);
    }

    #[test]
    fn test_flush_batches_in_fifo_order_across_frames() {
        let (channel, peer) = channel();
        for i in 0..300u32 {
            channel
                .send_packet(i, DeliveryGuarantee::ReliableOrdered)
                .unwrap();
        }
        channel.update(interval()).unwrap();

        let sent = peer.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].1[0], 255);
        assert_eq!(sent[1].1[0], 45);

        let mut decoded = decode_frame(&U32Codec, &sent[0].1).unwrap();
        decoded.extend(decode_frame(&U32Codec, &sent[1].1).unwrap());
        assert_eq!(decoded, (0..300).collect::<Vec<u32>>());

        // Queue fully drained; the next due flush sends nothing.
        channel.update(interval()).unwrap();
        assert_eq!(peer.sent().len(), 2);
    }

    #[test]
    fn test_ack_with_unreliable_rejected_before_transport() {
        let (channel, peer) = channel();
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);

        let err = channel
            .send_with_ack(
                5,
                DeliveryGuarantee::Unreliable,
                Box::new(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                }),
            )
            .unwrap_err();

        assert_eq!(err, ChannelError::AckRequiresReliable);
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(peer.sent().is_empty());
    }

    #[test]
    fn test_ack_fires_exactly_once_after_delivery() {
        let (channel, peer) = channel();
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);

        channel
            .send_with_ack(
                5,
                DeliveryGuarantee::ReliableOrdered,
                Box::new(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                }),
            )
            .unwrap();

        // Dedicated single-packet frame, not coalesced with the batch.
        let sent = peer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, SendKind::ReliableNotify);
        assert_eq!(decode_frame(&U32Codec, &sent[0].1).unwrap(), vec![5]);

        // Not before the transport reports delivery.
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        channel.notify_delivered(0);
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        // A duplicate confirmation is a no-op.
        channel.notify_delivered(0);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(channel.stats().acks_confirmed, 1);
    }

    #[test]
    fn test_disconnect_discards_pending_acks_silently() {
        let (channel, _peer) = channel();
        let fired = Arc::new(AtomicUsize::new(0));

        for i in 0..3u32 {
            let counter = Arc::clone(&fired);
            channel
                .send_with_ack(
                    i,
                    DeliveryGuarantee::ReliableOrdered,
                    Box::new(move || {
                        counter.fetch_add(1, Ordering::SeqCst);
                    }),
                )
                .unwrap();
        }

        channel.notify_disconnected();
        channel.shutdown(); // already closed; must stay clean

        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(channel.stats().acks_discarded, 3);

        let err = channel
            .send_packet(9, DeliveryGuarantee::ReliableOrdered)
            .unwrap_err();
        assert_eq!(err, ChannelError::Disconnected);
    }

    #[test]
    fn test_shutdown_flushes_pending_reliable_work() {
        let (channel, peer) = channel();
        channel
            .send_packet(1, DeliveryGuarantee::ReliableOrdered)
            .unwrap();
        channel
            .send_packet(2, DeliveryGuarantee::ReliableOrdered)
            .unwrap();

        channel.shutdown();
        channel.shutdown(); // idempotent

        let sent = peer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(decode_frame(&U32Codec, &sent[0].1).unwrap(), vec![1, 2]);

        let err = channel
            .send_packet(3, DeliveryGuarantee::Unreliable)
            .unwrap_err();
        assert_eq!(err, ChannelError::Disconnected);
    }

    #[test]
    fn test_transport_failure_does_not_abort_remaining_frames() {
        let (channel, peer) = channel();
        peer.fail_next_reliable.store(true, Ordering::SeqCst);

        for i in 0..300u32 {
            channel
                .send_packet(i, DeliveryGuarantee::ReliableOrdered)
                .unwrap();
        }
        let err = channel.update(interval()).unwrap_err();
        assert_eq!(
            err,
            ChannelError::Transport(TransportError::BufferExhausted)
        );

        // First frame failed, second still went out.
        let sent = peer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].1[0], 45);

        // Queue is not corrupted: new sends still work.
        channel
            .send_packet(300, DeliveryGuarantee::ReliableOrdered)
            .unwrap();
        channel.update(interval()).unwrap();
        assert_eq!(peer.sent().len(), 2);
    }

    #[test]
    fn test_receive_queues_packets_for_poll() {
        let (channel, _peer) = channel();
        let mut buf = Vec::new();
        encode_frame(&U32Codec, &[10u32, 11, 12], &mut buf).unwrap();

        channel.receive(&buf).unwrap();
        assert_eq!(channel.poll_packet(), Some(10));
        assert_eq!(channel.poll_packet(), Some(11));
        assert_eq!(channel.poll_packet(), Some(12));
        assert_eq!(channel.poll_packet(), None);
        assert_eq!(channel.stats().packets_received, 3);
    }

    #[test]
    fn test_receive_rejects_malformed_frame() {
        let (channel, _peer) = channel();
        let err = channel.receive(&[3u8, 0, 0]).unwrap_err();
        assert_eq!(err, ChannelError::Codec(CodecError::Truncated));
        assert_eq!(channel.poll_packet(), None);
    }

    #[test]
    fn test_concurrent_reliable_producers_all_flushed() {
        const PRODUCERS: u32 = 4;
        const PER_PRODUCER: u32 = 100;

        let (channel, peer) = channel();
        let channel = Arc::new(channel);

        let handles: Vec<_> = (0..PRODUCERS)
            .map(|producer| {
                let channel = Arc::clone(&channel);
                std::thread::spawn(move || {
                    for i in 0..PER_PRODUCER {
                        channel
                            .send_packet(
                                producer * PER_PRODUCER + i,
                                DeliveryGuarantee::ReliableOrdered,
                            )
                            .unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        channel.update(interval()).unwrap();

        let mut decoded = Vec::new();
        for (kind, frame) in peer.sent() {
            assert_eq!(kind, SendKind::Reliable);
            decoded.extend(decode_frame(&U32Codec, &frame).unwrap());
        }
        assert_eq!(decoded.len() as u32, PRODUCERS * PER_PRODUCER);
        decoded.sort_unstable();
        decoded.dedup();
        assert_eq!(decoded.len() as u32, PRODUCERS * PER_PRODUCER);
    }
}
