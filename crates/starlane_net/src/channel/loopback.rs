//! # Loopback Channel
//!
//! In-process channel used when client and server live in the same
//! process (single-player). Delivery cannot be lost, so the
//! unreliable/reliable distinction collapses and every send is an
//! enqueue.
//!
//! ## Design
//!
//! - Unbounded MPSC queue per direction; producers never block
//! - Per-producer FIFO order; no order promised across producers
//! - Delivery notifications fire synchronously: the queue is the wire

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;

use crate::channel::{AckCallback, Channel};
use crate::codec::DeliveryGuarantee;
use crate::error::ChannelError;

/// One endpoint of an in-process channel pair.
pub struct LoopbackChannel<P: Send + 'static> {
    /// Sender towards the opposite endpoint. Taken on shutdown so the
    /// queue is actually released.
    outbound: Mutex<Option<Sender<P>>>,
    /// Receiver for packets the opposite endpoint sent us.
    inbound: Receiver<P>,
    /// Cleared by `shutdown`; sends fail fast afterwards.
    open: AtomicBool,
}

impl<P: Send + 'static> LoopbackChannel<P> {
    /// Creates a connected pair of endpoints. Packets sent on one side
    /// are polled on the other.
    #[must_use]
    pub fn pair() -> (Self, Self) {
        let (a_tx, a_rx) = crossbeam_channel::unbounded();
        let (b_tx, b_rx) = crossbeam_channel::unbounded();
        (
            Self {
                outbound: Mutex::new(Some(a_tx)),
                inbound: b_rx,
                open: AtomicBool::new(true),
            },
            Self {
                outbound: Mutex::new(Some(b_tx)),
                inbound: a_rx,
                open: AtomicBool::new(true),
            },
        )
    }

    /// Returns true until `shutdown` is called.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    fn enqueue(&self, packet: P) -> Result<(), ChannelError> {
        if !self.is_open() {
            return Err(ChannelError::Disconnected);
        }
        let outbound = self.outbound.lock();
        let sender = outbound.as_ref().ok_or(ChannelError::Disconnected)?;
        // Fails only when the opposite endpoint dropped its receiver.
        sender.send(packet).map_err(|_| ChannelError::Disconnected)
    }
}

impl<P: Send + 'static> Channel for LoopbackChannel<P> {
    type Packet = P;

    fn send_packet(&self, packet: P, _guarantee: DeliveryGuarantee) -> Result<(), ChannelError> {
        self.enqueue(packet)
    }

    fn send_with_ack(
        &self,
        packet: P,
        _guarantee: DeliveryGuarantee,
        on_delivered: AckCallback,
    ) -> Result<(), ChannelError> {
        // In-process delivery is unconditional, so any guarantee can
        // carry a notification and it fires as soon as the packet is
        // queued.
        self.enqueue(packet)?;
        on_delivered();
        Ok(())
    }

    fn poll_packet(&self) -> Option<P> {
        self.inbound.try_recv().ok()
    }

    fn update(&self, _elapsed: Duration) -> Result<(), ChannelError> {
        Ok(())
    }

    fn shutdown(&self) {
        if !self.open.swap(false, Ordering::AcqRel) {
            return;
        }
        self.outbound.lock().take();
        tracing::debug!("loopback channel shut down");
    }
}
