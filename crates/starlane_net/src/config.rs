//! # Channel Configuration
//!
//! Timing knobs for the remote channel's flush cadence.

use std::time::Duration;

/// Default flush rate for batched reliable-ordered traffic (Hz).
///
/// At 66Hz each flush window is ~15.15ms: short enough that state deltas
/// never sit long, long enough to amortize per-send transport overhead.
pub const FLUSH_RATE_HZ: u32 = 66;

/// Remote channel configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChannelConfig {
    /// Interval between flushes of the pending reliable queue.
    pub flush_interval: Duration,
}

impl ChannelConfig {
    /// Creates a configuration flushing at the given rate.
    #[must_use]
    pub fn from_rate(flush_hz: u32) -> Self {
        Self {
            flush_interval: Duration::from_micros(1_000_000 / u64::from(flush_hz.max(1))),
        }
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self::from_rate(FLUSH_RATE_HZ)
    }
}
