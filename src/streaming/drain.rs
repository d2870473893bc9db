//! Real-time drain of the shared mix buffer
//!
//! Runs on the audio subsystem's rendering thread. The critical section is
//! bounded by the period size; nothing here allocates or logs.

use crate::ring::RingMixBuffer;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// What the audio subsystem should do after a drain call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainStatus {
    /// Keep rendering and call again next period
    Continue,
    /// The drain was closed; the stream should stop
    Complete,
}

/// Drain statistics for monitoring the rendering thread
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainStats {
    /// Number of drain calls served
    pub periods: u64,
    /// Number of samples copied out of the mix buffer
    pub samples_drained: u64,
}

#[derive(Debug, Default)]
struct DrainCounters {
    periods: AtomicU64,
    samples_drained: AtomicU64,
    closed: AtomicBool,
}

/// Drain side of the shared mix buffer
///
/// Cloning is cheap; every clone drains the same buffer and shares counters.
#[derive(Debug, Clone)]
pub struct StreamDrain {
    ring: Arc<Mutex<RingMixBuffer>>,
    counters: Arc<DrainCounters>,
}

impl StreamDrain {
    /// Create a drain over a shared mix buffer
    pub fn new(ring: Arc<Mutex<RingMixBuffer>>) -> Self {
        StreamDrain {
            ring,
            counters: Arc::new(DrainCounters::default()),
        }
    }

    /// Fill `output` with the next `output.len()` mixed samples and silence
    /// them in the ring.
    ///
    /// After [`close`](StreamDrain::close) the output is filled with silence
    /// and [`DrainStatus::Complete`] is returned.
    pub fn fill(&self, output: &mut [i16]) -> DrainStatus {
        if self.counters.closed.load(Ordering::Acquire) {
            output.fill(0);
            return DrainStatus::Complete;
        }

        self.ring.lock().drain(output);

        self.counters.periods.fetch_add(1, Ordering::Relaxed);
        self.counters
            .samples_drained
            .fetch_add(output.len() as u64, Ordering::Relaxed);

        DrainStatus::Continue
    }

    /// Serve one period of `frames` interleaved frames of `channels` samples.
    ///
    /// Drains `frames * channels` samples into the front of `output`
    /// (clamped to its length).
    pub fn render_period(&self, frames: usize, channels: u16, output: &mut [i16]) -> DrainStatus {
        let requested = (frames * channels as usize).min(output.len());
        self.fill(&mut output[..requested])
    }

    /// Stop serving samples; subsequent calls return [`DrainStatus::Complete`]
    pub fn close(&self) {
        self.counters.closed.store(true, Ordering::Release);
    }

    /// Whether [`close`](StreamDrain::close) has been called
    pub fn is_closed(&self) -> bool {
        self.counters.closed.load(Ordering::Acquire)
    }

    /// Get current drain statistics
    pub fn stats(&self) -> DrainStats {
        DrainStats {
            periods: self.counters.periods.load(Ordering::Relaxed),
            samples_drained: self.counters.samples_drained.load(Ordering::Relaxed),
        }
    }
}
