//! Streaming output: the drain path and the hardware device
//!
//! The audio subsystem calls into [`StreamDrain`] once per period on its
//! real-time thread. Each call copies out and silences the next
//! `frames * channels` samples of the shared mix buffer. With the
//! `streaming` feature, [`AudioDevice`] wires a drain into a rodio output
//! stream.

#[cfg(feature = "streaming")]
pub mod audio_device;
pub mod drain;

#[cfg(feature = "streaming")]
pub use audio_device::AudioDevice;
pub use drain::{DrainStats, DrainStatus, StreamDrain};

use crate::{MixerError, Result};
use serde::{Deserialize, Serialize};

/// Output sample rate (44.1 kHz)
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;

/// Output channel count (interleaved stereo)
pub const DEFAULT_CHANNELS: u16 = 2;

/// Output sample width; the stream is always signed 16-bit
pub const BITS_PER_SAMPLE: u16 = 16;

/// Longest suggested latency accepted, in seconds
pub const MAX_SUGGESTED_LATENCY: f32 = 2.0;

/// Configuration for the output stream
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Sample rate in Hz
    pub sample_rate: u32,

    /// Number of interleaved audio channels
    pub channels: u16,

    /// Suggested output latency in seconds.
    /// Sets the drain period: one period holds this much audio.
    pub suggested_latency: f32,
}

impl StreamConfig {
    /// Create a streaming configuration optimized for low latency
    /// Period = 0.05 s ≈ 2205 frames @ 44.1kHz
    pub fn low_latency() -> Self {
        StreamConfig {
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: DEFAULT_CHANNELS,
            suggested_latency: 0.05,
        }
    }

    /// Create a streaming configuration optimized for stability
    /// Period = 0.2 s = 8820 frames @ 44.1kHz
    pub fn stable() -> Self {
        StreamConfig {
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: DEFAULT_CHANNELS,
            suggested_latency: 0.2,
        }
    }

    /// Same configuration with a different suggested latency
    pub fn with_latency(self, suggested_latency: f32) -> Self {
        StreamConfig {
            suggested_latency,
            ..self
        }
    }

    /// Frames drained per period (at least one)
    pub fn frames_per_period(&self) -> usize {
        ((self.suggested_latency * self.sample_rate as f32).round() as usize).max(1)
    }

    /// Interleaved samples drained per period
    pub fn samples_per_period(&self) -> usize {
        self.frames_per_period()
            .saturating_mul(self.channels as usize)
    }

    /// Check that this is the fixed output format with a usable latency
    ///
    /// The stream always runs at 16-bit, [`DEFAULT_CHANNELS`] channels and
    /// [`DEFAULT_SAMPLE_RATE`] Hz. The latency must lie in
    /// `0..=MAX_SUGGESTED_LATENCY` seconds.
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate != DEFAULT_SAMPLE_RATE || self.channels != DEFAULT_CHANNELS {
            return Err(MixerError::Config(format!(
                "unsupported stream format: {} Hz, {} channel(s); the output is fixed at {} Hz, {} channel(s)",
                self.sample_rate, self.channels, DEFAULT_SAMPLE_RATE, DEFAULT_CHANNELS
            )));
        }
        if !(0.0..=MAX_SUGGESTED_LATENCY).contains(&self.suggested_latency) {
            return Err(MixerError::Config(format!(
                "suggested_latency must be between 0 and {} seconds, got {}",
                MAX_SUGGESTED_LATENCY, self.suggested_latency
            )));
        }
        Ok(())
    }

    /// Get latency in milliseconds
    pub fn latency_ms(&self) -> f32 {
        self.suggested_latency * 1000.0
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self::stable()
    }
}
