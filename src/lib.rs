//! Push-model PCM sound mixer
//!
//! Mixes pre-loaded 16-bit PCM clips into a single stream for a hardware
//! output device. Mixing happens once, when a sound is scheduled: its samples
//! are saturating-added into a shared circular buffer starting at the drain
//! cursor. The real-time audio callback only copies out and clears the next
//! period of that buffer.
//!
//! # Features
//! - Polyphonic mixing with no per-voice bookkeeping (the ring is the mix state)
//! - Saturation to `[-32767, 32767]` on every mix-add
//! - Wraparound writes and drains split into at most two contiguous ranges
//! - Bounded critical sections: long sounds are mixed in chunks
//! - WAV loading through a pluggable decoder (`hound` by default)
//! - Offline rendering of the drained stream to WAV
//!
//! # Crate feature flags
//! - `streaming` (opt-in): Real-time audio output (enables optional `rodio` dep)
//!
//! # Quick start
//! ## Offline (no audio device)
//! ```no_run
//! use ringmix::{Mixer, MixerConfig};
//! let mixer = Mixer::new(MixerConfig::default()).unwrap();
//! let shot = mixer.load("shot.wav").unwrap();
//! mixer.play(shot).unwrap();
//! let mut period = vec![0i16; 1024];
//! mixer.drain().fill(&mut period);
//! ```
//!
//! ## Real-time streaming
//! ```no_run
//! # #[cfg(feature = "streaming")]
//! # {
//! use ringmix::{Mixer, MixerConfig};
//! let mut mixer = Mixer::new(MixerConfig::default()).unwrap();
//! mixer.start(0.2).unwrap();
//! let shot = mixer.load("shot.wav").unwrap();
//! mixer.play(shot).unwrap();
//! std::thread::sleep(std::time::Duration::from_secs(2));
//! mixer.terminate();
//! # }
//! ```

#![warn(missing_docs)]

pub mod config; // Mixer and stream configuration
pub mod export; // Offline WAV rendering
pub mod library; // Sound loading and registry
pub mod mixer; // Mixer context (play, init, terminate)
pub mod ring; // Circular mix buffer
pub mod streaming; // Drain path and audio output

/// Error types for mixer operations
#[derive(thiserror::Error, Debug)]
pub enum MixerError {
    /// The audio output device could not be opened or started
    #[error("Audio device initialization failed: {0}")]
    InitializationFailure(String),

    /// A loaded sound does not match the fixed PCM contract
    #[error(
        "Format mismatch: expected 16-bit, {expected_channels} channel(s), {expected_sample_rate} Hz; \
         got {bits_per_sample}-bit, {channels} channel(s), {sample_rate} Hz"
    )]
    FormatMismatch {
        /// Bits per sample found in the file
        bits_per_sample: u16,
        /// Channel count found in the file
        channels: u16,
        /// Sample rate found in the file
        sample_rate: u32,
        /// Channel count the output stream runs at
        expected_channels: u16,
        /// Sample rate the output stream runs at
        expected_sample_rate: u32,
    },

    /// IO error from filesystem
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The sound container could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// `play` was called with a handle that `load` never returned
    #[error("Invalid sound handle: {0}")]
    InvalidHandle(library::SoundHandle),

    /// The sound registry has reached its configured maximum
    #[error("Sound registry full ({max} sounds)")]
    RegistryFull {
        /// Configured maximum number of sounds
        max: usize,
    },

    /// A sound is longer than the mix buffer and would alias against itself
    #[error("Sound of {length} samples exceeds mix buffer capacity of {capacity} samples")]
    CapacityExceeded {
        /// Sound length in samples
        length: usize,
        /// Mix buffer capacity in samples
        capacity: usize,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<hound::Error> for MixerError {
    fn from(err: hound::Error) -> Self {
        match err {
            hound::Error::IoError(io) => MixerError::Io(io),
            other => MixerError::Decode(other.to_string()),
        }
    }
}

/// Result type for mixer operations
pub type Result<T> = std::result::Result<T, MixerError>;

// Public API exports
pub use config::MixerConfig;
pub use export::{render_to_wav, WavRenderer};
pub use library::{DecodedWave, HoundDecoder, Sound, SoundHandle, SoundLibrary, WaveDecoder};
pub use mixer::{Mixer, MixerHandle, MixerStats};
pub use ring::RingMixBuffer;
#[cfg(feature = "streaming")]
pub use streaming::AudioDevice;
pub use streaming::{DrainStats, DrainStatus, StreamConfig, StreamDrain};
