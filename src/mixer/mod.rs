//! Mixer context
//!
//! Owns the sound library, the shared mix buffer and (with the `streaming`
//! feature) the output device. Replaces process-wide state: create one
//! [`Mixer`] at startup and hand [`MixerHandle`]s to the threads that load
//! and play sounds.
//!
//! `play` is push-model: the whole sound is mixed into the ring at the drain
//! cursor when it is scheduled. Overlapping plays simply accumulate, so
//! there is no per-voice state anywhere. Long sounds are mixed in chunks of
//! [`MixerConfig::mix_chunk_samples`], re-taking the lock for each chunk, so
//! the rendering thread never waits behind a full multi-second scan.

use crate::config::MixerConfig;
use crate::library::{DecodedWave, SoundHandle, SoundLibrary, WaveDecoder};
use crate::ring::RingMixBuffer;
#[cfg(feature = "streaming")]
use crate::streaming::AudioDevice;
use crate::streaming::{DrainStats, StreamDrain};
use crate::{MixerError, Result};
use parking_lot::Mutex;
use std::io::Read;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Mixer statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MixerStats {
    /// Number of sounds in the library
    pub sounds_loaded: usize,
    /// Number of successful `play` calls
    pub plays: u64,
    /// Samples dropped because the drain passed them before they were mixed
    pub late_samples: u64,
    /// Drain path counters
    pub drain: DrainStats,
}

struct Shared {
    config: MixerConfig,
    library: SoundLibrary,
    ring: Arc<Mutex<RingMixBuffer>>,
    drain: StreamDrain,
    plays: AtomicU64,
    late_samples: AtomicU64,
}

/// Thread-safe handle for loading and playing sounds
///
/// Cheap to clone; all clones drive the same mixer.
#[derive(Clone)]
pub struct MixerHandle {
    shared: Arc<Shared>,
}

impl MixerHandle {
    /// Load a WAV file through the library's decoder
    pub fn load(&self, path: impl AsRef<Path>) -> Result<SoundHandle> {
        self.shared.library.load(path)
    }

    /// Load a WAV stream from memory or any other reader
    pub fn load_from_reader<R: Read>(&self, reader: R) -> Result<SoundHandle> {
        self.shared.library.load_from_reader(reader)
    }

    /// Register already-decoded PCM
    pub fn register(&self, wave: DecodedWave) -> Result<SoundHandle> {
        self.shared.library.register(wave)
    }

    /// Schedule a sound to start at the current drain cursor
    ///
    /// # Errors
    /// - [`MixerError::InvalidHandle`] if `handle` was never returned by a load
    /// - [`MixerError::CapacityExceeded`] if the sound is longer than the mix buffer
    pub fn play(&self, handle: SoundHandle) -> Result<()> {
        let shared = &*self.shared;
        let sound = shared.library.get(handle)?;

        let capacity = shared.config.capacity;
        if sound.len() > capacity {
            return Err(MixerError::CapacityExceeded {
                length: sound.len(),
                capacity,
            });
        }

        let origin = shared.ring.lock().drained_total();
        self.schedule_at(handle, sound.samples(), origin);
        Ok(())
    }

    /// Mix `samples` starting at absolute stream position `origin`
    ///
    /// Chunks the drain has already passed are dropped and counted in
    /// [`MixerStats::late_samples`].
    fn schedule_at(&self, handle: SoundHandle, samples: &[i16], origin: u64) {
        let shared = &*self.shared;
        let chunk_len = match shared.config.mix_chunk_samples {
            0 => samples.len().max(1),
            n => n,
        };

        // Later chunks land relative to the pinned origin even if periods
        // were drained in between
        let mut late = 0usize;
        for (index, chunk) in samples.chunks(chunk_len).enumerate() {
            let mut ring = shared.ring.lock();
            late += ring.mix_add_at(origin + (index * chunk_len) as u64, chunk);
        }

        shared.plays.fetch_add(1, Ordering::Relaxed);
        if late > 0 {
            shared
                .late_samples
                .fetch_add(late as u64, Ordering::Relaxed);
            tracing::warn!(%handle, late, "drain overtook scheduling, late samples dropped");
        }

        tracing::debug!(%handle, samples = samples.len(), "sound scheduled");
    }

    /// Silence everything scheduled but not yet drained
    pub fn stop_all(&self) {
        self.shared.ring.lock().clear();
        tracing::debug!("mix buffer cleared");
    }

    /// Number of loaded sounds
    pub fn sound_count(&self) -> usize {
        self.shared.library.len()
    }

    /// Get current mixer statistics
    pub fn stats(&self) -> MixerStats {
        MixerStats {
            sounds_loaded: self.shared.library.len(),
            plays: self.shared.plays.load(Ordering::Relaxed),
            late_samples: self.shared.late_samples.load(Ordering::Relaxed),
            drain: self.shared.drain.stats(),
        }
    }

    /// Drain side of the mix buffer, for custom outputs and offline rendering
    pub fn drain(&self) -> StreamDrain {
        self.shared.drain.clone()
    }

    /// Get the mixer configuration
    pub fn config(&self) -> &MixerConfig {
        &self.shared.config
    }
}

/// Mixer context: library, mix buffer and output stream
pub struct Mixer {
    handle: MixerHandle,
    #[cfg(feature = "streaming")]
    device: Option<AudioDevice>,
}

impl Mixer {
    /// Initialize the core state: zero-filled mix buffer, empty library.
    ///
    /// No audio device is opened; see `start` (feature `streaming`) or drive
    /// [`Mixer::drain`] yourself.
    pub fn new(config: MixerConfig) -> Result<Self> {
        let library =
            SoundLibrary::new(config.max_sounds, &config.stream).with_max_length(config.capacity);
        Self::with_library(config, library)
    }

    /// Like [`Mixer::new`] with a custom WAV decoder
    pub fn with_decoder(config: MixerConfig, decoder: impl WaveDecoder + 'static) -> Result<Self> {
        let library = SoundLibrary::new(config.max_sounds, &config.stream)
            .with_max_length(config.capacity)
            .with_decoder(decoder);
        Self::with_library(config, library)
    }

    fn with_library(config: MixerConfig, library: SoundLibrary) -> Result<Self> {
        config.validate()?;

        let ring = Arc::new(Mutex::new(RingMixBuffer::new(config.capacity)?));
        let drain = StreamDrain::new(Arc::clone(&ring));

        tracing::debug!(
            capacity = config.capacity,
            max_sounds = config.max_sounds,
            mix_chunk_samples = config.mix_chunk_samples,
            "mixer initialized"
        );

        Ok(Mixer {
            handle: MixerHandle {
                shared: Arc::new(Shared {
                    config,
                    library,
                    ring,
                    drain,
                    plays: AtomicU64::new(0),
                    late_samples: AtomicU64::new(0),
                }),
            },
            #[cfg(feature = "streaming")]
            device: None,
        })
    }

    /// Open the default output device and start continuous rendering
    ///
    /// The suggested latency (seconds) sets the drain period. Calling this
    /// while already streaming is a no-op.
    ///
    /// # Errors
    /// [`MixerError::InitializationFailure`] if the device cannot be opened.
    #[cfg(feature = "streaming")]
    pub fn start(&mut self, suggested_latency: f32) -> Result<()> {
        if self.device.is_some() {
            tracing::warn!("audio output already running");
            return Ok(());
        }

        let stream = self
            .handle
            .config()
            .stream
            .with_latency(suggested_latency);
        stream.validate()?;

        self.device = Some(AudioDevice::new(&stream, self.handle.drain())?);
        Ok(())
    }

    /// Whether an output device is currently attached
    #[cfg(feature = "streaming")]
    pub fn is_streaming(&self) -> bool {
        self.device.as_ref().is_some_and(AudioDevice::is_running)
    }

    /// Stop the stream, release the device and free all sound data
    pub fn terminate(self) {
        let stats = self.stats();
        tracing::info!(
            sounds = stats.sounds_loaded,
            plays = stats.plays,
            samples_drained = stats.drain.samples_drained,
            "mixer terminated"
        );
    }

    /// Thread-safe handle for loading and playing from other threads
    pub fn handle(&self) -> MixerHandle {
        self.handle.clone()
    }

    /// Load a WAV file (see [`MixerHandle::load`])
    pub fn load(&self, path: impl AsRef<Path>) -> Result<SoundHandle> {
        self.handle.load(path)
    }

    /// Load a WAV stream (see [`MixerHandle::load_from_reader`])
    pub fn load_from_reader<R: Read>(&self, reader: R) -> Result<SoundHandle> {
        self.handle.load_from_reader(reader)
    }

    /// Register decoded PCM (see [`MixerHandle::register`])
    pub fn register(&self, wave: DecodedWave) -> Result<SoundHandle> {
        self.handle.register(wave)
    }

    /// Schedule a sound (see [`MixerHandle::play`])
    pub fn play(&self, handle: SoundHandle) -> Result<()> {
        self.handle.play(handle)
    }

    /// Silence everything not yet drained
    pub fn stop_all(&self) {
        self.handle.stop_all()
    }

    /// Number of loaded sounds
    pub fn sound_count(&self) -> usize {
        self.handle.sound_count()
    }

    /// Get current mixer statistics
    pub fn stats(&self) -> MixerStats {
        self.handle.stats()
    }

    /// Drain side of the mix buffer
    pub fn drain(&self) -> StreamDrain {
        self.handle.drain()
    }

    /// Get the mixer configuration
    pub fn config(&self) -> &MixerConfig {
        self.handle.config()
    }
}

impl Drop for Mixer {
    fn drop(&mut self) {
        #[cfg(feature = "streaming")]
        {
            if let Some(device) = self.device.take() {
                device.stop();
            }
        }
        self.handle.shared.drain.close();
    }
}
