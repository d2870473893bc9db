//! Append-only sound registry

use super::decoder::{DecodedWave, HoundDecoder, WaveDecoder};
use crate::streaming::{StreamConfig, BITS_PER_SAMPLE};
use crate::{MixerError, Result};
use parking_lot::RwLock;
use std::fmt;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

/// Stable identifier of a loaded sound.
///
/// Handles are dense, start at 0 and are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SoundHandle(u32);

impl SoundHandle {
    /// Build a handle from its raw index
    pub const fn from_raw(index: u32) -> Self {
        SoundHandle(index)
    }

    /// Registry index of this handle
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SoundHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Immutable interleaved 16-bit PCM clip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sound {
    samples: Box<[i16]>,
}

impl Sound {
    /// Wrap already-validated samples
    pub fn new(samples: Vec<i16>) -> Self {
        Sound {
            samples: samples.into_boxed_slice(),
        }
    }

    /// Interleaved sample data
    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    /// Length in samples (not frames)
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the sound holds no samples
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Registry of loaded sounds addressed by [`SoundHandle`]
pub struct SoundLibrary {
    sounds: RwLock<Vec<Arc<Sound>>>,
    max_sounds: usize,
    /// Longest accepted sound in samples
    max_length: Option<usize>,
    channels: u16,
    sample_rate: u32,
    decoder: Box<dyn WaveDecoder>,
}

impl SoundLibrary {
    /// Create an empty library accepting sounds in the stream's format
    pub fn new(max_sounds: usize, stream: &StreamConfig) -> Self {
        SoundLibrary {
            sounds: RwLock::new(Vec::new()),
            max_sounds,
            max_length: None,
            channels: stream.channels,
            sample_rate: stream.sample_rate,
            decoder: Box::new(HoundDecoder),
        }
    }

    /// Replace the WAV decoder
    pub fn with_decoder(mut self, decoder: impl WaveDecoder + 'static) -> Self {
        self.decoder = Box::new(decoder);
        self
    }

    /// Reject sounds longer than `max_length` samples
    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    /// Decode the file at `path` and register it
    pub fn load(&self, path: impl AsRef<Path>) -> Result<SoundHandle> {
        let path = path.as_ref();
        self.ensure_room()?;

        let wave = self.decoder.decode(path)?;
        let handle = self.register(wave)?;

        tracing::debug!(%handle, path = %path.display(), "sound loaded");
        Ok(handle)
    }

    /// Decode a WAV stream with `hound` and register it
    pub fn load_from_reader<R: Read>(&self, reader: R) -> Result<SoundHandle> {
        self.ensure_room()?;
        self.register(HoundDecoder::decode_reader(reader)?)
    }

    /// Validate decoded PCM against the output format and append it
    pub fn register(&self, wave: DecodedWave) -> Result<SoundHandle> {
        self.validate(&wave)?;

        let mut sounds = self.sounds.write();
        if sounds.len() >= self.max_sounds {
            return Err(MixerError::RegistryFull {
                max: self.max_sounds,
            });
        }

        let index = u32::try_from(sounds.len()).map_err(|_| MixerError::RegistryFull {
            max: self.max_sounds,
        })?;
        let handle = SoundHandle(index);
        sounds.push(Arc::new(Sound::new(wave.samples)));
        Ok(handle)
    }

    fn ensure_room(&self) -> Result<()> {
        if self.sounds.read().len() >= self.max_sounds {
            return Err(MixerError::RegistryFull {
                max: self.max_sounds,
            });
        }
        Ok(())
    }

    fn validate(&self, wave: &DecodedWave) -> Result<()> {
        if wave.bits_per_sample != BITS_PER_SAMPLE
            || wave.channels != self.channels
            || wave.sample_rate != self.sample_rate
        {
            return Err(MixerError::FormatMismatch {
                bits_per_sample: wave.bits_per_sample,
                channels: wave.channels,
                sample_rate: wave.sample_rate,
                expected_channels: self.channels,
                expected_sample_rate: self.sample_rate,
            });
        }

        if let Some(capacity) = self.max_length {
            if wave.samples.len() > capacity {
                return Err(MixerError::CapacityExceeded {
                    length: wave.samples.len(),
                    capacity,
                });
            }
        }

        Ok(())
    }

    /// Look up a loaded sound
    pub fn get(&self, handle: SoundHandle) -> Result<Arc<Sound>> {
        self.sounds
            .read()
            .get(handle.index())
            .cloned()
            .ok_or(MixerError::InvalidHandle(handle))
    }

    /// Number of loaded sounds
    pub fn len(&self) -> usize {
        self.sounds.read().len()
    }

    /// Whether no sound has been loaded yet
    pub fn is_empty(&self) -> bool {
        self.sounds.read().is_empty()
    }
}

impl fmt::Debug for SoundLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SoundLibrary")
            .field("loaded", &self.len())
            .field("max_sounds", &self.max_sounds)
            .field("max_length", &self.max_length)
            .field("channels", &self.channels)
            .field("sample_rate", &self.sample_rate)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Decoder returning a fixed wave and counting calls
    struct StubDecoder {
        wave: DecodedWave,
        calls: Arc<AtomicUsize>,
    }

    impl WaveDecoder for StubDecoder {
        fn decode(&self, _path: &Path) -> Result<DecodedWave> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            Ok(self.wave.clone())
        }
    }

    fn wave(bits_per_sample: u16, channels: u16, sample_rate: u32, samples: Vec<i16>) -> DecodedWave {
        DecodedWave {
            byte_size: samples.len() * 2,
            samples,
            bits_per_sample,
            channels,
            sample_rate,
        }
    }

    fn library(max_sounds: usize) -> SoundLibrary {
        SoundLibrary::new(max_sounds, &StreamConfig::default())
    }

    #[test]
    fn test_handles_are_dense() {
        let lib = library(8);
        let a = lib.register(wave(16, 2, 44100, vec![1, 2])).unwrap();
        let b = lib.register(wave(16, 2, 44100, vec![3, 4, 5, 6])).unwrap();

        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(lib.len(), 2);
        assert_eq!(lib.get(b).unwrap().samples(), &[3, 4, 5, 6]);
    }

    #[test]
    fn test_format_mismatch_registers_nothing() {
        let lib = library(8);

        for bad in [
            wave(16, 1, 44100, vec![1]),
            wave(8, 2, 44100, vec![1, 2]),
            wave(16, 2, 48000, vec![1, 2]),
        ] {
            let err = lib.register(bad).unwrap_err();
            assert!(matches!(err, MixerError::FormatMismatch { .. }));
        }
        assert!(lib.is_empty());
    }

    #[test]
    fn test_load_uses_decoder() {
        let calls = Arc::new(AtomicUsize::new(0));
        let lib = library(4).with_decoder(StubDecoder {
            wave: wave(16, 2, 44100, vec![7; 10]),
            calls: Arc::clone(&calls),
        });

        let handle = lib.load("anything.wav").unwrap();
        assert_eq!(calls.load(Ordering::Relaxed), 1);
        assert_eq!(lib.get(handle).unwrap().len(), 10);
    }

    #[test]
    fn test_mono_load_is_rejected() {
        let calls = Arc::new(AtomicUsize::new(0));
        let lib = library(4).with_decoder(StubDecoder {
            wave: wave(16, 1, 44100, vec![7; 10]),
            calls,
        });

        let err = lib.load("mono.wav").unwrap_err();
        assert!(err.to_string().contains("1 channel(s)"));
        assert!(lib.is_empty());
    }

    #[test]
    fn test_registry_full() {
        let calls = Arc::new(AtomicUsize::new(0));
        let lib = library(2).with_decoder(StubDecoder {
            wave: wave(16, 2, 44100, vec![1, 1]),
            calls: Arc::clone(&calls),
        });

        lib.load("a.wav").unwrap();
        lib.load("b.wav").unwrap();
        let err = lib.load("c.wav").unwrap_err();

        assert!(matches!(err, MixerError::RegistryFull { max: 2 }));
        // Third file is never decoded
        assert_eq!(calls.load(Ordering::Relaxed), 2);
        assert_eq!(lib.len(), 2);
    }

    #[test]
    fn test_sound_longer_than_limit_rejected() {
        let lib = library(4).with_max_length(4);
        let err = lib.register(wave(16, 2, 44100, vec![0; 6])).unwrap_err();
        assert!(matches!(
            err,
            MixerError::CapacityExceeded {
                length: 6,
                capacity: 4
            }
        ));
        assert!(lib.register(wave(16, 2, 44100, vec![0; 4])).is_ok());
    }

    #[test]
    fn test_unknown_handle() {
        let lib = library(4);
        let err = lib.get(SoundHandle::from_raw(3)).unwrap_err();
        assert!(matches!(err, MixerError::InvalidHandle(h) if h.index() == 3));
        assert_eq!(err.to_string(), "Invalid sound handle: #3");
    }
}
