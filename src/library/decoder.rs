//! WAV decoding
//!
//! The library never parses containers itself. A [`WaveDecoder`] turns a
//! resource into raw interleaved PCM plus its format metadata, and the
//! library decides whether that format is acceptable.

use crate::streaming::BITS_PER_SAMPLE;
use crate::Result;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Raw PCM and format metadata produced by a decoder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedWave {
    /// Interleaved samples
    pub samples: Vec<i16>,
    /// Bits per sample in the source container
    pub bits_per_sample: u16,
    /// Number of interleaved channels
    pub channels: u16,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Size of the PCM data chunk in bytes
    pub byte_size: usize,
}

/// Turns a sound resource into raw PCM
pub trait WaveDecoder: Send + Sync {
    /// Decode the resource at `path`
    fn decode(&self, path: &Path) -> Result<DecodedWave>;
}

/// WAV decoder backed by `hound`
#[derive(Debug, Clone, Copy, Default)]
pub struct HoundDecoder;

impl HoundDecoder {
    /// Decode a WAV stream from any reader.
    ///
    /// Sample data is only read for 16-bit integer PCM. For any other
    /// width only the metadata is returned, since such input can never pass
    /// the library's format check.
    pub fn decode_reader<R: Read>(reader: R) -> Result<DecodedWave> {
        let wav = hound::WavReader::new(reader)?;
        let spec = wav.spec();
        let byte_size = wav.len() as usize * ((spec.bits_per_sample as usize + 7) / 8);

        let pcm16 =
            spec.sample_format == hound::SampleFormat::Int && spec.bits_per_sample == BITS_PER_SAMPLE;
        let samples = if pcm16 {
            wav.into_samples::<i16>()
                .collect::<std::result::Result<Vec<_>, _>>()?
        } else {
            Vec::new()
        };

        Ok(DecodedWave {
            samples,
            bits_per_sample: spec.bits_per_sample,
            channels: spec.channels,
            sample_rate: spec.sample_rate,
            byte_size,
        })
    }
}

impl WaveDecoder for HoundDecoder {
    fn decode(&self, path: &Path) -> Result<DecodedWave> {
        let file = File::open(path)?;
        Self::decode_reader(BufReader::new(file))
    }
}
