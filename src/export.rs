//! Offline rendering
//!
//! Drives the same drain path the audio device uses, period by period, and
//! writes the result to a 16-bit WAV file instead of a speaker.

use crate::streaming::{StreamConfig, StreamDrain, BITS_PER_SAMPLE};
use crate::Result;
use hound::{SampleFormat, WavSpec, WavWriter};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Drains a mix buffer into a WAV file
pub struct WavRenderer {
    writer: WavWriter<BufWriter<File>>,
    drain: StreamDrain,
    channels: u16,
    /// One period of interleaved samples
    period: Vec<i16>,
    frames_written: u64,
}

impl WavRenderer {
    /// Create the output file; periods are sized from `config`
    ///
    /// # Errors
    /// [`MixerError::Config`](crate::MixerError::Config) if `config` is not the
    /// fixed output format or its latency is out of range.
    pub fn create(path: impl AsRef<Path>, drain: StreamDrain, config: &StreamConfig) -> Result<Self> {
        config.validate()?;
        let spec = WavSpec {
            channels: config.channels,
            sample_rate: config.sample_rate,
            bits_per_sample: BITS_PER_SAMPLE,
            sample_format: SampleFormat::Int,
        };
        let writer = WavWriter::create(path, spec)?;

        Ok(WavRenderer {
            writer,
            drain,
            channels: config.channels,
            period: vec![0; config.samples_per_period()],
            frames_written: 0,
        })
    }

    /// Drain `frames` frames and append them to the file
    pub fn render_frames(&mut self, frames: usize) -> Result<()> {
        let frames_per_period = self.period.len() / self.channels as usize;
        let mut remaining = frames;

        while remaining > 0 {
            let frames = remaining.min(frames_per_period);
            let samples = frames * self.channels as usize;

            self.drain.render_period(frames, self.channels, &mut self.period);
            for &sample in &self.period[..samples] {
                self.writer.write_sample(sample)?;
            }

            remaining -= frames;
            self.frames_written += frames as u64;
        }

        Ok(())
    }

    /// Frames written so far
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Flush and close the file, returning the number of frames written
    pub fn finalize(self) -> Result<u64> {
        self.writer.finalize()?;
        tracing::debug!(frames = self.frames_written, "render finalized");
        Ok(self.frames_written)
    }
}

/// Drain `frames` frames into a new WAV file at `path`
pub fn render_to_wav(
    drain: StreamDrain,
    path: impl AsRef<Path>,
    frames: usize,
    config: &StreamConfig,
) -> Result<u64> {
    let mut renderer = WavRenderer::create(path, drain, config)?;
    renderer.render_frames(frames)?;
    renderer.finalize()
}
