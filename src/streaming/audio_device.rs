//! Audio device integration using rodio
//!
//! rodio pulls samples from a [`Source`] on its output thread. [`MixSource`]
//! serves those pulls one period at a time: whenever its period buffer runs
//! out it calls [`StreamDrain::fill`] for the next `frames * channels` samples.

use super::{DrainStatus, StreamConfig, StreamDrain};
use crate::{MixerError, Result};
use rodio::{OutputStream, Sink, Source};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Audio source that drains the shared mix buffer period by period
struct MixSource {
    drain: StreamDrain,
    sample_rate: u32,
    channels: u16,
    /// One period of drained samples
    period: Vec<i16>,
    /// Current position in the period
    period_pos: usize,
    /// Set once the drain reported completion
    complete: bool,
}

impl MixSource {
    fn new(drain: StreamDrain, config: &StreamConfig) -> Self {
        let period_len = config.samples_per_period();
        MixSource {
            drain,
            sample_rate: config.sample_rate,
            channels: config.channels,
            period: vec![0; period_len],
            period_pos: period_len, // Start by draining a fresh period
            complete: false,
        }
    }
}

impl Source for MixSource {
    fn current_frame_len(&self) -> Option<usize> {
        // Parameters never change mid-stream; report what is left of the period
        let remaining = self.period.len() - self.period_pos;
        if remaining > 0 {
            Some(remaining)
        } else {
            Some(self.period.len())
        }
    }

    fn channels(&self) -> u16 {
        self.channels
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        None
    }
}

impl Iterator for MixSource {
    type Item = i16;

    fn next(&mut self) -> Option<i16> {
        if self.complete {
            return None;
        }

        if self.period_pos >= self.period.len() {
            if self.drain.fill(&mut self.period) == DrainStatus::Complete {
                self.complete = true;
                return None;
            }
            self.period_pos = 0;
        }

        let sample = self.period[self.period_pos];
        self.period_pos += 1;
        Some(sample)
    }
}

/// Audio playback device using rodio
pub struct AudioDevice {
    _stream: OutputStream,
    sink: Sink,
    drain: StreamDrain,
    running: Arc<AtomicBool>,
}

impl AudioDevice {
    /// Open the default output device and start draining into it
    ///
    /// # Arguments
    /// * `config` - Output format and suggested latency (period size)
    /// * `drain` - Drain over the shared mix buffer
    ///
    /// # Errors
    /// - [`MixerError::Config`] if `config` is not the fixed output format
    /// - [`MixerError::InitializationFailure`] if no output stream or sink can be created
    pub fn new(config: &StreamConfig, drain: StreamDrain) -> Result<Self> {
        config.validate()?;

        let (stream, stream_handle) = OutputStream::try_default().map_err(|e| {
            MixerError::InitializationFailure(format!("Failed to create audio stream: {}", e))
        })?;

        let sink = Sink::try_new(&stream_handle).map_err(|e| {
            MixerError::InitializationFailure(format!("Failed to create audio sink: {}", e))
        })?;

        sink.append(MixSource::new(drain.clone(), config));

        tracing::info!(
            sample_rate = config.sample_rate,
            channels = config.channels,
            frames_per_period = config.frames_per_period(),
            "audio output started"
        );

        Ok(AudioDevice {
            _stream: stream,
            sink,
            drain,
            running: Arc::new(AtomicBool::new(true)),
        })
    }

    /// Pause playback
    pub fn pause(&self) {
        self.sink.pause();
    }

    /// Resume playback
    pub fn play(&self) {
        self.sink.play();
    }

    /// Check if audio device is running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Stop the stream: close the drain and release the sink
    pub fn stop(&self) {
        if self.running.swap(false, Ordering::Relaxed) {
            self.drain.close();
            self.sink.stop();
            tracing::info!("audio output stopped");
        }
    }
}

impl Drop for AudioDevice {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ring::RingMixBuffer;
    use parking_lot::Mutex;

    fn shared_drain(capacity: usize) -> (StreamDrain, Arc<Mutex<RingMixBuffer>>) {
        let ring = Arc::new(Mutex::new(
            RingMixBuffer::new(capacity).expect("Failed to create mix buffer"),
        ));
        (StreamDrain::new(Arc::clone(&ring)), ring)
    }

    fn try_audio_device(config: StreamConfig) -> Option<AudioDevice> {
        let (drain, _ring) = shared_drain(44100);
        match AudioDevice::new(&config, drain) {
            Ok(device) => Some(device),
            Err(err) => {
                eprintln!(
                    "Skipping streaming::audio_device test (audio backend unavailable): {}",
                    err
                );
                None
            }
        }
    }

    #[test]
    fn test_audio_device_creation() {
        let Some(device) = try_audio_device(StreamConfig::low_latency()) else {
            return;
        };
        assert!(
            device.is_running(),
            "Audio device should be running after creation"
        );
    }

    #[test]
    fn test_stop_closes_drain() {
        let Some(device) = try_audio_device(StreamConfig::low_latency()) else {
            return;
        };
        device.stop();
        assert!(!device.is_running());
        assert!(device.drain.is_closed());
    }

    #[test]
    fn test_mix_source_reports_format() {
        let (drain, _ring) = shared_drain(4096);
        let source = MixSource::new(drain, &StreamConfig::stable());

        assert_eq!(source.sample_rate(), 44100);
        assert_eq!(source.channels(), 2);
        assert_eq!(source.current_frame_len(), Some(17640));
    }

    #[test]
    fn test_mix_source_drains_one_period_at_a_time() {
        let (drain, ring) = shared_drain(64);
        ring.lock().mix_add(0, &[3, 4, 5, 6]);

        // 2 frames of stereo per period
        let config = StreamConfig {
            sample_rate: 2,
            channels: 2,
            suggested_latency: 1.0,
        };
        let mut source = MixSource::new(drain, &config);

        assert_eq!(source.next(), Some(3));
        assert_eq!(ring.lock().drain_position(), 4);
        assert_eq!(source.next(), Some(4));
        assert_eq!(source.next(), Some(5));
        assert_eq!(source.next(), Some(6));
        assert_eq!(ring.lock().drain_position(), 4);

        // Next period is silence
        assert_eq!(source.next(), Some(0));
        assert_eq!(ring.lock().drain_position(), 8);
    }

    #[test]
    fn test_mix_source_ends_after_close() {
        let (drain, _ring) = shared_drain(64);
        let mut source = MixSource::new(drain.clone(), &StreamConfig::low_latency());

        assert_eq!(source.next(), Some(0));
        drain.close();

        // Rest of the current period still plays out, then the source ends
        let remaining = source.period.len() - source.period_pos;
        for _ in 0..remaining {
            assert!(source.next().is_some());
        }
        assert_eq!(source.next(), None);
        assert_eq!(source.next(), None);
    }
}
