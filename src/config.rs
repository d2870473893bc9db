//! Mixer configuration
//!
//! Loaded from JSON or built in code. Every field has a default, so a config
//! file only needs the values it changes.

use crate::streaming::StreamConfig;
use crate::{MixerError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default mix buffer capacity in samples (≈ 11.3 s of stereo at 44.1 kHz)
pub const DEFAULT_CAPACITY: usize = 1_000_000;

/// Default maximum number of loaded sounds
pub const DEFAULT_MAX_SOUNDS: usize = 256;

/// Largest `max_sounds` a handle can index
pub const MAX_SOUNDS_LIMIT: usize = u32::MAX as usize;

/// Default number of samples mixed per lock acquisition
pub const DEFAULT_MIX_CHUNK_SAMPLES: usize = 8192;

/// Configuration of the mixer context
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MixerConfig {
    /// Mix buffer capacity in samples.
    /// Also the longest sound that can be loaded.
    pub capacity: usize,

    /// Maximum number of sounds the library accepts
    pub max_sounds: usize,

    /// Samples mixed per critical section when scheduling a sound.
    /// 0 mixes the whole sound under one lock.
    pub mix_chunk_samples: usize,

    /// Output stream format and latency
    pub stream: StreamConfig,
}

impl Default for MixerConfig {
    fn default() -> Self {
        MixerConfig {
            capacity: DEFAULT_CAPACITY,
            max_sounds: DEFAULT_MAX_SOUNDS,
            mix_chunk_samples: DEFAULT_MIX_CHUNK_SAMPLES,
            stream: StreamConfig::default(),
        }
    }
}

impl MixerConfig {
    /// Parse a JSON configuration
    pub fn from_json(json: &str) -> Result<Self> {
        let config: MixerConfig = serde_json::from_str(json)
            .map_err(|e| MixerError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON configuration file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Check the configuration for values the mixer cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(MixerError::Config("capacity must be greater than 0".into()));
        }
        if self.max_sounds == 0 {
            return Err(MixerError::Config(
                "max_sounds must be greater than 0".into(),
            ));
        }
        if self.max_sounds > MAX_SOUNDS_LIMIT {
            return Err(MixerError::Config(format!(
                "max_sounds must be at most {}, got {}",
                MAX_SOUNDS_LIMIT, self.max_sounds
            )));
        }
        self.stream.validate()
    }
}
