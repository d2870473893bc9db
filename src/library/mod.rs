//! Sound Library Domain
//!
//! Loads WAV files into immutable 16-bit PCM sounds and hands out dense,
//! never-reused integer handles. Decoding is delegated to a [`WaveDecoder`];
//! the library only enforces the output format contract.

pub mod decoder;
pub mod registry;

pub use decoder::{DecodedWave, HoundDecoder, WaveDecoder};
pub use registry::{Sound, SoundHandle, SoundLibrary};
