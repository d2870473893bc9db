//! Circular Mix Buffer Domain
//!
//! The single piece of shared mix state: a fixed-capacity ring of saturated
//! 16-bit sums, written by the scheduling path and cleared by the drain path.

pub mod mix_buffer;

pub use mix_buffer::{saturating_mix, RingMixBuffer, SAMPLE_CLIP_MAX, SAMPLE_CLIP_MIN};
