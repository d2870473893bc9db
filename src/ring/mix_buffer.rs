//! Ring buffer accumulating mixed samples
//!
//! Two paths touch the buffer:
//! - Scheduling path: saturating-adds a whole sound starting at the drain cursor
//! - Drain path: copies out the next period, zeroes it, and advances the cursor
//!
//! Cells ahead of the cursor hold the saturated sum of every sound scheduled
//! over them; cells already drained hold zero until a new mix-add lands.
//! Memory consumption is fixed at `capacity * size_of::<i16>()`.
//!
//! The buffer itself is not synchronized. Callers share it behind a
//! `parking_lot::Mutex` (see [`crate::mixer`] and [`crate::streaming`]).

use crate::{MixerError, Result};
use std::ops::Range;

/// Upper saturation bound for mixed samples
pub const SAMPLE_CLIP_MAX: i16 = 32767;

/// Lower saturation bound for mixed samples.
///
/// One above `i16::MIN`: the clip range is `[-32767, 32767]`.
pub const SAMPLE_CLIP_MIN: i16 = -32767;

// 512 MB worth of i16 samples
const MAX_CAPACITY: usize = 512 * 1024 * 1024 / std::mem::size_of::<i16>();

/// Add two samples in 32-bit and clamp the sum to `[SAMPLE_CLIP_MIN, SAMPLE_CLIP_MAX]`.
#[inline]
pub fn saturating_mix(current: i16, sample: i16) -> i16 {
    let sum = i32::from(current) + i32::from(sample);
    sum.clamp(i32::from(SAMPLE_CLIP_MIN), i32::from(SAMPLE_CLIP_MAX)) as i16
}

#[inline]
fn mix_into(cells: &mut [i16], samples: &[i16]) {
    for (cell, &sample) in cells.iter_mut().zip(samples) {
        *cell = saturating_mix(*cell, sample);
    }
}

/// Fixed-capacity circular accumulator of mixed PCM samples
#[derive(Debug)]
pub struct RingMixBuffer {
    /// Mixed sample cells
    samples: Vec<i16>,
    /// Next cell due for hardware output, always `< capacity`
    drain_position: usize,
    /// Samples drained since creation (absolute stream position of the cursor)
    drained_total: u64,
}

impl RingMixBuffer {
    /// Create a zero-filled mix buffer
    ///
    /// # Errors
    ///
    /// Returns [`MixerError::Config`] if:
    /// - Requested capacity is 0
    /// - Requested capacity would exceed maximum safe allocation (512 MB)
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(MixerError::Config(
                "Mix buffer capacity must be greater than 0".into(),
            ));
        }

        if capacity > MAX_CAPACITY {
            return Err(MixerError::Config(format!(
                "Mix buffer capacity {capacity} exceeds maximum safe size {MAX_CAPACITY}"
            )));
        }

        Ok(RingMixBuffer {
            samples: vec![0; capacity],
            drain_position: 0,
            drained_total: 0,
        })
    }

    /// Capacity in samples
    pub fn capacity(&self) -> usize {
        self.samples.len()
    }

    /// Index of the next cell due for output
    pub fn drain_position(&self) -> usize {
        self.drain_position
    }

    /// Total number of samples drained so far
    pub fn drained_total(&self) -> u64 {
        self.drained_total
    }

    /// Raw view of the buffer cells, indexed by ring position
    pub fn as_slice(&self) -> &[i16] {
        &self.samples
    }

    /// Split `len` cells starting at `start` into at most two contiguous ranges.
    /// `len` must not exceed the capacity.
    fn split(&self, start: usize, len: usize) -> (Range<usize>, Range<usize>) {
        let capacity = self.capacity();
        if start + len <= capacity {
            (start..start + len, 0..0)
        } else {
            (start..capacity, 0..start + len - capacity)
        }
    }

    /// Saturating-add `samples` into the ring starting at cell `offset`.
    ///
    /// Positions wrap modulo capacity. A slice longer than the capacity wraps
    /// onto itself; callers are expected to reject such sounds beforehand.
    pub fn mix_add(&mut self, offset: usize, samples: &[i16]) {
        let capacity = self.capacity();
        let mut start = offset % capacity;

        for lap in samples.chunks(capacity) {
            let (head, tail) = self.split(start, lap.len());
            let (lap_head, lap_tail) = lap.split_at(head.len());
            mix_into(&mut self.samples[head], lap_head);
            mix_into(&mut self.samples[tail], lap_tail);
            start = (start + lap.len()) % capacity;
        }
    }

    /// Mix `samples` so that `samples[0]` lands at absolute stream `position`.
    ///
    /// Positions are counted in drained samples (see [`drained_total`]).
    /// Leading samples the cursor has already passed are dropped instead of
    /// wrapping into the future; the number dropped is returned.
    ///
    /// [`drained_total`]: RingMixBuffer::drained_total
    pub fn mix_add_at(&mut self, position: u64, samples: &[i16]) -> usize {
        let late = self
            .drained_total
            .saturating_sub(position)
            .min(samples.len() as u64) as usize;

        let pending = &samples[late..];
        if pending.is_empty() {
            return late;
        }

        let ahead = (position + late as u64 - self.drained_total) % self.capacity() as u64;
        self.mix_add(self.drain_position + ahead as usize, pending);

        late
    }

    /// Copy the next `output.len()` samples out of the ring, zero them, and
    /// advance the drain cursor.
    pub fn drain(&mut self, output: &mut [i16]) {
        let capacity = self.capacity();

        for period in output.chunks_mut(capacity) {
            let (head, tail) = self.split(self.drain_position, period.len());
            let (out_head, out_tail) = period.split_at_mut(head.len());

            out_head.copy_from_slice(&self.samples[head.clone()]);
            out_tail.copy_from_slice(&self.samples[tail.clone()]);
            self.samples[head].fill(0);
            self.samples[tail].fill(0);

            self.drain_position = (self.drain_position + period.len()) % capacity;
        }

        self.drained_total += output.len() as u64;
    }

    /// Silence every cell without moving the drain cursor
    pub fn clear(&mut self) {
        self.samples.fill(0);
    }
}
