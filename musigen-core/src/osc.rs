//! Oscillator bank: block generators for the engine's signal sources.
//!
//! Every generator is a pure function of the output length, a [`BlockClock`]
//! (absolute sample index of the first frame plus the sample rate) and its
//! parameters. There is no phase accumulator: the phase of frame `i` is
//! derived from `start + i`, so two calls with the same clock produce the same
//! block, and a block continues exactly where the previous one ended as long
//! as the caller advances the clock by the block length.
//!
//! Generators write into a caller-provided slice; an empty slice is a valid
//! (empty) block.

use crate::dsp::{cycle_fraction, sin, TAU};
use crate::wavetable::Wavetable;

/// Fixed output amplitude shared by all generators.
pub const VOLUME: f32 = 0.5;

/// Absolute position of a block on the engine's sample timeline.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BlockClock {
    /// Sample index of the first frame of the block.
    pub start: u64,
    /// Sample rate in Hz.
    pub sample_rate: f64,
}

impl BlockClock {
    #[inline]
    pub fn new(start: u64, sample_rate: f64) -> Self {
        Self { start, sample_rate }
    }

    /// Time in seconds of frame `i` within the block.
    #[inline]
    pub fn seconds(&self, i: usize) -> f64 {
        (self.start + i as u64) as f64 / self.sample_rate
    }

    /// Phase of a `freq_hz` oscillator at frame `i`, in cycles [0, 1).
    #[inline]
    fn phase01(&self, i: usize, freq_hz: f32) -> f32 {
        cycle_fraction(self.start + i as u64, f64::from(freq_hz), self.sample_rate)
    }

    /// The clock for the block that follows one of `frames` frames.
    #[inline]
    pub fn advance(self, frames: usize) -> Self {
        Self { start: self.start + frames as u64, ..self }
    }
}

/// Two-operator FM settings: carrier, modulator and modulation index.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FmParams {
    pub carrier_hz: f32,
    pub mod_hz: f32,
    pub index: f32,
}

impl Default for FmParams {
    fn default() -> Self {
        Self { carrier_hz: 440.0, mod_hz: 100.0, index: 5.0 }
    }
}

/// `amp * sin(2π f t)`.
#[inline]
pub fn sine(out: &mut [f32], clock: BlockClock, freq_hz: f32, amp: f32) {
    for (i, y) in out.iter_mut().enumerate() {
        *y = amp * sin(TAU * clock.phase01(i, freq_hz));
    }
}

/// `amp * sin(2π fc t + index * sin(2π fm t))`.
///
/// With `index == 0` this is sample-for-sample identical to [`sine`] at the
/// carrier frequency.
#[inline]
pub fn fm(out: &mut [f32], clock: BlockClock, params: FmParams, amp: f32) {
    for (i, y) in out.iter_mut().enumerate() {
        let modulation = params.index * sin(TAU * clock.phase01(i, params.mod_hz));
        *y = amp * sin(TAU * clock.phase01(i, params.carrier_hz) + modulation);
    }
}

/// Wavetable playback: phase `(2π f t) mod 2π` mapped onto the table.
#[inline]
pub fn wavetable(out: &mut [f32], clock: BlockClock, freq_hz: f32, table: &Wavetable, amp: f32) {
    for (i, y) in out.iter_mut().enumerate() {
        *y = amp * table.lookup(clock.phase01(i, freq_hz));
    }
}

/// All-zero block.
#[inline]
pub fn silence(out: &mut [f32]) {
    out.fill(0.0);
}
