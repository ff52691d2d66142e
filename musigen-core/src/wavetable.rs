//! Built-in single-cycle wavetable.
//!
//! The table holds one period of a waveform in [`TABLE_LEN`] entries sampled at
//! `k / TABLE_LEN` of the cycle (the endpoint is not duplicated). Lookups
//! interpolate linearly and wrap from the last entry back to the first, so any
//! phase in [0, 1) resolves to a valid pair of entries.

use crate::dsp::{lerp, sin, TAU};

/// Number of entries in the built-in table.
pub const TABLE_LEN: usize = 512;

/// Immutable single-cycle table. Build once, read from the audio thread.
#[derive(Clone, Debug)]
pub struct Wavetable {
    table: [f32; TABLE_LEN],
}

impl Wavetable {
    /// The built-in voice: a sine blended 50/50 with a rising ramp.
    ///
    /// `table[k] = 0.5 * sin(2π x) + 0.5 * (2x - 1)` with `x = k / TABLE_LEN`.
    pub fn sine_saw() -> Self {
        let table = core::array::from_fn(|k| {
            let x = k as f32 / TABLE_LEN as f32;
            0.5 * sin(TAU * x) + 0.5 * (2.0 * x - 1.0)
        });
        Self { table }
    }

    /// Interpolated value at `phase01` (cycles, expected in [0, 1)).
    ///
    /// Out-of-range phases are folded back with the same modulo used for the
    /// table index, so this never indexes past the end.
    #[inline]
    pub fn lookup(&self, phase01: f32) -> f32 {
        let pos = if phase01 >= 0.0 { phase01 * TABLE_LEN as f32 } else { 0.0 };
        let whole = pos as usize;
        let frac = pos - whole as f32;
        let i0 = whole % TABLE_LEN;
        let i1 = (i0 + 1) % TABLE_LEN;
        lerp(self.table[i0], self.table[i1], frac)
    }

    /// Largest absolute difference between neighbouring entries, including the
    /// wrap pair (last, first).
    pub fn max_adjacent_delta(&self) -> f32 {
        (0..TABLE_LEN)
            .map(|k| (self.table[(k + 1) % TABLE_LEN] - self.table[k]).abs())
            .fold(0.0, f32::max)
    }

    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.table
    }
}

impl Default for Wavetable {
    fn default() -> Self {
        Self::sine_saw()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_shape() {
        let wt = Wavetable::sine_saw();
        let t = wt.as_slice();
        assert_eq!(t.len(), TABLE_LEN);
        // ramp starts at -0.5, sine starts at 0
        assert!((t[0] + 0.5).abs() < 1e-6);
        // quarter cycle: 0.5*sin(π/2) + 0.5*(-0.5)
        assert!((t[TABLE_LEN / 4] - 0.25).abs() < 1e-5);
        assert!(t.iter().all(|v| v.abs() <= 1.0));
    }

    #[test]
    fn lookup_hits_entries_exactly() {
        let wt = Wavetable::sine_saw();
        for k in [0, 1, 100, 255, 511] {
            let phase = k as f32 / TABLE_LEN as f32;
            assert!((wt.lookup(phase) - wt.as_slice()[k]).abs() < 1e-5, "k={k}");
        }
    }

    #[test]
    fn lookup_is_continuous_across_wrap() {
        let wt = Wavetable::sine_saw();
        let bound = wt.max_adjacent_delta();
        let before = wt.lookup(1.0 - 1.0e-6);
        let after = wt.lookup(0.0);
        assert!((before - after).abs() <= bound + 1e-5);
        // a phase of exactly 1.0 folds back onto 0.0
        assert_eq!(wt.lookup(1.0), wt.lookup(0.0));
    }

    #[test]
    fn out_of_range_phase_is_safe() {
        let wt = Wavetable::sine_saw();
        for p in [-3.0, -0.1, 1.5, 7.25, 1.0e6] {
            assert!(wt.lookup(p).is_finite());
        }
    }
}
