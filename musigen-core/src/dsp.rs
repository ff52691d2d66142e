//! Generic DSP utilities and math helpers.
//!
//! Design goals:
//! - `no_std` ready (guarded by the crate feature `no-std`)
//! - Math backend selection that works in both `std` and `no_std` contexts
//! - Optional `fast-math` approximation for the oscillator hot path
//! - Side-effect free helpers that are easy to test
//!
//! Conventions:
//! - All functions are `#[inline]` where useful to help the optimizer.
//! - Argument and return domains are documented per function.

#![allow(clippy::excessive_precision)]

use core::f32::consts::PI;

use cfg_if::cfg_if;

// ----------------------------- Math backend selection -----------------------------

cfg_if! {
    // micromath preferred if explicitly requested (works in no_std)
    if #[cfg(feature = "micromath")] {
        use micromath::F32Ext as _;
        #[inline] fn m_sin(x: f32) -> f32 { x.sin() }
        #[inline] fn m_sqrt(x: f32) -> f32 { x.sqrt() }
    // libm (C math) in no_std
    } else if #[cfg(feature = "no-std")] {
        #[inline] fn m_sin(x: f32) -> f32 { libm::sinf(x) }
        #[inline] fn m_sqrt(x: f32) -> f32 { libm::sqrtf(x) }
    // std backend
    } else {
        #[inline] fn m_sin(x: f32) -> f32 { x.sin() }
        #[inline] fn m_sqrt(x: f32) -> f32 { x.sqrt() }
    }
}

// --------------------------------- Constants -------------------------------------

/// 2π (commonly useful)
pub const TAU: f32 = 2.0 * PI;

/// A very small epsilon used in denormal handling.
pub const EPS_SMALL: f32 = 1.0e-20;

// --------------------------------- Utilities -------------------------------------

#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Kill denormal/subnormal values. Returns 0.0 if |x| < EPS_SMALL.
#[inline]
pub fn kill_denormals(x: f32) -> f32 {
    if x.abs() < EPS_SMALL { 0.0 } else { x }
}

/// Fractional number of cycles completed by a `freq_hz` oscillator after
/// `sample_index` samples at `sample_rate`, in [0, 1).
///
/// Time is carried in `f64` so a long-running sample counter does not eat
/// the phase resolution. Negative or non-finite inputs yield 0.
#[inline]
pub fn cycle_fraction(sample_index: u64, freq_hz: f64, sample_rate: f64) -> f32 {
    let cycles = sample_index as f64 * freq_hz / sample_rate;
    if !(cycles.is_finite() && cycles >= 0.0) {
        return 0.0;
    }
    let frac = (cycles - (cycles as u64) as f64) as f32;
    // f64 -> f32 rounding can land exactly on 1.0
    if frac >= 1.0 { 0.0 } else { frac }
}

// --------------------------------- Trig ------------------------------------------

/// Sine through the selected math backend.
///
/// With `fast-math`, range-reduces into [-π, π], folds into [-π/2, π/2] with
/// `sin(π - x) = sin(x)` and evaluates a 9th-order odd polynomial (max abs
/// error ~4e-6). `sin(0)` is exactly 0 on every path.
#[inline]
pub fn sin(x: f32) -> f32 {
    cfg_if! {
        if #[cfg(feature = "fast-math")] {
            const HALF_PI: f32 = 0.5 * PI;

            let mut xr = x;
            let k = (xr / TAU + if xr >= 0.0 { 0.5 } else { -0.5 }) as i32 as f32;
            xr -= k * TAU;

            if xr > HALF_PI {
                xr = PI - xr;
            } else if xr < -HALF_PI {
                xr = -PI - xr;
            }

            let x2 = xr * xr;
            let y = xr
                * (1.0
                    + x2 * (-1.0 / 6.0
                        + x2 * (1.0 / 120.0 + x2 * (-1.0 / 5040.0 + x2 * (1.0 / 362_880.0)))));
            y.clamp(-1.0, 1.0)
        } else {
            m_sin(x)
        }
    }
}

// --------------------------------- Meters ----------------------------------------

/// Absolute peak of a block; 0.0 for an empty block.
#[inline]
pub fn peak(block: &[f32]) -> f32 {
    block.iter().fold(0.0_f32, |acc, s| acc.max(s.abs()))
}

/// Root-mean-square level of a block; 0.0 for an empty block.
#[inline]
pub fn rms(block: &[f32]) -> f32 {
    if block.is_empty() {
        return 0.0;
    }
    let sum: f32 = block.iter().map(|s| s * s).sum();
    m_sqrt(sum / block.len() as f32)
}

// --------------------------------- Tests (std only) ------------------------------
