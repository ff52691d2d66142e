#![cfg_attr(not(feature = "std"), no_std)]
//! Musigen core: no_std-ready DSP primitives for the synthesis engine.
//!
//! Features
//! - `std`      : (default) use the Rust standard library
//! - `no-std`   : build with `#![no_std]` and use the `libm` math backend
//! - `micromath`: use `micromath` as the math backend
//! - `fast-math`: polynomial sine in the oscillator hot path
//!
//! Modules
//! - [`dsp`]       : math backend, phase helpers, meters
//! - [`osc`]       : oscillator bank (sine, FM, wavetable, silence)
//! - [`wavetable`] : built-in 512-entry single-cycle table
//! - [`delay`]     : single-tap feedback delay over a fixed ring
//! - [`monitor`]   : lock-free ring of the most recent output samples
//!
//! Design
//! - Heap is touched only in constructors (the delay ring); processing never allocates
//! - Generators are pure functions of a block clock, so blocks are reproducible
//! - Friendly to real-time targets

extern crate alloc;

pub mod delay;
pub mod dsp;
pub mod monitor;
pub mod osc;
pub mod wavetable;

/// Errors raised by the delay effect.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum DelayError {
    /// The ring would hold no samples.
    #[error("delay line capacity must be at least one sample")]
    ZeroCapacity,

    /// Feedback gain outside [0, 1).
    #[error("feedback gain {0} is outside [0, 1)")]
    InvalidFeedback(f32),

    /// A block longer than the ring was submitted.
    #[error("block of {frames} frames exceeds delay capacity of {capacity}")]
    BlockTooLong { frames: usize, capacity: usize },

    /// Input and output slices differ in length.
    #[error("input has {input} frames but output has {output}")]
    LengthMismatch { input: usize, output: usize },
}

/// Convenience result type for the core crate.
pub type Result<T> = core::result::Result<T, DelayError>;

/// Commonly used types/functions for convenience:
pub mod prelude {
    pub use crate::delay::{FeedbackDelay, DEFAULT_DELAY_SECONDS, DEFAULT_FEEDBACK};
    pub use crate::dsp::{cycle_fraction, peak, rms, TAU};
    pub use crate::monitor::{MonitorBuffer, MONITOR_LEN};
    pub use crate::osc::{BlockClock, FmParams, VOLUME};
    pub use crate::wavetable::{Wavetable, TABLE_LEN};
    pub use crate::DelayError;
}
