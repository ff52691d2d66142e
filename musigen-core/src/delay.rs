//! Single-tap feedback delay over a fixed ring buffer.
//!
//! For a block of `N` samples starting at ring position `p`:
//!
//! ```text
//! out[i]        = in[i] + feedback * line[(p + i) % cap]
//! line[p + i]   = in[i]            // raw input, not the mixed output
//! p             = (p + N) % cap
//! ```
//!
//! Every slot is therefore read exactly once, `cap` samples after it was
//! written, which gives one echo at `feedback` gain per input sample.
//!
//! The ring is allocated once in the constructor and never resized. Blocks
//! longer than the ring are refused before any state is touched.

use alloc::vec;
use alloc::vec::Vec;

use crate::dsp::kill_denormals;
use crate::{DelayError, Result};

/// Default delay time in seconds.
pub const DEFAULT_DELAY_SECONDS: f32 = 0.5;

/// Default echo gain.
pub const DEFAULT_FEEDBACK: f32 = 0.5;

/// Feedback delay effect. Process one block per audio callback.
#[derive(Clone, Debug)]
pub struct FeedbackDelay {
    line: Vec<f32>,
    pos: usize,
    feedback: f32,
}

impl FeedbackDelay {
    /// Ring of `capacity` samples with the given echo gain in [0, 1).
    pub fn new(capacity: usize, feedback: f32) -> Result<Self> {
        if capacity == 0 {
            return Err(DelayError::ZeroCapacity);
        }
        check_feedback(feedback)?;
        Ok(Self { line: vec![0.0; capacity], pos: 0, feedback })
    }

    /// Ring sized for `seconds` of history at `sample_rate`
    /// (22 050 slots for 0.5 s at 44.1 kHz).
    pub fn with_time(sample_rate: f32, seconds: f32, feedback: f32) -> Result<Self> {
        let samples = sample_rate * seconds;
        let capacity = if samples.is_finite() && samples >= 1.0 { samples as usize } else { 0 };
        Self::new(capacity, feedback)
    }

    /// Number of samples of history held by the ring.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.line.len()
    }

    #[inline]
    pub fn feedback(&self) -> f32 {
        self.feedback
    }

    /// Current write position in the ring.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Change the echo gain. The ring contents are untouched.
    pub fn set_feedback(&mut self, feedback: f32) -> Result<()> {
        check_feedback(feedback)?;
        self.feedback = feedback;
        Ok(())
    }

    /// Clear the history and rewind to slot 0.
    pub fn reset(&mut self) {
        self.line.fill(0.0);
        self.pos = 0;
    }

    /// Process `input` into `output` (equal lengths, at most `capacity`).
    pub fn process(&mut self, input: &[f32], output: &mut [f32]) -> Result<()> {
        if input.len() != output.len() {
            return Err(DelayError::LengthMismatch { input: input.len(), output: output.len() });
        }
        self.check_block(input.len())?;
        for (i, (x, y)) in input.iter().zip(output.iter_mut()).enumerate() {
            *y = self.tick(i, *x);
        }
        self.advance(input.len());
        Ok(())
    }

    /// Process a block in place.
    pub fn process_in_place(&mut self, block: &mut [f32]) -> Result<()> {
        self.check_block(block.len())?;
        for (i, s) in block.iter_mut().enumerate() {
            *s = self.tick(i, *s);
        }
        self.advance(block.len());
        Ok(())
    }

    #[inline]
    fn check_block(&self, frames: usize) -> Result<()> {
        if frames > self.line.len() {
            return Err(DelayError::BlockTooLong { frames, capacity: self.line.len() });
        }
        Ok(())
    }

    #[inline]
    fn tick(&mut self, i: usize, x: f32) -> f32 {
        let mut j = self.pos + i;
        if j >= self.line.len() {
            j -= self.line.len();
        }
        let delayed = self.line[j];
        self.line[j] = x;
        kill_denormals(x + self.feedback * delayed)
    }

    #[inline]
    fn advance(&mut self, frames: usize) {
        self.pos = (self.pos + frames) % self.line.len();
    }
}

fn check_feedback(feedback: f32) -> Result<()> {
    if (0.0..1.0).contains(&feedback) {
        Ok(())
    } else {
        Err(DelayError::InvalidFeedback(feedback))
    }
}
