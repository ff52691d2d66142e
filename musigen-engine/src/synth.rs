//! Synthesis dispatcher: renders one block for the active source.
//!
//! Per block: generate the raw signal for the active [`Voice`], run it through
//! the feedback delay, publish it to the monitor ring, advance the clock.
//!
//! The voice is resolved from a [`SourceKind`] once, when the source is
//! switched; the render path only matches on the stored variant. Nothing in
//! here allocates after construction, and every path leaves the output buffer
//! fully written: a block that cannot be rendered is returned as silence
//! together with the [`RenderFault`] explaining why.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use musigen_core::delay::FeedbackDelay;
use musigen_core::monitor::{MonitorBuffer, MONITOR_LEN};
use musigen_core::osc::{self, BlockClock, FmParams};
use musigen_core::wavetable::Wavetable;

use crate::config::EngineConfig;
use crate::error::{ConfigError, RenderFault};
use crate::source::SourceKind;

/// Monitor ring shared between the dispatcher and snapshot readers.
pub type Monitor = MonitorBuffer<MONITOR_LEN>;

/// Generator settings for the active source, fixed at switch time.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Voice {
    Silent,
    Sine { freq: f32, amp: f32 },
    Fm { params: FmParams, amp: f32 },
    Wavetable { freq: f32, amp: f32 },
}

impl Voice {
    fn resolve(kind: SourceKind, config: &EngineConfig) -> Self {
        match kind {
            SourceKind::Sine => Voice::Sine { freq: config.carrier_hz, amp: config.volume },
            SourceKind::Fm => Voice::Fm { params: config.fm_params(), amp: config.volume },
            SourceKind::Wavetable => Voice::Wavetable { freq: config.carrier_hz, amp: config.volume },
            SourceKind::Stop => Voice::Silent,
        }
    }
}

/// Block renderer owning the delay line, the wavetable and the sample clock.
pub struct Synth {
    config: EngineConfig,
    source: SourceKind,
    voice: Voice,
    table: Wavetable,
    delay: FeedbackDelay,
    monitor: Arc<Monitor>,
    clock: BlockClock,
    /// Mirror of `clock.start` readable without the dispatcher lock.
    frames: Arc<AtomicU64>,
    /// Mono staging area for multi-channel devices, sized to the delay line.
    scratch: Vec<f32>,
}

impl Synth {
    /// Validate `config` and allocate every buffer the render path will use.
    pub fn new(config: &EngineConfig, monitor: Arc<Monitor>) -> Result<Self, ConfigError> {
        config.validate()?;
        let capacity = config.delay_capacity();
        let delay = FeedbackDelay::new(capacity, config.feedback)?;
        Ok(Self {
            config: config.clone(),
            source: SourceKind::Stop,
            voice: Voice::Silent,
            table: Wavetable::sine_saw(),
            delay,
            monitor,
            clock: BlockClock::new(0, f64::from(config.sample_rate)),
            frames: Arc::new(AtomicU64::new(0)),
            scratch: vec![0.0; capacity],
        })
    }

    /// Select the generator used by subsequent renders. The sample clock and
    /// the delay history carry over.
    pub fn set_source(&mut self, kind: SourceKind) {
        self.source = kind;
        self.voice = Voice::resolve(kind, &self.config);
    }

    #[inline]
    pub fn source(&self) -> SourceKind {
        self.source
    }

    /// Largest block `render` accepts (the delay line length).
    #[inline]
    pub fn capacity(&self) -> usize {
        self.delay.capacity()
    }

    /// Total frames rendered so far.
    #[inline]
    pub fn frames_rendered(&self) -> u64 {
        self.clock.start
    }

    /// Shared frame counter, updated after every rendered block.
    pub fn frame_counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.frames)
    }

    #[inline]
    pub fn monitor(&self) -> &Arc<Monitor> {
        &self.monitor
    }

    /// Render `out.len()` mono frames.
    ///
    /// Blocks longer than [`capacity`](Self::capacity) are refused before the
    /// delay line, the monitor or the clock are touched; `out` is zeroed.
    pub fn render(&mut self, out: &mut [f32]) -> Result<(), RenderFault> {
        let frames = out.len();
        let capacity = self.delay.capacity();
        if frames > capacity {
            out.fill(0.0);
            return Err(RenderFault::FrameCountTooLarge { frames, capacity });
        }

        match self.voice {
            Voice::Silent => osc::silence(out),
            Voice::Sine { freq, amp } => osc::sine(out, self.clock, freq, amp),
            Voice::Fm { params, amp } => osc::fm(out, self.clock, params, amp),
            Voice::Wavetable { freq, amp } => osc::wavetable(out, self.clock, freq, &self.table, amp),
        }

        if self.delay.process_in_place(out).is_err() {
            out.fill(0.0);
            return Err(RenderFault::FrameCountTooLarge { frames, capacity });
        }

        self.monitor.publish(out);
        self.clock = self.clock.advance(frames);
        self.frames.store(self.clock.start, Ordering::Relaxed);
        Ok(())
    }

    /// Render into an interleaved device buffer, duplicating the mono signal
    /// to every channel.
    pub fn render_interleaved(&mut self, out: &mut [f32], channels: usize) -> Result<(), RenderFault> {
        if channels <= 1 {
            return self.render(out);
        }
        if out.len() % channels != 0 {
            out.fill(0.0);
            return Err(RenderFault::MisalignedBuffer { len: out.len(), channels });
        }

        let frames = out.len() / channels;
        if frames > self.scratch.len() {
            out.fill(0.0);
            return Err(RenderFault::FrameCountTooLarge { frames, capacity: self.scratch.len() });
        }

        let mut scratch = std::mem::take(&mut self.scratch);
        let result = self.render(&mut scratch[..frames]);
        for (frame, &s) in out.chunks_exact_mut(channels).zip(scratch[..frames].iter()) {
            frame.fill(s);
        }
        self.scratch = scratch;
        result
    }
}

impl std::fmt::Debug for Synth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Synth")
            .field("source", &self.source)
            .field("frames_rendered", &self.clock.start)
            .field("delay_capacity", &self.delay.capacity())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn synth() -> Synth {
        Synth::new(&EngineConfig::default(), Arc::new(Monitor::new())).unwrap()
    }

    #[test]
    fn renders_exact_lengths_for_every_source() {
        let mut s = synth();
        for kind in SourceKind::ALL {
            s.set_source(kind);
            for n in [1, 256, 1024, 2048] {
                let mut out = vec![f32::NAN; n];
                s.render(&mut out).unwrap();
                assert!(out.iter().all(|v| v.is_finite()), "{kind} n={n}");
            }
        }
    }

    #[test]
    fn first_sine_sample_is_zero() {
        let mut s = synth();
        s.set_source(SourceKind::Sine);
        let mut out = [1.0_f32; 256];
        s.render(&mut out).unwrap();
        assert_eq!(out[0], 0.0);
        // no echo yet within the first half second
        assert!(out.iter().all(|v| v.abs() <= 0.5));
    }

    #[test]
    fn stop_renders_silence_from_a_fresh_engine() {
        let mut s = synth();
        let mut out = [1.0_f32; 512];
        s.render(&mut out).unwrap();
        assert!(out.iter().all(|&v| v == 0.0));
        assert_eq!(s.frames_rendered(), 512);
    }

    #[test]
    fn echo_arrives_after_delay_capacity() {
        let mut s = synth();
        let cap = s.capacity();
        s.set_source(SourceKind::Sine);
        let mut first = vec![0.0_f32; cap];
        s.render(&mut first).unwrap();

        s.set_source(SourceKind::Stop);
        let mut tail = vec![0.0_f32; cap];
        s.render(&mut tail).unwrap();
        for (dry, wet) in first.iter().zip(tail.iter()) {
            assert!((wet - 0.5 * dry).abs() < 1e-6);
        }
    }

    #[test]
    fn oversized_block_is_silent_and_leaves_state_alone() {
        let mut s = synth();
        s.set_source(SourceKind::Fm);
        let mut out = vec![1.0_f32; s.capacity() + 1];
        let err = s.render(&mut out).unwrap_err();
        assert_eq!(err, RenderFault::FrameCountTooLarge { frames: 22_051, capacity: 22_050 });
        assert!(out.iter().all(|&v| v == 0.0));
        assert_eq!(s.frames_rendered(), 0);
        assert_eq!(s.monitor().generation(), 0);
    }

    #[test]
    fn interleaved_duplicates_mono() {
        let mut mono = synth();
        let mut stereo = synth();
        mono.set_source(SourceKind::Wavetable);
        stereo.set_source(SourceKind::Wavetable);

        let mut m = [0.0_f32; 128];
        let mut st = [0.0_f32; 256];
        mono.render(&mut m).unwrap();
        stereo.render_interleaved(&mut st, 2).unwrap();
        for (i, frame) in st.chunks_exact(2).enumerate() {
            assert_eq!(frame[0], m[i]);
            assert_eq!(frame[1], m[i]);
        }
    }

    #[test]
    fn misaligned_interleaved_buffer_is_silent() {
        let mut s = synth();
        s.set_source(SourceKind::Sine);
        let mut out = [1.0_f32; 7];
        assert_eq!(
            s.render_interleaved(&mut out, 2).unwrap_err(),
            RenderFault::MisalignedBuffer { len: 7, channels: 2 }
        );
        assert!(out.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn monitor_holds_latest_output() {
        let mut s = synth();
        s.set_source(SourceKind::Fm);
        let mut out = vec![0.0_f32; 2048];
        s.render(&mut out).unwrap();
        assert_eq!(s.monitor().snapshot(), out[2048 - MONITOR_LEN..].to_vec());
    }

    #[test]
    fn clock_survives_source_switch() {
        let mut s = synth();
        s.set_source(SourceKind::Sine);
        let mut a = [0.0_f32; 300];
        s.render(&mut a).unwrap();
        s.set_source(SourceKind::Fm);
        s.render(&mut a).unwrap();
        assert_eq!(s.frames_rendered(), 600);
        assert_eq!(s.frame_counter().load(Ordering::Relaxed), 600);
    }
}
