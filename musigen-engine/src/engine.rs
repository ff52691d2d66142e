//! Source state machine and control API.
//!
//! [`Engine`] owns the output device, the dispatcher and at most one open
//! stream. Every transition follows the same order:
//!
//! 1. close the open stream (clear its liveness flag, stop it, drop it);
//! 2. point the dispatcher at the new source;
//! 3. for an audible source, open a fresh stream bound to the dispatcher and
//!    start it.
//!
//! Reselecting the active source does nothing. A failure while opening or
//! starting leaves the engine `Stopped` with no stream bound.
//!
//! Control methods take `&mut self`, so switches are serialized by the borrow
//! checker. The render callback never waits: it `try_lock`s the dispatcher
//! and emits silence if the control plane holds it.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::EngineConfig;
use crate::device::{AudioDevice, OutputStream, RenderCallback, StreamSpec};
use crate::error::{ConfigError, DeviceError, RenderFault, Result};
use crate::source::{PlaybackState, SourceKind};
use crate::synth::{Monitor, Synth};

/// An open stream and the flag its callback checks before rendering.
struct LiveStream<S> {
    handle: S,
    live: Arc<AtomicBool>,
}

/// Audio engine bound to one output device.
pub struct Engine<D: AudioDevice> {
    device: D,
    config: EngineConfig,
    synth: Arc<Mutex<Synth>>,
    monitor: Arc<Monitor>,
    frames: Arc<AtomicU64>,
    stream: Option<LiveStream<D::Stream>>,
    active: SourceKind,
    faults: Arc<AtomicU64>,
    released: bool,
}

impl<D: AudioDevice> Engine<D> {
    /// Validate `config` and build a stopped engine on `device`.
    pub fn new(device: D, config: EngineConfig) -> Result<Self> {
        let monitor = Arc::new(Monitor::new());
        let synth = Synth::new(&config, Arc::clone(&monitor))?;
        tracing::info!(
            device = %device.name(),
            sample_rate = config.sample_rate,
            channels = config.channels,
            delay_capacity = synth.capacity(),
            "engine ready"
        );
        let frames = synth.frame_counter();
        Ok(Self {
            device,
            config,
            synth: Arc::new(Mutex::new(synth)),
            monitor,
            frames,
            stream: None,
            active: SourceKind::Stop,
            faults: Arc::new(AtomicU64::new(0)),
            released: false,
        })
    }

    /// Switch to `kind`.
    ///
    /// Any open stream is closed before the next one is opened, so once this
    /// returns the previous source's callback can no longer run. On error the
    /// engine is left `Stopped`.
    pub fn select_source(&mut self, kind: SourceKind) -> Result<()> {
        if self.released {
            return Err(DeviceError::Released.into());
        }
        if kind == self.active && (!kind.is_audible() || self.stream.is_some()) {
            tracing::debug!(source = %kind, "source already active");
            return Ok(());
        }

        let previous = self.active;
        if let Err(err) = self.close_stream() {
            self.fall_back_to_stop();
            tracing::warn!(from = %previous, to = %kind, error = %err, "closing stream failed");
            return Err(err.into());
        }

        self.synth.lock().set_source(kind);
        self.active = kind;

        if kind.is_audible() {
            if let Err(err) = self.open_stream() {
                self.fall_back_to_stop();
                tracing::warn!(source = %kind, error = %err, "could not start output stream");
                return Err(err.into());
            }
        }

        tracing::info!(from = %previous, to = %kind, "source selected");
        Ok(())
    }

    /// Stop playback and release the device. Safe to call repeatedly.
    ///
    /// The device is released even if stopping the stream reports an error;
    /// that error is returned afterwards.
    pub fn teardown(&mut self) -> Result<()> {
        if self.released {
            tracing::debug!("teardown: already released");
            return Ok(());
        }
        let closed = self.close_stream();
        self.fall_back_to_stop();
        self.device.release();
        self.released = true;
        tracing::info!(render_faults = self.render_faults(), "engine torn down");
        closed.map_err(Into::into)
    }

    /// Last [`MONITOR_LEN`](musigen_core::monitor::MONITOR_LEN) output
    /// samples, oldest first. Zeros before the first render.
    pub fn snapshot(&self) -> Vec<f32> {
        self.monitor.snapshot()
    }

    /// Shared handle to the monitor ring, for readers on other threads.
    pub fn monitor(&self) -> Arc<Monitor> {
        Arc::clone(&self.monitor)
    }

    /// Render `frames` mono samples directly, outside any device stream.
    ///
    /// Requests longer than the delay line are refused before anything is
    /// rendered. This takes the dispatcher lock: while a stream is open, a
    /// device callback arriving meanwhile emits one silent block.
    pub fn render(&self, frames: usize) -> Result<Vec<f32>> {
        let mut synth = self.synth.lock();
        let capacity = synth.capacity();
        if frames > capacity {
            return Err(ConfigError::FrameCountTooLarge { frames, capacity }.into());
        }
        let mut out = vec![0.0_f32; frames];
        synth
            .render(&mut out)
            .map_err(|_| ConfigError::FrameCountTooLarge { frames, capacity })?;
        Ok(out)
    }

    /// Current state of the state machine.
    #[inline]
    pub fn state(&self) -> PlaybackState {
        PlaybackState::from(self.active)
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.stream.is_some() && self.state().is_playing()
    }

    #[inline]
    pub fn active_source(&self) -> SourceKind {
        self.active
    }

    /// Blocks the render callback replaced with silence so far.
    pub fn render_faults(&self) -> u64 {
        self.faults.load(Ordering::Relaxed)
    }

    /// Total frames rendered by the dispatcher. Lock-free.
    pub fn frames_rendered(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn device_name(&self) -> String {
        self.device.name()
    }

    /// Whether [`teardown`](Self::teardown) has run.
    #[inline]
    pub fn is_released(&self) -> bool {
        self.released
    }

    fn stream_spec(&self) -> StreamSpec {
        StreamSpec {
            sample_rate: self.config.sample_rate,
            channels: self.config.channels,
            block_size: self.config.block_size,
        }
    }

    fn open_stream(&mut self) -> std::result::Result<(), DeviceError> {
        let live = Arc::new(AtomicBool::new(true));
        let callback = render_callback(Arc::clone(&self.synth), Arc::clone(&live), Arc::clone(&self.faults));

        let spec = self.stream_spec();
        let mut handle = self.device.open_output(&spec, callback)?;
        tracing::debug!(sample_rate = spec.sample_rate, channels = spec.channels, "output stream opened");

        if let Err(err) = handle.start() {
            live.store(false, Ordering::Release);
            drop(handle);
            return Err(err);
        }
        tracing::debug!("output stream started");
        self.stream = Some(LiveStream { handle, live });
        Ok(())
    }

    /// Close the open stream, if any. The stream is dropped even when
    /// `stop` fails.
    fn close_stream(&mut self) -> std::result::Result<(), DeviceError> {
        let Some(mut stream) = self.stream.take() else {
            return Ok(());
        };
        stream.live.store(false, Ordering::Release);
        let stopped = stream.handle.stop();
        drop(stream);
        tracing::debug!("output stream closed");
        stopped
    }

    fn fall_back_to_stop(&mut self) {
        self.synth.lock().set_source(SourceKind::Stop);
        self.active = SourceKind::Stop;
    }
}

#[cfg(feature = "realtime")]
impl Engine<crate::cpal_device::CpalDevice> {
    /// Engine on the cpal device named by `config.device_name`, or the
    /// system default.
    pub fn with_cpal(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let device = crate::cpal_device::CpalDevice::open(config.device_name.as_deref())?;
        Self::new(device, config)
    }
}

impl<D: AudioDevice> Drop for Engine<D> {
    fn drop(&mut self) {
        if let Err(err) = self.teardown() {
            tracing::warn!(error = %err, "teardown on drop failed");
        }
    }
}

impl<D: AudioDevice> std::fmt::Debug for Engine<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("device", &self.device.name())
            .field("active", &self.active)
            .field("stream_open", &self.stream.is_some())
            .field("released", &self.released)
            .finish_non_exhaustive()
    }
}

/// Callback run on the device thread. Never waits, never allocates.
fn render_callback(synth: Arc<Mutex<Synth>>, live: Arc<AtomicBool>, faults: Arc<AtomicU64>) -> RenderCallback {
    Box::new(move |out: &mut [f32], channels: u16| {
        if !live.load(Ordering::Acquire) {
            out.fill(0.0);
            return;
        }
        let fault = match synth.try_lock() {
            Some(mut s) => s.render_interleaved(out, usize::from(channels)).err(),
            None => {
                out.fill(0.0);
                Some(RenderFault::Contended)
            }
        };
        if fault.is_some() {
            faults.fetch_add(1, Ordering::Relaxed);
        }
    })
}
