//! Output device abstraction.
//!
//! The engine only needs two things from a platform audio API: open an
//! output stream bound to a pull callback, and start/stop it. [`AudioDevice`]
//! and [`OutputStream`] capture exactly that, so the state machine can run
//! against cpal ([`crate::cpal_device::CpalDevice`]) or against the
//! explicitly pulled [`manual::ManualDevice`].
//!
//! ## Stream lifetime
//!
//! A stream is alive from `open_output` until its handle is dropped. Dropping
//! the handle closes the stream; implementations must guarantee the callback
//! is never invoked again once the drop returns.

pub mod manual;

use crate::error::DeviceError;

/// Parameters of the stream requested from the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSpec {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Interleaved channel count.
    pub channels: u16,
    /// Fixed block size in frames; `None` lets the driver choose.
    pub block_size: Option<u32>,
}

impl Default for StreamSpec {
    fn default() -> Self {
        Self { sample_rate: 44_100, channels: 1, block_size: None }
    }
}

/// Pull callback invoked on the device's real-time thread.
///
/// Receives an interleaved `f32` buffer of `frames * channels` samples that it
/// must fill completely, and the channel count the stream was actually opened
/// with (which may differ from [`StreamSpec::channels`] when the device only
/// offers other layouts). Must not block, allocate or perform I/O.
pub type RenderCallback = Box<dyn FnMut(&mut [f32], u16) + Send + 'static>;

/// A started or stopped output stream. Dropping it closes the stream.
pub trait OutputStream {
    /// Begin invoking the callback.
    fn start(&mut self) -> Result<(), DeviceError>;

    /// Stop invoking the callback. The stream may be started again.
    fn stop(&mut self) -> Result<(), DeviceError>;
}

/// A platform output device able to host one stream at a time.
pub trait AudioDevice {
    type Stream: OutputStream;

    /// Human-readable device name.
    fn name(&self) -> String;

    /// Build a stream bound to `callback`. The stream is not started.
    ///
    /// Implementations may open a different channel count than requested;
    /// the callback is told which one on every call.
    fn open_output(&mut self, spec: &StreamSpec, callback: RenderCallback) -> Result<Self::Stream, DeviceError>;

    /// Release the underlying device context. Further opens fail with
    /// [`DeviceError::Released`]. Calling it again is a no-op.
    fn release(&mut self);
}
