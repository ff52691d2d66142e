//! Device whose callback runs only when the host asks for a block.
//!
//! [`ManualDevice`] plays the role of a sound card for headless rendering and
//! tests: the engine opens streams on it as usual, and the paired
//! [`ManualDriver`] pulls blocks through whatever callback is currently bound.
//! The driver also records how many streams were opened and closed, refuses
//! overlapping streams with [`DeviceError::Busy`], and can be told to fail the
//! next open or start.

use std::sync::Arc;

use parking_lot::Mutex;

use super::{AudioDevice, OutputStream, RenderCallback, StreamSpec};
use crate::error::DeviceError;

struct Bound {
    id: u64,
    spec: StreamSpec,
    callback: RenderCallback,
    running: bool,
}

#[derive(Default)]
struct Shared {
    bound: Option<Bound>,
    next_id: u64,
    opened: usize,
    closed: usize,
    released: bool,
    fail_open: Option<DeviceError>,
    fail_start: Option<DeviceError>,
}

/// Output device driven by [`ManualDriver::pull`].
pub struct ManualDevice {
    shared: Arc<Mutex<Shared>>,
}

/// Host-side handle for a [`ManualDevice`]. Cheap to clone.
#[derive(Clone)]
pub struct ManualDriver {
    shared: Arc<Mutex<Shared>>,
}

/// Stream handle returned by [`ManualDevice::open_output`].
pub struct ManualStream {
    id: u64,
    shared: Arc<Mutex<Shared>>,
}

impl ManualDevice {
    /// A device and the driver that pulls from it.
    pub fn new() -> (Self, ManualDriver) {
        let shared = Arc::new(Mutex::new(Shared::default()));
        (Self { shared: Arc::clone(&shared) }, ManualDriver { shared })
    }
}

impl AudioDevice for ManualDevice {
    type Stream = ManualStream;

    fn name(&self) -> String {
        "manual".to_string()
    }

    fn open_output(&mut self, spec: &StreamSpec, callback: RenderCallback) -> Result<ManualStream, DeviceError> {
        let mut shared = self.shared.lock();
        if shared.released {
            return Err(DeviceError::Released);
        }
        if let Some(err) = shared.fail_open.take() {
            return Err(err);
        }
        if shared.bound.is_some() {
            return Err(DeviceError::Busy);
        }
        shared.next_id += 1;
        let id = shared.next_id;
        shared.bound = Some(Bound { id, spec: spec.clone(), callback, running: false });
        shared.opened += 1;
        Ok(ManualStream { id, shared: Arc::clone(&self.shared) })
    }

    fn release(&mut self) {
        self.shared.lock().released = true;
    }
}

impl OutputStream for ManualStream {
    fn start(&mut self) -> Result<(), DeviceError> {
        let mut shared = self.shared.lock();
        if let Some(err) = shared.fail_start.take() {
            return Err(err);
        }
        match shared.bound.as_mut() {
            Some(bound) if bound.id == self.id => {
                bound.running = true;
                Ok(())
            }
            _ => Err(DeviceError::Start("stream is no longer bound".to_string())),
        }
    }

    fn stop(&mut self) -> Result<(), DeviceError> {
        let mut shared = self.shared.lock();
        if let Some(bound) = shared.bound.as_mut().filter(|b| b.id == self.id) {
            bound.running = false;
        }
        Ok(())
    }
}

impl Drop for ManualStream {
    fn drop(&mut self) {
        let mut shared = self.shared.lock();
        if shared.bound.as_ref().is_some_and(|b| b.id == self.id) {
            shared.bound = None;
            shared.closed += 1;
        }
    }
}

impl ManualDriver {
    /// Pull `frames` frames through the bound callback.
    ///
    /// Returns `None` when no stream is open or the open stream is stopped;
    /// otherwise the interleaved buffer the callback produced.
    pub fn pull(&self, frames: usize) -> Option<Vec<f32>> {
        let mut shared = self.shared.lock();
        let bound = shared.bound.as_mut().filter(|b| b.running)?;
        let channels = bound.spec.channels.max(1);
        let mut buffer = vec![0.0_f32; frames * usize::from(channels)];
        (bound.callback)(&mut buffer, channels);
        Some(buffer)
    }

    /// Number of streams opened so far.
    pub fn opened(&self) -> usize {
        self.shared.lock().opened
    }

    /// Number of streams closed so far.
    pub fn closed(&self) -> usize {
        self.shared.lock().closed
    }

    /// Identifier of the currently bound stream, if any. Each open gets a new one.
    pub fn bound_stream(&self) -> Option<u64> {
        self.shared.lock().bound.as_ref().map(|b| b.id)
    }

    /// Spec the bound stream was opened with.
    pub fn bound_spec(&self) -> Option<StreamSpec> {
        self.shared.lock().bound.as_ref().map(|b| b.spec.clone())
    }

    /// Whether the bound stream is started.
    pub fn is_running(&self) -> bool {
        self.shared.lock().bound.as_ref().is_some_and(|b| b.running)
    }

    /// Whether the device context was released.
    pub fn is_released(&self) -> bool {
        self.shared.lock().released
    }

    /// Make the next `open_output` fail with `err`.
    pub fn fail_next_open(&self, err: DeviceError) {
        self.shared.lock().fail_open = Some(err);
    }

    /// Make the next `start` fail with `err`.
    pub fn fail_next_start(&self, err: DeviceError) {
        self.shared.lock().fail_start = Some(err);
    }
}
