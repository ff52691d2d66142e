//! Musigen Engine: source selection, block dispatch and device plumbing.
//!
//! Crate layout:
//! - [`config`]      : `EngineConfig` (serde, validated before use)
//! - [`error`]       : `Error`, `DeviceError`, `ConfigError`, `RenderFault`
//! - [`source`]      : `SourceKind` and `PlaybackState`
//! - [`synth`]       : the per-block dispatcher (oscillator, delay, monitor)
//! - [`device`]      : `AudioDevice` / `OutputStream` traits, `ManualDevice`
//! - [`cpal_device`] : cpal output device (feature `realtime`)
//! - [`engine`]      : the state machine and control API
//!
//! Nothing on the render path allocates, locks with waiting, or logs.

pub mod config;
#[cfg(feature = "realtime")]
pub mod cpal_device;
pub mod device;
pub mod engine;
pub mod error;
pub mod source;
pub mod synth;

pub use config::EngineConfig;
pub use device::manual::{ManualDevice, ManualDriver};
pub use device::{AudioDevice, OutputStream, RenderCallback, StreamSpec};
pub use engine::Engine;
pub use error::{ConfigError, DeviceError, Error, RenderFault, Result};
pub use source::{PlaybackState, SourceKind};
pub use synth::{Monitor, Synth};

#[cfg(feature = "realtime")]
pub use cpal_device::{CpalDevice, CpalStream};
