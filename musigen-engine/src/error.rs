//! Error taxonomy.
//!
//! Control-plane failures ([`DeviceError`], [`ConfigError`]) are returned to
//! the caller wrapped in [`Error`]. Render-path failures ([`RenderFault`]) never
//! leave the audio callback: the block is replaced by silence and the fault is
//! counted.

/// Errors returned by the engine's control API.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Opening, starting or stopping the output stream failed.
    #[error("device error: {0}")]
    Device(#[from] DeviceError),

    /// A request or configuration value was rejected before any state changed.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Output device failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeviceError {
    /// No output device available on the system.
    #[error("no output device available")]
    NoDevice,

    /// The requested output device was not found.
    #[error("output device not found: {0}")]
    NotFound(String),

    /// A stream is already open on this device.
    #[error("device busy: an output stream is already open")]
    Busy,

    /// Building the output stream failed.
    #[error("failed to open output stream: {0}")]
    Open(String),

    /// The stream was built but refused to start.
    #[error("failed to start output stream: {0}")]
    Start(String),

    /// The stream refused to stop.
    #[error("failed to stop output stream: {0}")]
    Stop(String),

    /// The device cannot produce the requested sample format.
    #[error("unsupported sample format: {0}")]
    UnsupportedFormat(String),

    /// The device context was released by teardown.
    #[error("device context has been released")]
    Released,
}

/// Rejected configuration values and requests.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// Source name not recognised.
    #[error("unknown source '{0}' (expected sine, fm, wavetable or stop)")]
    UnknownSource(String),

    #[error("sample rate must be greater than zero")]
    InvalidSampleRate,

    #[error("channel count must be greater than zero")]
    InvalidChannels,

    #[error("{name} must be finite and non-negative, got {value}")]
    InvalidFrequency { name: &'static str, value: f32 },

    #[error("volume must be finite and non-negative, got {0}")]
    InvalidVolume(f32),

    #[error("feedback gain {0} is outside [0, 1)")]
    InvalidFeedback(f32),

    #[error("delay line would hold no samples")]
    EmptyDelay,

    #[error("block size must be at least one frame")]
    EmptyBlock,

    /// Block longer than the delay line.
    #[error("frame count {frames} exceeds delay capacity of {capacity}")]
    FrameCountTooLarge { frames: usize, capacity: usize },

    /// The delay line refused its parameters.
    #[error(transparent)]
    Delay(#[from] musigen_core::DelayError),
}

/// Faults absorbed inside the render callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RenderFault {
    /// The device asked for more frames than the delay line holds.
    #[error("device requested {frames} frames, delay capacity is {capacity}")]
    FrameCountTooLarge { frames: usize, capacity: usize },

    /// The interleaved buffer is not a whole number of frames.
    #[error("buffer of {len} samples is not a multiple of {channels} channels")]
    MisalignedBuffer { len: usize, channels: usize },

    /// The control plane held the dispatcher; the callback does not wait.
    #[error("synthesizer busy")]
    Contended,
}

/// Convenience result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
