//! Engine configuration.
//!
//! Every field has a default, so a partial TOML file (or none at all) yields a
//! usable config. Values are checked by [`EngineConfig::validate`] before the
//! engine allocates anything.

use musigen_core::delay::{DEFAULT_DELAY_SECONDS, DEFAULT_FEEDBACK};
use musigen_core::osc::{FmParams, VOLUME};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Static settings for one engine instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Output sample rate in Hz.
    pub sample_rate: u32,
    /// Device channel count. Mono output is duplicated to every channel.
    pub channels: u16,
    /// Fixed device block size in frames; `None` lets the driver choose.
    pub block_size: Option<u32>,
    /// Output amplitude of every source.
    pub volume: f32,
    /// Sine, FM carrier and wavetable playback frequency.
    pub carrier_hz: f32,
    pub mod_hz: f32,
    pub mod_index: f32,
    /// Delay line length in seconds.
    pub delay_seconds: f32,
    /// Echo gain in [0, 1).
    pub feedback: f32,
    /// Output device name (substring match); `None` uses the system default.
    pub device_name: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let fm = FmParams::default();
        Self {
            sample_rate: 44_100,
            channels: 1,
            block_size: None,
            volume: VOLUME,
            carrier_hz: fm.carrier_hz,
            mod_hz: fm.mod_hz,
            mod_index: fm.index,
            delay_seconds: DEFAULT_DELAY_SECONDS,
            feedback: DEFAULT_FEEDBACK,
            device_name: None,
        }
    }
}

impl EngineConfig {
    /// FM settings derived from this config.
    #[inline]
    pub fn fm_params(&self) -> FmParams {
        FmParams { carrier_hz: self.carrier_hz, mod_hz: self.mod_hz, index: self.mod_index }
    }

    /// Delay ring length in samples (22 050 for the defaults).
    #[inline]
    pub fn delay_capacity(&self) -> usize {
        let samples = self.sample_rate as f32 * self.delay_seconds;
        if samples.is_finite() && samples >= 1.0 { samples as usize } else { 0 }
    }

    /// Check every field; the first violation wins.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate == 0 {
            return Err(ConfigError::InvalidSampleRate);
        }
        if self.channels == 0 {
            return Err(ConfigError::InvalidChannels);
        }
        if !(self.volume.is_finite() && self.volume >= 0.0) {
            return Err(ConfigError::InvalidVolume(self.volume));
        }
        for (name, value) in [
            ("carrier_hz", self.carrier_hz),
            ("mod_hz", self.mod_hz),
            ("mod_index", self.mod_index),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::InvalidFrequency { name, value });
            }
        }
        if !(0.0..1.0).contains(&self.feedback) {
            return Err(ConfigError::InvalidFeedback(self.feedback));
        }
        let capacity = self.delay_capacity();
        if capacity == 0 {
            return Err(ConfigError::EmptyDelay);
        }
        if let Some(frames) = self.block_size {
            let frames = frames as usize;
            if frames == 0 {
                return Err(ConfigError::EmptyBlock);
            }
            if frames > capacity {
                return Err(ConfigError::FrameCountTooLarge { frames, capacity });
            }
        }
        Ok(())
    }
}
