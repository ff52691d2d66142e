//! cpal-backed output device (feature `realtime`).
//!
//! Opens a stream at the engine's sample rate on the default output device or
//! on the first device whose name contains the requested string. The channel
//! count is the supported one nearest to the request; the engine fans its mono
//! signal out to whatever layout was opened. Devices that only accept
//! `i16`/`u16` samples get the `f32` render converted inside the callback.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SizedSample};

use crate::device::{AudioDevice, OutputStream, RenderCallback, StreamSpec};
use crate::error::DeviceError;

/// Names of every output device on the default host.
pub fn list_output_devices() -> Result<Vec<String>, DeviceError> {
    let host = cpal::default_host();
    let devices = host.output_devices().map_err(|e| DeviceError::Open(e.to_string()))?;
    Ok(devices.filter_map(|d| d.name().ok()).collect())
}

/// Name of the system default output device, if there is one.
pub fn default_output_device_name() -> Option<String> {
    cpal::default_host().default_output_device().and_then(|d| d.name().ok())
}

/// Output device on the platform's default audio host.
pub struct CpalDevice {
    host: Option<cpal::Host>,
    device: Option<cpal::Device>,
}

impl CpalDevice {
    /// Default output device, or the first whose name contains `name`
    /// (case-insensitive).
    pub fn open(name: Option<&str>) -> Result<Self, DeviceError> {
        let host = cpal::default_host();
        let device = match name {
            Some(search) => {
                let needle = search.to_lowercase();
                let mut found = None;
                for d in host.output_devices().map_err(|e| DeviceError::Open(e.to_string()))? {
                    if d.name().map(|n| n.to_lowercase().contains(&needle)).unwrap_or(false) {
                        found = Some(d);
                        break;
                    }
                }
                found.ok_or_else(|| DeviceError::NotFound(search.to_string()))?
            }
            None => host.default_output_device().ok_or(DeviceError::NoDevice)?,
        };
        tracing::info!(
            host = host.id().name(),
            device = %device.name().unwrap_or_default(),
            "cpal output device selected"
        );
        Ok(Self { host: Some(host), device: Some(device) })
    }

    /// Pick the output layout for `spec` among the device's supported ranges.
    fn choose_config(device: &cpal::Device, spec: &StreamSpec) -> Result<Layout, DeviceError> {
        let ranges = device
            .supported_output_configs()
            .map_err(|e| DeviceError::Open(e.to_string()))?;
        let candidates = ranges.map(|range| Candidate {
            channels: range.channels(),
            min_rate: range.min_sample_rate().0,
            max_rate: range.max_sample_rate().0,
            format: range.sample_format(),
        });
        nearest_layout(candidates, spec).ok_or_else(|| {
            DeviceError::UnsupportedFormat(format!("no {} Hz f32/i16/u16 output configuration", spec.sample_rate))
        })
    }
}

/// One supported configuration range, as reported by the device.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Candidate {
    channels: u16,
    min_rate: u32,
    max_rate: u32,
    format: cpal::SampleFormat,
}

/// Channel count and sample format a stream is opened with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Layout {
    channels: u16,
    format: cpal::SampleFormat,
}

/// Nearest usable range to `spec`.
///
/// The sample rate must be supported exactly, since the oscillators are
/// tuned to it. Channel count is scored by distance to the requested one
/// (mono is duplicated to any layout), then `f32` beats `i16` beats `u16`.
fn nearest_layout(candidates: impl IntoIterator<Item = Candidate>, spec: &StreamSpec) -> Option<Layout> {
    let mut best: Option<(u32, Layout)> = None;
    for c in candidates {
        if c.channels == 0 || !(c.min_rate..=c.max_rate).contains(&spec.sample_rate) {
            continue;
        }
        let format_pen = match c.format {
            cpal::SampleFormat::F32 => 0,
            cpal::SampleFormat::I16 => 1,
            cpal::SampleFormat::U16 => 2,
            _ => continue,
        };
        let ch_pen = u32::from(c.channels.abs_diff(spec.channels));
        let score = ch_pen.saturating_mul(10) + format_pen;
        if best.map_or(true, |(s, _)| score < s) {
            best = Some((score, Layout { channels: c.channels, format: c.format }));
        }
    }
    best.map(|(_, layout)| layout)
}

impl AudioDevice for CpalDevice {
    type Stream = CpalStream;

    fn name(&self) -> String {
        self.device.as_ref().and_then(|d| d.name().ok()).unwrap_or_else(|| "<released>".to_string())
    }

    fn open_output(&mut self, spec: &StreamSpec, callback: RenderCallback) -> Result<CpalStream, DeviceError> {
        let device = self.device.as_ref().ok_or(DeviceError::Released)?;
        let Layout { channels, format } = Self::choose_config(device, spec)?;
        if channels != spec.channels {
            tracing::info!(requested = spec.channels, opened = channels, "device channel layout differs");
        }

        let config = cpal::StreamConfig {
            channels,
            sample_rate: cpal::SampleRate(spec.sample_rate),
            buffer_size: match spec.block_size {
                Some(frames) => cpal::BufferSize::Fixed(frames),
                None => cpal::BufferSize::Default,
            },
        };

        let stream = match format {
            cpal::SampleFormat::F32 => build_f32_stream(device, &config, callback)?,
            cpal::SampleFormat::I16 => build_converted_stream::<i16>(device, &config, callback)?,
            cpal::SampleFormat::U16 => build_converted_stream::<u16>(device, &config, callback)?,
            other => return Err(DeviceError::UnsupportedFormat(format!("{other:?}"))),
        };
        tracing::debug!(?format, channels, sample_rate = spec.sample_rate, "output stream built");
        Ok(CpalStream { stream })
    }

    fn release(&mut self) {
        if self.device.take().is_some() {
            tracing::debug!("cpal device released");
        }
        self.host = None;
    }
}

fn build_f32_stream(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut callback: RenderCallback,
) -> Result<cpal::Stream, DeviceError> {
    let channels = config.channels;
    device
        .build_output_stream(
            config,
            move |output: &mut [f32], _: &cpal::OutputCallbackInfo| callback(output, channels),
            stream_error,
            None,
        )
        .map_err(|e| DeviceError::Open(e.to_string()))
}

/// Stream for integer devices: render into an `f32` staging buffer, then
/// convert. The buffer only grows if the driver asks for a larger block.
fn build_converted_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut callback: RenderCallback,
) -> Result<cpal::Stream, DeviceError>
where
    T: SizedSample + FromSample<f32> + Send + 'static,
{
    let channels = config.channels;
    let mut staging: Vec<f32> = Vec::with_capacity(8192);

    device
        .build_output_stream(
            config,
            move |output: &mut [T], _: &cpal::OutputCallbackInfo| {
                staging.resize(output.len(), 0.0);
                callback(&mut staging, channels);
                for (dst, &src) in output.iter_mut().zip(staging.iter()) {
                    *dst = T::from_sample(src);
                }
            },
            stream_error,
            None,
        )
        .map_err(|e| DeviceError::Open(e.to_string()))
}

fn stream_error(err: cpal::StreamError) {
    tracing::error!("cpal stream error: {err}");
}

/// Handle for a cpal output stream. Dropping it closes the stream.
pub struct CpalStream {
    stream: cpal::Stream,
}

impl OutputStream for CpalStream {
    fn start(&mut self) -> Result<(), DeviceError> {
        self.stream.play().map_err(|e| DeviceError::Start(e.to_string()))
    }

    fn stop(&mut self) -> Result<(), DeviceError> {
        self.stream.pause().map_err(|e| DeviceError::Stop(e.to_string()))
    }
}
