//! Shared argument groups and helpers.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use musigen_core::dsp::{peak, rms};
use musigen_engine::{EngineConfig, SourceKind};

/// Engine settings: an optional TOML file overlaid with command-line flags.
#[derive(Args, Debug, Clone, Default)]
pub struct EngineArgs {
    /// TOML file with engine settings
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output sample rate in Hz
    #[arg(long)]
    pub sample_rate: Option<u32>,

    /// Output channel count (mono is duplicated to every channel)
    #[arg(long)]
    pub channels: Option<u16>,

    /// Fixed block size in frames
    #[arg(long)]
    pub block_size: Option<u32>,

    /// Output volume
    #[arg(long)]
    pub volume: Option<f32>,

    /// Echo gain in [0, 1)
    #[arg(long)]
    pub feedback: Option<f32>,
}

impl EngineArgs {
    /// Load the config file (if any), apply flags, validate.
    pub fn load(&self) -> anyhow::Result<EngineConfig> {
        let mut cfg = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading config {}", path.display()))?;
                toml::from_str::<EngineConfig>(&text).with_context(|| format!("parsing config {}", path.display()))?
            }
            None => EngineConfig::default(),
        };

        if let Some(sr) = self.sample_rate {
            cfg.sample_rate = sr;
        }
        if let Some(ch) = self.channels {
            cfg.channels = ch;
        }
        if let Some(bs) = self.block_size {
            cfg.block_size = Some(bs);
        }
        if let Some(v) = self.volume {
            cfg.volume = v;
        }
        if let Some(fb) = self.feedback {
            cfg.feedback = fb;
        }

        cfg.validate()?;
        Ok(cfg)
    }
}

/// Parse a source name for clap.
pub fn parse_source(s: &str) -> Result<SourceKind, String> {
    s.parse::<SourceKind>().map_err(|e| e.to_string())
}

/// One-line level readout of a block of samples.
pub fn meter_line(samples: &[f32]) -> String {
    let p = peak(samples);
    let r = rms(samples);
    format!("peak {p:.3} ({}) | rms {r:.3} ({})", fmt_db(p), fmt_db(r))
}

fn fmt_db(level: f32) -> String {
    if level <= 1.0e-6 {
        "-inf dB".to_string()
    } else {
        format!("{:.1} dB", 20.0 * level.log10())
    }
}
