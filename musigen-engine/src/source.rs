//! Source selection: what the engine should be playing.

use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// Signal source requested through the control API. `Stop` selects silence
/// and closes the output stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SourceKind {
    Sine,
    Fm,
    Wavetable,
    #[default]
    Stop,
}

impl SourceKind {
    /// Every selectable source, in menu order.
    pub const ALL: [SourceKind; 4] = [SourceKind::Sine, SourceKind::Fm, SourceKind::Wavetable, SourceKind::Stop];

    /// Lowercase name used by the CLI and in logs.
    pub fn name(self) -> &'static str {
        match self {
            SourceKind::Sine => "sine",
            SourceKind::Fm => "fm",
            SourceKind::Wavetable => "wavetable",
            SourceKind::Stop => "stop",
        }
    }

    /// Whether selecting this source keeps a stream open.
    #[inline]
    pub fn is_audible(self) -> bool {
        self != SourceKind::Stop
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SourceKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sine" => Ok(SourceKind::Sine),
            "fm" => Ok(SourceKind::Fm),
            "wavetable" | "wt" => Ok(SourceKind::Wavetable),
            "stop" | "silence" => Ok(SourceKind::Stop),
            _ => Err(ConfigError::UnknownSource(s.to_string())),
        }
    }
}

/// Observable state of the source state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PlaybackState {
    #[default]
    Stopped,
    PlayingSine,
    PlayingFm,
    PlayingWavetable,
}

impl PlaybackState {
    /// Source driving this state.
    pub fn source(self) -> SourceKind {
        match self {
            PlaybackState::Stopped => SourceKind::Stop,
            PlaybackState::PlayingSine => SourceKind::Sine,
            PlaybackState::PlayingFm => SourceKind::Fm,
            PlaybackState::PlayingWavetable => SourceKind::Wavetable,
        }
    }

    #[inline]
    pub fn is_playing(self) -> bool {
        self != PlaybackState::Stopped
    }
}

impl From<SourceKind> for PlaybackState {
    fn from(kind: SourceKind) -> Self {
        match kind {
            SourceKind::Sine => PlaybackState::PlayingSine,
            SourceKind::Fm => PlaybackState::PlayingFm,
            SourceKind::Wavetable => PlaybackState::PlayingWavetable,
            SourceKind::Stop => PlaybackState::Stopped,
        }
    }
}
