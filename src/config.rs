//! Practice configuration, read from YAML.
//!
//! ```yaml
//! key: F
//! scale: mixolydian
//! base-octave: 3
//! playback:
//!   rate: 0.75
//!   loop: true
//! storage-dir: ~/.chordlab
//! ```
//!
//! Every field is optional. The raw file is deserialised first and then
//! checked field by field, so errors name the offending key.

use crate::error::{ChordlabError, Result};
use crate::note::PitchClass;
use crate::scale::ScaleKind;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_BASE_OCTAVE: i32 = 4;

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "kebab-case")]
struct RawConfig {
    key: Option<String>,
    scale: Option<String>,
    base_octave: Option<i32>,
    playback: Option<RawPlayback>,
    storage_dir: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default)]
struct RawPlayback {
    rate: Option<f64>,
    #[serde(rename = "loop")]
    looping: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackConfig {
    pub rate: f64,
    pub looping: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            rate: 1.0,
            looping: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PracticeConfig {
    pub key: Option<PitchClass>,
    pub scale: &'static ScaleKind,
    pub base_octave: i32,
    pub playback: PlaybackConfig,
    pub storage_dir: Option<PathBuf>,
}

impl Default for PracticeConfig {
    fn default() -> Self {
        Self {
            key: None,
            scale: ScaleKind::major(),
            base_octave: DEFAULT_BASE_OCTAVE,
            playback: PlaybackConfig::default(),
            storage_dir: None,
        }
    }
}

impl PracticeConfig {
    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let raw: RawConfig =
            serde_yaml::from_str(content).map_err(|e| ChordlabError::Config(e.to_string()))?;

        let key = match &raw.key {
            Some(k) => Some(
                PitchClass::from_name(k)
                    .ok_or_else(|| ChordlabError::Config(format!("Invalid key: {}", k)))?,
            ),
            None => None,
        };

        let scale = match &raw.scale {
            Some(s) => ScaleKind::from_id(s)
                .ok_or_else(|| ChordlabError::Config(format!("Invalid scale: {}", s)))?,
            None => ScaleKind::major(),
        };

        let base_octave = raw.base_octave.unwrap_or(DEFAULT_BASE_OCTAVE);
        if !(0..=9).contains(&base_octave) {
            return Err(ChordlabError::Config(format!(
                "Invalid base-octave: {} (expected 0 to 9)",
                base_octave
            )));
        }

        let raw_playback = raw.playback.unwrap_or_default();
        let rate = raw_playback.rate.unwrap_or(1.0);
        if !(rate.is_finite() && rate > 0.0) {
            return Err(ChordlabError::Config(format!(
                "Invalid playback.rate: {} (must be greater than 0)",
                rate
            )));
        }

        Ok(PracticeConfig {
            key,
            scale,
            base_octave,
            playback: PlaybackConfig {
                rate,
                looping: raw_playback.looping.unwrap_or(false),
            },
            storage_dir: raw.storage_dir,
        })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Scale notes for Roman numerals; `None` until a key is configured.
    pub fn scale_context(&self) -> Option<Vec<PitchClass>> {
        self.key.map(|root| self.scale.notes(root))
    }
}
