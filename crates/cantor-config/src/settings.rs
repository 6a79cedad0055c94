//! The settings snapshot: every control of the vocal chain in one value.
//!
//! Field names serialize in camelCase (`inputGain`, `compressorRatio`, ...),
//! the schema the preset assistant answers in. Every field has a default, so
//! a partial object merges over [`Settings::default`]:
//!
//! ```rust
//! use cantor_config::{Scale, Settings};
//!
//! let s = Settings::from_json(r#"{ "pitchShift": 7, "scale": "Hijaz" }"#).unwrap();
//! assert_eq!(s.pitch_shift, 7.0);
//! assert_eq!(s.scale, Scale::Hijaz);
//! assert_eq!(s.compressor_ratio, 4.0);
//! ```

use crate::error::{ConfigError, read_to_string, write_string};
use crate::validation::{FieldRange, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Scale or maqam tag carried with a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Scale {
    /// Standard 12-tone.
    #[default]
    Chromatic,
    /// Major.
    Major,
    /// Natural minor.
    Minor,
    /// Maqam Bayati.
    Bayati,
    /// Maqam Hijaz.
    Hijaz,
    /// Maqam Rast.
    Rast,
    /// Maqam Kurd.
    Kurd,
    /// Maqam Saba.
    Saba,
    /// Maqam Sika.
    Sika,
    /// Maqam Ajam.
    Ajam,
    /// Maqam Nahawand.
    Nahawand,
}

impl Scale {
    /// Every scale, in display order.
    pub const ALL: [Scale; 11] = [
        Scale::Chromatic,
        Scale::Major,
        Scale::Minor,
        Scale::Bayati,
        Scale::Hijaz,
        Scale::Rast,
        Scale::Kurd,
        Scale::Saba,
        Scale::Sika,
        Scale::Ajam,
        Scale::Nahawand,
    ];

    /// Short character description.
    pub fn description(self) -> &'static str {
        match self {
            Scale::Chromatic => "Standard 12-tone",
            Scale::Major => "Happy, Bright",
            Scale::Minor => "Sad, Emotional",
            Scale::Bayati => "Folk, Deep, Classic Arabic",
            Scale::Hijaz => "Exotic, Mystical, Desert",
            Scale::Rast => "Pride, Power, Fundamental",
            Scale::Kurd => "Romantic, Soft, Modern",
            Scale::Saba => "Sadness, Pain, Longing",
            Scale::Sika => "Love, Quarter-tone depth",
            Scale::Ajam => "Major-like, Bold",
            Scale::Nahawand => "Emotional, Minor-like",
        }
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Musical key tag carried with a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MusicalKey {
    /// C
    #[default]
    C,
    /// C sharp
    #[serde(rename = "C#")]
    CSharp,
    /// D
    D,
    /// D sharp
    #[serde(rename = "D#")]
    DSharp,
    /// E
    E,
    /// F
    F,
    /// F sharp
    #[serde(rename = "F#")]
    FSharp,
    /// G
    G,
    /// G sharp
    #[serde(rename = "G#")]
    GSharp,
    /// A
    A,
    /// A sharp
    #[serde(rename = "A#")]
    ASharp,
    /// B
    B,
}

impl MusicalKey {
    /// All twelve keys from C.
    pub const ALL: [MusicalKey; 12] = [
        MusicalKey::C,
        MusicalKey::CSharp,
        MusicalKey::D,
        MusicalKey::DSharp,
        MusicalKey::E,
        MusicalKey::F,
        MusicalKey::FSharp,
        MusicalKey::G,
        MusicalKey::GSharp,
        MusicalKey::A,
        MusicalKey::ASharp,
        MusicalKey::B,
    ];

    /// Note name with `#` for sharps.
    pub fn name(self) -> &'static str {
        const NAMES: [&str; 12] = [
            "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
        ];
        NAMES[self as usize]
    }
}

impl fmt::Display for MusicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One full settings snapshot.
///
/// | Field | Range | Default |
/// |-------|-------|---------|
/// | `input_gain` | -12..12 dB | 0 |
/// | `high_pass` | on/off (100 Hz low cut) | off |
/// | `autotune_amount` | 0..1 wet | 0 |
/// | `pitch_shift` | -12..12 semitones | 0 |
/// | `low_gain` / `mid_gain` / `high_gain` | -15..15 dB | 0 |
/// | `air_mode` | on/off (+5 dB at 12 kHz) | off |
/// | `compressor_threshold` | -60..0 dB | -24 |
/// | `compressor_ratio` | 1..20 | 4 |
/// | `reverb_mix` | 0..1 | 0.1 |
/// | `delay_mix` | 0..1 | 0.2 |
/// | `delay_time` | 0..1 s | 0.3 |
/// | `delay_feedback` | 0..0.9 | 0.3 |
/// | `spatial_3d` | on/off (Haas widener) | off |
/// | `output_gain` | 0..1.5 | 1.0 |
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Pre-amp gain in dB.
    pub input_gain: f32,
    /// Low-cut filter at 100 Hz.
    pub high_pass: bool,
    /// Pitch shifter wet amount.
    pub autotune_amount: f32,
    /// Pitch shift in semitones.
    pub pitch_shift: f32,
    /// Scale or maqam tag.
    pub scale: Scale,
    /// Key tag.
    pub musical_key: MusicalKey,
    /// Low shelf gain in dB.
    pub low_gain: f32,
    /// Mid peak gain in dB.
    pub mid_gain: f32,
    /// High shelf gain in dB.
    pub high_gain: f32,
    /// Air shelf boost.
    pub air_mode: bool,
    /// Compressor threshold in dB.
    pub compressor_threshold: f32,
    /// Compressor ratio.
    pub compressor_ratio: f32,
    /// Reverb send level.
    pub reverb_mix: f32,
    /// Echo send level.
    pub delay_mix: f32,
    /// Echo time in seconds.
    pub delay_time: f32,
    /// Echo feedback gain.
    pub delay_feedback: f32,
    /// Stereo widening send.
    #[serde(rename = "spatial3D")]
    pub spatial_3d: bool,
    /// Master gain.
    pub output_gain: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            input_gain: 0.0,
            high_pass: false,
            autotune_amount: 0.0,
            pitch_shift: 0.0,
            scale: Scale::Chromatic,
            musical_key: MusicalKey::C,
            low_gain: 0.0,
            mid_gain: 0.0,
            high_gain: 0.0,
            air_mode: false,
            compressor_threshold: -24.0,
            compressor_ratio: 4.0,
            reverb_mix: 0.1,
            delay_mix: 0.2,
            delay_time: 0.3,
            delay_feedback: 0.3,
            spatial_3d: false,
            output_gain: 1.0,
        }
    }
}

impl Settings {
    /// Documented range of every numeric field, by serialized name.
    pub const RANGES: [FieldRange; 13] = [
        FieldRange::new("inputGain", -12.0, 12.0),
        FieldRange::new("autotuneAmount", 0.0, 1.0),
        FieldRange::new("pitchShift", -12.0, 12.0),
        FieldRange::new("lowGain", -15.0, 15.0),
        FieldRange::new("midGain", -15.0, 15.0),
        FieldRange::new("highGain", -15.0, 15.0),
        FieldRange::new("compressorThreshold", -60.0, 0.0),
        FieldRange::new("compressorRatio", 1.0, 20.0),
        FieldRange::new("reverbMix", 0.0, 1.0),
        FieldRange::new("delayMix", 0.0, 1.0),
        FieldRange::new("delayTime", 0.0, 1.0),
        FieldRange::new("delayFeedback", 0.0, 0.9),
        FieldRange::new("outputGain", 0.0, 1.5),
    ];

    /// Numeric field values in [`Settings::RANGES`] order.
    pub fn numeric_values(&self) -> [f32; 13] {
        [
            self.input_gain,
            self.autotune_amount,
            self.pitch_shift,
            self.low_gain,
            self.mid_gain,
            self.high_gain,
            self.compressor_threshold,
            self.compressor_ratio,
            self.reverb_mix,
            self.delay_mix,
            self.delay_time,
            self.delay_feedback,
            self.output_gain,
        ]
    }

    /// Check every numeric field against its range.
    ///
    /// The engine applies snapshots without this check; it is for callers
    /// that want to reject hand-written or generated values up front.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors: Vec<ValidationError> = Self::RANGES
            .iter()
            .zip(self.numeric_values())
            .filter_map(|(range, value)| range.check(value).err())
            .collect();

        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(ValidationError::Multiple(errors)),
        }
    }

    /// Parse JSON, merging missing fields over the defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Merge a parsed JSON value over the defaults.
    pub fn from_json_value(value: serde_json::Value) -> Result<Self, ConfigError> {
        Ok(serde_json::from_value(value)?)
    }

    /// Pretty JSON with camelCase field names.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse TOML, merging missing fields over the defaults.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// TOML with camelCase keys.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load from a `.json` file, or TOML for any other extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = read_to_string(path)?;
        let settings = if is_json(path) {
            Self::from_json(&content)?
        } else {
            Self::from_toml(&content)?
        };
        tracing::debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    /// Save as JSON or TOML by extension, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = if is_json(path) {
            self.to_json()?
        } else {
            self.to_toml()?
        };
        write_string(path, &content)
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}
