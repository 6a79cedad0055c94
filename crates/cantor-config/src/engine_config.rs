//! Engine configuration file (`engine.toml`).
//!
//! ```toml
//! sample_rate = 48000
//! latency_mode = "interactive"   # or "balanced"
//! monitor_delay_ms = 0.0
//! profile_duration_ms = 3000
//! input_device = "USB"           # optional, substring match
//! output_device = "Headphones"   # optional
//! input_channels = 1
//! output_channels = 2
//! ```
//!
//! Every field is optional; a missing file at the default location means
//! defaults.

use crate::error::{ConfigError, read_to_string, write_string};
use crate::paths::engine_config_path;
use crate::validation::{FieldRange, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Latency/stability trade-off of the audio graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LatencyMode {
    /// Smallest buffers the device allows.
    #[default]
    Interactive,
    /// Larger buffers, fewer dropouts.
    Balanced,
}

impl LatencyMode {
    /// Backend buffer size in frames.
    pub fn buffer_size(self) -> u32 {
        match self {
            LatencyMode::Interactive => 128,
            LatencyMode::Balanced => 1024,
        }
    }

    /// Lowercase name as used in configuration files.
    pub fn as_str(self) -> &'static str {
        match self {
            LatencyMode::Interactive => "interactive",
            LatencyMode::Balanced => "balanced",
        }
    }
}

impl fmt::Display for LatencyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LatencyMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "interactive" => Ok(LatencyMode::Interactive),
            "balanced" => Ok(LatencyMode::Balanced),
            other => Err(ValidationError::Invalid {
                param: "latency_mode".into(),
                reason: format!("expected 'interactive' or 'balanced', got '{other}'"),
            }),
        }
    }
}

/// Monitor delay range in milliseconds.
pub const MONITOR_DELAY_RANGE_MS: FieldRange = FieldRange::new("monitor_delay_ms", 0.0, 200.0);

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Graph sample rate in Hz.
    pub sample_rate: u32,
    /// Latency mode the engine starts in.
    pub latency_mode: LatencyMode,
    /// Initial monitor sync delay in milliseconds (0–200).
    pub monitor_delay_ms: f32,
    /// Spectral profile length in milliseconds.
    pub profile_duration_ms: u64,
    /// Input device name filter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_device: Option<String>,
    /// Output device name filter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_device: Option<String>,
    /// Microphone channel count; channels are averaged to mono.
    pub input_channels: u16,
    /// Output channel count; the stereo bus fills the first two.
    pub output_channels: u16,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            latency_mode: LatencyMode::Interactive,
            monitor_delay_ms: 0.0,
            profile_duration_ms: 3000,
            input_device: None,
            output_device: None,
            input_channels: 1,
            output_channels: 2,
        }
    }
}

impl EngineConfig {
    /// Parse TOML, defaulting missing fields.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load and validate a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let config = Self::from_toml(&read_to_string(path)?)?;
        config.validate()?;
        tracing::debug!(path = %path.display(), mode = %config.latency_mode, "loaded engine config");
        Ok(config)
    }

    /// Load from the platform config directory; a missing file yields
    /// defaults.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = engine_config_path();
        if path.is_file() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "no engine config, using defaults");
            Ok(Self::default())
        }
    }

    /// Save to `path`, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        write_string(path.as_ref(), &self.to_toml()?)
    }

    /// Check for values the engine cannot run with.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = Vec::new();

        if self.sample_rate == 0 {
            errors.push(ValidationError::Invalid {
                param: "sample_rate".into(),
                reason: "must be positive".into(),
            });
        }
        if let Err(e) = MONITOR_DELAY_RANGE_MS.check(self.monitor_delay_ms) {
            errors.push(e);
        }
        for (param, channels) in [
            ("input_channels", self.input_channels),
            ("output_channels", self.output_channels),
        ] {
            if channels == 0 {
                errors.push(ValidationError::Invalid {
                    param: param.into(),
                    reason: "must be at least 1".into(),
                });
            }
        }

        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(ValidationError::Multiple(errors)),
        }
    }

    /// Monitor delay in seconds.
    pub fn monitor_delay_secs(&self) -> f32 {
        MONITOR_DELAY_RANGE_MS.clamp(self.monitor_delay_ms) / 1000.0
    }
}
