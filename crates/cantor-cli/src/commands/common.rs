//! Shared CLI helpers used across multiple commands.

use cantor_config::{EngineConfig, LatencyMode, Settings};
use clap::{Args, ValueEnum};
use std::path::PathBuf;

/// Latency mode as accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Latency {
    /// 128-frame buffers
    Interactive,
    /// 1024-frame buffers
    Balanced,
}

impl From<Latency> for LatencyMode {
    fn from(latency: Latency) -> Self {
        match latency {
            Latency::Interactive => LatencyMode::Interactive,
            Latency::Balanced => LatencyMode::Balanced,
        }
    }
}

/// Options shared by every command that builds an engine.
#[derive(Args, Debug, Clone)]
pub struct EngineOptions {
    /// Engine configuration file (TOML). Defaults to the platform config dir.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Settings snapshot (JSON or TOML)
    #[arg(short, long, value_name = "FILE")]
    pub settings: Option<PathBuf>,

    /// Latency mode, overriding the configuration file
    #[arg(long, value_enum)]
    pub latency: Option<Latency>,
}

impl EngineOptions {
    /// Load the engine configuration with command-line overrides applied.
    pub fn engine_config(&self) -> anyhow::Result<EngineConfig> {
        let mut config = match &self.config {
            Some(path) => EngineConfig::load(path)?,
            None => EngineConfig::load_default()?,
        };
        if let Some(latency) = self.latency {
            config.latency_mode = latency.into();
        }
        Ok(config)
    }

    /// Load the settings snapshot, or defaults when none was given.
    ///
    /// Out-of-range values are reported but still applied.
    pub fn settings(&self) -> anyhow::Result<Settings> {
        let Some(path) = &self.settings else {
            return Ok(Settings::default());
        };
        let settings = Settings::load(path)?;
        if let Err(e) = settings.validate() {
            tracing::warn!(path = %path.display(), error = %e, "settings outside documented ranges");
        }
        Ok(settings)
    }
}

/// Linear amplitude to dBFS, floored at -120.
pub fn linear_to_db(linear: f32) -> f32 {
    if linear <= 0.0 {
        -120.0
    } else {
        20.0 * linear.log10()
    }
}

/// Peak and RMS of interleaved samples.
pub fn levels(samples: &[f32]) -> (f32, f32) {
    if samples.is_empty() {
        return (0.0, 0.0);
    }
    let peak = samples.iter().map(|s| s.abs()).fold(0.0, f32::max);
    let rms = (samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32).sqrt();
    (peak, rms)
}
