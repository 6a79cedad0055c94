//! Offline spectral profile of a file.

use super::common::EngineOptions;
use cantor_engine::{
    Engine, FileRole, PROFILE_INTERVAL, ProfileStep, SpectralFingerprint, SpectralProfiler,
    sample_count,
};
use cantor_io::{OfflineBackend, decode_file};
use clap::Args;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Args)]
pub struct ProfileArgs {
    /// Audio file to profile, played through the vocal chain
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    #[command(flatten)]
    engine: EngineOptions,

    /// Profile length in milliseconds (defaults to the configured duration)
    #[arg(long)]
    duration_ms: Option<u64>,
}

pub fn run(args: ProfileArgs) -> anyhow::Result<()> {
    let fingerprint = fingerprint_file(&args.input, &args.engine, args.duration_ms)?;
    println!("{}", serde_json::to_string_pretty(&fingerprint)?);
    Ok(())
}

/// Play `input` through the vocal chain offline and profile the mix.
///
/// The tap is read once per rendered interval, so the result does not depend
/// on wall-clock time.
pub fn fingerprint_file(
    input: &Path,
    options: &EngineOptions,
    duration_ms: Option<u64>,
) -> anyhow::Result<SpectralFingerprint> {
    let config = options.engine_config()?;
    let settings = options.settings()?;
    let duration = Duration::from_millis(duration_ms.unwrap_or(config.profile_duration_ms));
    let sample_rate = config.sample_rate;
    let block = config.latency_mode.buffer_size() as usize;
    let interval_frames =
        (PROFILE_INTERVAL.as_secs_f64() * f64::from(sample_rate)).round() as usize;

    let vocal = decode_file(input, sample_rate)?;
    let (backend, driver) = OfflineBackend::new();
    let mut engine = Engine::new(Box::new(backend), config);
    engine.apply_settings(&settings);
    engine.set_buffer(FileRole::Vocal, vocal);
    engine.play_vocal(false)?;

    let tap = engine
        .visualization_tap()
        .ok_or_else(|| anyhow::anyhow!("engine has no visualization tap"))?;
    let mut profiler = SpectralProfiler::for_tap(&tap, duration);
    tracing::info!(samples = sample_count(duration), "profiling {}", input.display());

    loop {
        let mut rendered = 0;
        while rendered < interval_frames {
            driver.render(block);
            rendered += block;
        }
        if let ProfileStep::Done(fingerprint) = profiler.sample(&tap) {
            return Ok(fingerprint);
        }
    }
}
