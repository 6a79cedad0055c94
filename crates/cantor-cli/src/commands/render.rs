//! Offline render: a vocal file through the full graph into a stereo WAV.
//!
//! Drives the engine on the offline backend and captures the master mix with
//! the recorder, so the file holds exactly what a live recording would.

use super::common::{EngineOptions, levels, linear_to_db};
use cantor_engine::{Engine, FileRole};
use cantor_io::{OfflineBackend, decode_file};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Args)]
pub struct RenderArgs {
    /// Vocal file (wav, mp3, flac, ogg, m4a)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output WAV file (32-bit float, stereo)
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    #[command(flatten)]
    engine: EngineOptions,

    /// Backing track mixed in after the effects
    #[arg(short, long, value_name = "FILE")]
    backing: Option<PathBuf>,

    /// Seconds rendered after the vocal ends, for echo and reverb tails
    #[arg(long, default_value = "2.0")]
    tail: f32,
}

pub fn run(args: RenderArgs) -> anyhow::Result<()> {
    let config = args.engine.engine_config()?;
    let settings = args.engine.settings()?;
    let sample_rate = config.sample_rate;
    let block = config.latency_mode.buffer_size() as usize;

    println!("Reading {}...", args.input.display());
    let vocal = decode_file(&args.input, sample_rate)?;
    println!(
        "  {} frames, {} Hz, {:.2}s",
        vocal.frames(),
        sample_rate,
        vocal.duration_secs()
    );
    let vocal_frames = vocal.frames();
    let tail_frames = (args.tail.max(0.0) * sample_rate as f32) as usize;
    let total = vocal_frames + tail_frames;

    let (backend, driver) = OfflineBackend::new();
    let mut engine = Engine::new(Box::new(backend), config);
    engine.apply_settings(&settings);
    engine.set_buffer(FileRole::Vocal, vocal);
    if let Some(path) = &args.backing {
        engine.load_file(FileRole::Backing, path)?;
    }

    engine.start_recording()?;
    engine.play_vocal(false)?;
    if args.backing.is_some() {
        engine.play_backing(false)?;
    }

    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("##-"),
    );

    let mut rendered = 0;
    while rendered < total {
        driver.render(block);
        rendered += block;
        pb.set_position(rendered.min(total) as u64);
    }
    pb.finish_with_message("done");

    engine.stop_recording();
    let recording = engine
        .wait_for_recording(Duration::from_secs(30))
        .ok_or_else(|| anyhow::anyhow!("recording did not finalize"))?;

    let mix = cantor_io::decode_bytes(recording.bytes().to_vec(), Some("wav"), sample_rate)?;
    let (peak, rms) = levels(mix.samples());
    println!("\nStats:");
    println!(
        "  Output: RMS {:.1} dB, Peak {:.1} dB, {:.2}s",
        linear_to_db(rms),
        linear_to_db(peak),
        recording.duration_secs()
    );

    println!("\nWriting {}...", args.output.display());
    recording.save(&args.output)?;
    println!("Done!");

    Ok(())
}
