//! Live processing: microphone (or a vocal file) through the engine to the
//! output device until Ctrl+C.

use super::common::{EngineOptions, levels, linear_to_db};
use cantor_engine::{Engine, FileRole, PlaybackOptions};
use cantor_io::CpalBackend;
use clap::Args;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

#[derive(Args)]
pub struct LiveArgs {
    #[command(flatten)]
    engine: EngineOptions,

    /// Play this vocal file through the effects instead of the microphone
    #[arg(long, value_name = "FILE")]
    vocal: Option<PathBuf>,

    /// Backing track mixed in after the effects
    #[arg(short, long, value_name = "FILE")]
    backing: Option<PathBuf>,

    /// Loop the backing track
    #[arg(long = "loop")]
    looping: bool,

    /// Keep the processed voice out of the headphones
    #[arg(long)]
    no_monitor: bool,

    /// Monitor delay in milliseconds (0-200), overriding the configuration
    #[arg(long)]
    monitor_delay_ms: Option<f32>,

    /// Record the master mix and write it here on exit
    #[arg(short, long, value_name = "FILE")]
    record: Option<PathBuf>,

    /// Print a level meter
    #[arg(long)]
    meter: bool,
}

pub fn run(args: LiveArgs) -> anyhow::Result<()> {
    let config = args.engine.engine_config()?;
    let settings = args.engine.settings()?;
    let mode = config.latency_mode;

    let mut engine = Engine::new(Box::new(CpalBackend::new()), config);
    engine.apply_settings(&settings);
    if let Some(ms) = args.monitor_delay_ms {
        engine.set_monitor_delay(ms / 1000.0);
    }
    if let Some(path) = &args.backing {
        engine.load_file(FileRole::Backing, path)?;
    }
    if let Some(path) = &args.vocal {
        engine.load_file(FileRole::Vocal, path)?;
    }
    engine.init()?;

    let monitor = !args.no_monitor;
    if args.vocal.is_some() {
        engine.use_file(
            FileRole::Vocal,
            PlaybackOptions {
                looping: false,
                monitor,
            },
        )?;
    } else {
        engine.use_microphone(monitor)?;
    }
    if args.backing.is_some() {
        engine.play_backing(args.looping)?;
    }
    if args.record.is_some() {
        engine.start_recording()?;
    }

    println!("Live processing ({mode}, {} frames)", mode.buffer_size());
    println!("  Input:   {:?}", engine.input_source());
    println!("  Backing: {:?}", engine.bypass_source());
    println!("  Monitor: {}", if monitor { "on" } else { "off" });
    println!(
        "  Monitor delay: {:.0} ms",
        engine.monitor_delay() * 1000.0
    );
    if let Some(path) = &args.record {
        println!("  Recording to {}", path.display());
    }
    println!("\nPress Ctrl+C to stop...\n");

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        println!("\nStopping...");
        r.store(false, Ordering::SeqCst);
    })?;

    let tap = engine.visualization_tap();
    let mut scope = vec![0.0f32; tap.as_ref().map_or(0, |t| t.frequency_bin_count() * 2)];
    while running.load(Ordering::SeqCst) {
        std::thread::sleep(Duration::from_millis(100));
        if let (true, Some(tap)) = (args.meter, &tap) {
            tap.float_time_domain_data(&mut scope);
            let (peak, rms) = levels(&scope);
            print!(
                "\r  peak {:6.1} dB  rms {:6.1} dB",
                linear_to_db(peak),
                linear_to_db(rms)
            );
            std::io::stdout().flush()?;
        }
    }

    if let Some(path) = &args.record {
        engine.stop_recording();
        match engine.wait_for_recording(Duration::from_secs(30)) {
            Some(recording) => {
                recording.save(path)?;
                println!(
                    "Wrote {} ({:.1}s)",
                    path.display(),
                    recording.duration_secs()
                );
            }
            None => anyhow::bail!("recording did not finalize"),
        }
    }

    engine.teardown();
    println!("Done!");
    Ok(())
}
