//! Cantor CLI - live vocal processing, offline renders and spectral profiles.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cantor")]
#[command(author, version, about = "Live vocal-processing engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process the microphone live, with optional backing track and recording
    Live(commands::live::LiveArgs),

    /// Render a vocal file through the full chain to a stereo WAV
    Render(commands::render::RenderArgs),

    /// Print the spectral fingerprint of a file as JSON
    Profile(commands::profile::ProfileArgs),

    /// List audio devices
    Devices(commands::devices::DevicesArgs),

    /// Print default settings or check a settings file
    Settings(commands::settings::SettingsArgs),

    /// Build preset requests and read preset responses
    Assist(commands::assist::AssistArgs),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();
    tracing_log::LogTracer::init().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Live(args) => commands::live::run(args),
        Commands::Render(args) => commands::render::run(args),
        Commands::Profile(args) => commands::profile::run(args),
        Commands::Devices(args) => commands::devices::run(args),
        Commands::Settings(args) => commands::settings::run(args),
        Commands::Assist(args) => commands::assist::run(args),
    }
}
