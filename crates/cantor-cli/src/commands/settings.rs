//! Settings inspection and validation command.

use cantor_config::{EngineConfig, Settings};
use clap::{Args, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Args)]
pub struct SettingsArgs {
    #[command(subcommand)]
    command: SettingsCommand,
}

#[derive(Subcommand)]
enum SettingsCommand {
    /// Print the default settings snapshot
    Defaults {
        /// Output format
        #[arg(long, value_enum, default_value = "toml")]
        format: Format,
    },

    /// Parse a settings file and check every value against its range
    Check {
        /// Settings file (JSON or TOML)
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Print the effective engine configuration
    Engine {
        /// Configuration file (defaults to the platform config dir)
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Toml,
    Json,
}

pub fn run(args: SettingsArgs) -> anyhow::Result<()> {
    match args.command {
        SettingsCommand::Defaults { format } => {
            let settings = Settings::default();
            let text = match format {
                Format::Toml => settings.to_toml()?,
                Format::Json => settings.to_json()?,
            };
            println!("{text}");
        }

        SettingsCommand::Check { file } => {
            let settings = Settings::load(&file)?;
            if let Err(e) = settings.validate() {
                anyhow::bail!("{}: {e}", file.display());
            }
            println!("{}: ok", file.display());
            println!("  scale {} in {}", settings.scale, settings.musical_key);
        }

        SettingsCommand::Engine { config } => {
            let config = match config {
                Some(path) => EngineConfig::load(path)?,
                None => EngineConfig::load_default()?,
            };
            println!("# {}", cantor_config::engine_config_path().display());
            println!("{}", config.to_toml()?);
        }
    }
    Ok(())
}
