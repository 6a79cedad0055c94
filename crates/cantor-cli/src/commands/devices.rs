//! Audio device listing command.

use cantor_io::{AudioDevice, default_device, list_devices};
use clap::{Args, Subcommand};

#[derive(Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    command: Option<DevicesCommand>,
}

#[derive(Subcommand)]
enum DevicesCommand {
    /// List all available audio devices
    List,

    /// Show default device information
    Info,
}

pub fn run(args: DevicesArgs) -> anyhow::Result<()> {
    match args.command.unwrap_or(DevicesCommand::List) {
        DevicesCommand::List => {
            let devices = list_devices()?;

            if devices.is_empty() {
                println!("No audio devices found.");
                return Ok(());
            }

            println!("Available Audio Devices");
            println!("=======================\n");

            let inputs: Vec<_> = devices.iter().filter(|d| d.is_input).collect();
            let outputs: Vec<_> = devices.iter().filter(|d| d.is_output).collect();
            print_section("Input Devices:", &inputs);
            print_section("Output Devices:", &outputs);

            println!(
                "Total: {} input(s), {} output(s)",
                inputs.len(),
                outputs.len()
            );
            println!();
            println!("Tip: set input_device / output_device in engine.toml (partial names match):");
            println!("  input_device = \"USB\"");
        }

        DevicesCommand::Info => {
            let (input, output) = default_device()?;

            println!("Default Audio Devices");
            println!("=====================\n");

            match input {
                Some(device) => {
                    println!("Default Input:");
                    println!("  Name: {}", device.name);
                    println!("  Sample Rate: {} Hz", device.default_sample_rate);
                }
                None => println!("Default Input: None"),
            }
            println!();
            match output {
                Some(device) => {
                    println!("Default Output:");
                    println!("  Name: {}", device.name);
                    println!("  Sample Rate: {} Hz", device.default_sample_rate);
                }
                None => println!("Default Output: None"),
            }
        }
    }

    Ok(())
}

fn print_section(title: &str, devices: &[&AudioDevice]) {
    if devices.is_empty() {
        return;
    }
    println!("{title}");
    for (idx, device) in devices.iter().enumerate() {
        let duplex = if device.is_input && device.is_output {
            " (duplex)"
        } else {
            ""
        };
        println!(
            "  [{}] {} ({} Hz){}",
            idx, device.name, device.default_sample_rate, duplex
        );
    }
    println!();
}
