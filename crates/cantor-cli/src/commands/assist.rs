//! Preset requests and responses.
//!
//! The service itself is any program that reads the request document on
//! stdin and writes the JSON settings object on stdout.

use super::common::EngineOptions;
use super::profile::fingerprint_file;
use cantor_config::Settings;
use cantor_engine::{
    PresetRequest, PresetService, RetryPolicy, ServiceError, parse_response, request_settings,
};
use clap::{Args, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

#[derive(Args)]
pub struct AssistArgs {
    #[command(subcommand)]
    command: AssistCommand,
}

#[derive(Subcommand)]
enum AssistCommand {
    /// Print the request document for a description
    Request {
        #[command(flatten)]
        request: RequestArgs,
    },

    /// Read a saved service response and print the merged settings
    Parse {
        /// File holding the raw response text
        #[arg(value_name = "FILE")]
        response: PathBuf,

        /// Write the settings here (JSON or TOML by extension)
        #[arg(short, long, value_name = "FILE")]
        out: Option<PathBuf>,
    },

    /// Send a request through an external program, with retries
    Ask {
        #[command(flatten)]
        request: RequestArgs,

        /// Program that answers the request (document on stdin, response on stdout)
        #[arg(long, value_name = "PROGRAM")]
        via: PathBuf,

        /// Arguments passed to the program
        #[arg(long = "arg", value_name = "ARG", allow_hyphen_values = true)]
        args: Vec<String>,

        /// Retries after the first attempt for transient failures
        #[arg(long, default_value = "2")]
        retries: u32,

        /// Write the settings here (JSON or TOML by extension)
        #[arg(short, long, value_name = "FILE")]
        out: Option<PathBuf>,
    },
}

#[derive(Args)]
struct RequestArgs {
    /// Free-text description of the desired sound
    #[arg(value_name = "DESCRIPTION")]
    description: String,

    /// Profile this file and include its fingerprint in the request
    #[arg(long, value_name = "FILE")]
    profile: Option<PathBuf>,

    #[command(flatten)]
    engine: EngineOptions,
}

impl RequestArgs {
    fn build(&self) -> anyhow::Result<PresetRequest> {
        let request = PresetRequest::new(self.description.clone());
        Ok(match &self.profile {
            Some(path) => request.with_fingerprint(fingerprint_file(path, &self.engine, None)?),
            None => request,
        })
    }
}

/// A preset service backed by an external program.
struct ExternalService {
    program: PathBuf,
    args: Vec<String>,
}

impl PresetService for ExternalService {
    fn generate(&self, request: &PresetRequest) -> Result<String, ServiceError> {
        let document = serde_json::to_vec(&request.to_document())
            .map_err(|e| ServiceError::Fatal(e.to_string()))?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ServiceError::Fatal(format!("{}: {e}", self.program.display())))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(&document)
                .map_err(|e| ServiceError::Transient(e.to_string()))?;
        }
        let output = child
            .wait_with_output()
            .map_err(|e| ServiceError::Transient(e.to_string()))?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(ServiceError::Transient(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                stderr.trim()
            )))
        }
    }
}

pub fn run(args: AssistArgs) -> anyhow::Result<()> {
    match args.command {
        AssistCommand::Request { request } => {
            let request = request.build()?;
            println!("{}", serde_json::to_string_pretty(&request.to_document())?);
        }

        AssistCommand::Parse { response, out } => {
            let text = std::fs::read_to_string(&response)?;
            emit(&parse_response(&text)?, out.as_deref())?;
        }

        AssistCommand::Ask {
            request,
            via,
            args,
            retries,
            out,
        } => {
            let request = request.build()?;
            let service = ExternalService { program: via, args };
            let policy = RetryPolicy {
                retries,
                ..RetryPolicy::default()
            };
            emit(&request_settings(&service, &request, &policy)?, out.as_deref())?;
        }
    }
    Ok(())
}

fn emit(settings: &Settings, out: Option<&Path>) -> anyhow::Result<()> {
    if let Err(e) = settings.validate() {
        tracing::warn!(error = %e, "generated settings outside documented ranges");
    }
    match out {
        Some(path) => {
            settings.save(path)?;
            println!("Wrote {}", path.display());
        }
        None => println!("{}", settings.to_toml()?),
    }
    Ok(())
}
