//! Passkey CLI - inspect WebAuthn ceremony payloads.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

mod commands;
mod exit_codes;
mod utils;

use exit_codes::ExitCode;
use utils::PayloadSource;

const AFTER_HELP: &str = "\
Exit codes:
  0   Success
  1   General error
  65  Malformed payload or failed --rp-id / --origin check
  66  Cannot read input file";

#[derive(Parser)]
#[command(name = "passkey")]
#[command(author, version, about = "Inspect WebAuthn/FIDO2 ceremony payloads", long_about = None)]
#[command(after_help = AFTER_HELP)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Input {
    /// Base64url payload
    #[arg(value_name = "PAYLOAD")]
    payload: Option<String>,

    /// Read the payload from a file (base64url text or raw bytes; `-` for stdin)
    #[arg(short, long, value_name = "PATH", conflicts_with = "payload")]
    file: Option<PathBuf>,

    /// Print JSON instead of a human-readable report
    #[arg(long)]
    json: bool,
}

impl Input {
    fn source(&self) -> PayloadSource {
        PayloadSource {
            payload: self.payload.clone(),
            file: self.file.clone(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Decode an attestation object (response.attestationObject)
    InspectAttestation {
        #[command(flatten)]
        input: Input,

        /// Check the RP ID hash against this RP ID
        #[arg(long, value_name = "RP_ID")]
        rp_id: Option<String>,
    },

    /// Decode authenticator data (response.authenticatorData)
    InspectAuthData {
        #[command(flatten)]
        input: Input,

        /// Check the RP ID hash against this RP ID
        #[arg(long, value_name = "RP_ID")]
        rp_id: Option<String>,
    },

    /// Decode client data (response.clientDataJSON)
    InspectClientData {
        #[command(flatten)]
        input: Input,

        /// Require this exact origin
        #[arg(long, value_name = "ORIGIN")]
        origin: Option<String>,
    },
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "passkey=debug,passkey_core=debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::InspectAttestation { input, rp_id } => {
            commands::inspect_attestation::execute(input.source(), rp_id, input.json)
        }
        Commands::InspectAuthData { input, rp_id } => {
            commands::inspect_auth_data::execute(input.source(), rp_id, input.json)
        }
        Commands::InspectClientData { input, origin } => {
            commands::inspect_client_data::execute(input.source(), origin, input.json)
        }
    };

    let exit = match result {
        Ok(()) => ExitCode::success(),
        Err(err) => ExitCode::from_anyhow(&err),
    };
    if let Some(message) = &exit.message {
        eprintln!("{} {}", "error:".red().bold(), message);
    }
    std::process::ExitCode::from(exit.code)
}
