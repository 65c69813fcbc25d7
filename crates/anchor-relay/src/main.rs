//! Relay command-line entry point

use anchor_core::claim::decode;
use anchor_core::decode_hex;
use anchor_relay::{http, ClaimService, Ed25519AddressVerifier, InMemoryLedger, RelayConfig};
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "anchor-relay")]
#[command(about = "Anchor relay - claim submission and root anchoring", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file path; defaults apply when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP relay
    Serve,

    /// Print the effective configuration
    Config,

    /// Decode a hex claim and print its kind, Hi and Hv
    Inspect {
        /// Claim bytes as hex
        value_hex: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(log_level).init();

    let config = RelayConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve => {
            let service = ClaimService::from_config(
                &config,
                Arc::new(Ed25519AddressVerifier),
                Arc::new(InMemoryLedger::new()),
            );
            http::serve(&config, Arc::new(service)).await?;
        }

        Commands::Config => {
            print!("{}", config.to_toml_string()?);
        }

        Commands::Inspect { value_hex } => {
            let claim = decode(&decode_hex(&value_hex)?)?;
            println!("kind:    {}", claim.kind());
            println!("version: {}", claim.version());
            println!("hi:      {}", claim.hi());
            println!("hv:      {}", claim.hv());
        }
    }

    Ok(())
}
