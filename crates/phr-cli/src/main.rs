//! # phr CLI entry point
//!
//! Parses command-line arguments, loads anchoring configuration from the
//! environment once, and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use phr_anchor::AnchorConfig;
use phr_cli::anchor::{run_anchor, AnchorArgs};
use phr_cli::digest::{run_digest, DigestArgs};

/// Anchor health record digests on chain, or recompute them for verification.
#[derive(Parser, Debug)]
#[command(name = "phr", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Anchor a payload's digest (mock or live, per USE_MOCK_BLOCKCHAIN).
    Anchor(AnchorArgs),

    /// Print a payload's canonical form and digest.
    Digest(DigestArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity level.
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if cli.json_logs {
        builder.json().init();
    } else {
        builder.init();
    }

    tracing::debug!("phr CLI starting");

    let result = match cli.command {
        Commands::Anchor(args) => match AnchorConfig::from_env() {
            Ok(config) => {
                tracing::debug!(?config, "loaded anchoring configuration");
                run_anchor(&args, &config).await
            }
            Err(e) => Err(anyhow::Error::new(e).context("invalid anchoring configuration")),
        },
        Commands::Digest(args) => run_digest(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
