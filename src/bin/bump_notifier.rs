//! bump-notifier binary.
//!
//! Reads `DISCORD_TOKEN`, optionally a TOML config, then runs until killed.
//! Any startup failure exits with status 1.

use bump_notifier::{Credential, NotifierConfig, startup};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Discord bump reminder with an HTTP liveness endpoint.
#[derive(Parser)]
#[command(name = "bump-notifier", version, about)]
struct Cli {
    /// Path to TOML configuration file (default: $BUMP_NOTIFIER_CONFIG, else built-in defaults).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stdout)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("bump_notifier=info,warn")),
        )
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = NotifierConfig::load(cli.config.as_deref())?;
    // Checked before anything touches the network.
    let credential = Credential::from_env()?;

    tracing::info!("bump-notifier {} starting", env!("CARGO_PKG_VERSION"));
    startup::run(&config, credential).await?;
    Ok(())
}
