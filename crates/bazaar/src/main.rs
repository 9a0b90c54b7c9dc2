use std::future::Future;
use std::io::Read;

use anyhow::{Context, Result};
use bazaar_models::config::BazaarConfig;
use bazaar_models::scenario::Scenario;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "bazaar",
    about = "Run producers and consumers against a shared marketplace"
)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/bazaar.toml")]
    config: String,

    /// Read the scenario JSON from a file instead of stdin
    #[arg(short, long)]
    input: Option<String>,

    /// Print the full session report as JSON instead of purchase lines
    #[arg(long)]
    json: bool,

    /// Pretty-print the JSON report
    #[arg(long, requires = "json")]
    pretty: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing (respects RUST_LOG env var)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config_str = std::fs::read_to_string(&cli.config)
        .with_context(|| format!("Failed to read config: {}", cli.config))?;
    let config: BazaarConfig =
        toml::from_str(&config_str).with_context(|| "Failed to parse config")?;

    let scenario_json = if let Some(input_path) = &cli.input {
        std::fs::read_to_string(input_path)
            .with_context(|| format!("Failed to read input: {input_path}"))?
    } else {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read from stdin")?;
        buf
    };
    let scenario = Scenario::from_json(&scenario_json).context("Failed to parse scenario JSON")?;

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(cancel_on_signal(tokio::signal::ctrl_c(), shutdown));

    let report = bazaar::run_session(&config, &scenario, cancel).await?;

    if cli.json {
        let output = if cli.pretty {
            serde_json::to_string_pretty(&report)?
        } else {
            serde_json::to_string(&report)?
        };
        println!("{output}");
    } else {
        for receipt in &report.receipts {
            for line in receipt.report_lines() {
                println!("{line}");
            }
        }
    }

    Ok(())
}

/// Cancel the session once `signal` fires. A handler that failed to install
/// leaves the session running.
async fn cancel_on_signal(
    signal: impl Future<Output = std::io::Result<()>>,
    cancel: CancellationToken,
) {
    match signal.await {
        Ok(()) => {
            tracing::info!("Received shutdown signal");
            cancel.cancel();
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        }
    }
}
