//! # Gravity Node
//!
//! Runs one validator: ledger application, oracle loop and cross-chain
//! sync, over simulated target chains.
//!
//! ## Startup Sequence
//!
//! 1. Parse arguments, load and validate configuration
//! 2. Initialize logging
//! 3. Open the store, seed genesis if empty
//! 4. Spawn the oracle loop and the sync agent
//! 5. Produce blocks until Ctrl+C
//!
//! A fatal ledger error (store commit failure, bad genesis) exits with
//! status 1.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use node_runtime::{Node, NodeConfig};

/// Gravity Core validator node
#[derive(Parser, Debug)]
#[command(name = "gravity-node")]
#[command(about = "Cross-chain oracle validator node")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "gravity.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("[node] {:#}", e);
        eprintln!("gravity-node: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let args = Args::parse();
    let config = NodeConfig::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    gravity_telemetry::init_telemetry(&config.telemetry)?;

    info!("===========================================");
    info!("  Gravity Core Node v{}", env!("CARGO_PKG_VERSION"));
    info!("  Network: {}", config.telemetry.network);
    info!("===========================================");

    let node = Node::build(config)?;
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let mut handle = tokio::spawn(node.run(shutdown_rx));

    tokio::select! {
        finished = &mut handle => finished.context("node task panicked")?,
        signal = tokio::signal::ctrl_c() => {
            signal.context("waiting for Ctrl+C")?;
            info!("[node] Ctrl+C received, shutting down");
            let _ = shutdown_tx.send(true);
            handle.await.context("node task panicked")?
        }
    }
}
