//! W3b Stitch API server.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────────┐
//!                    │                   W3B STITCH                     │
//!   Client Request   │  ┌─────────┐   ┌───────────────────────────────┐ │
//!   ─────────────────┼─▶│  http   │──▶│ handlers                      │ │
//!                    │  │ server  │   │ credential / anchor / verify  │ │
//!                    │  └─────────┘   │ receipt / network / qr        │ │
//!                    │                └──────┬──────────────┬─────────┘ │
//!                    │                       │              │           │
//!                    │                       ▼              ▼           │
//!                    │               ┌────────────┐  ┌────────────┐     │      Node
//!                    │               │ blockchain │  │  receipt   │     │    (JSON-RPC)
//!                    │               │ client +   │──┼────────────┼─────┼──────▶
//!                    │               │ tracker    │  │  store     │     │
//!                    │               └────────────┘  └────────────┘     │
//!                    │                                                  │
//!                    │  ┌────────────────────────────────────────────┐  │
//!                    │  │ config · observability · lifecycle         │  │
//!                    │  └────────────────────────────────────────────┘  │
//!                    └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use w3b_stitch::config::load_config;
use w3b_stitch::lifecycle::signals::wait_for_signal;
use w3b_stitch::observability::{logging, metrics};
use w3b_stitch::{AppState, HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "w3b-stitch")]
#[command(about = "Hash media, anchor it on chain and verify receipts", long_about = None)]
struct Args {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = load_config(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "w3b-stitch starting");

    tracing::info!(
        bind_address = %config.listener.bind_address,
        network = %config.chain.network,
        endpoint = %config.chain.endpoint,
        anchored = config.anchor.forward_endpoint.is_some(),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let state = AppState::connect(config).await;
    let shutdown = Shutdown::new();
    tokio::spawn(wait_for_signal(shutdown.clone()));

    HttpServer::new(state).run(listener, shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
