//! AUV simulator API server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ admission (rate limit, filter) ──▶ handlers ──▶ vehicle state
//!                                                           │              ▲
//!     Client Response                                       │              │
//!     ◀────────────── hardening headers ◀───────────────────┘       physics loop (50 Hz)
//!
//!     config file ──▶ watcher ──▶ admission policy swap
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use auv_sim_api::config::validation::validate_config;
use auv_sim_api::config::{load_config, ConfigError, ConfigWatcher, SimConfig};
use auv_sim_api::lifecycle::{wait_for_signal, Shutdown};
use auv_sim_api::observability::{logging, metrics};
use auv_sim_api::HttpServer;

#[derive(Parser)]
#[command(name = "auv-sim")]
#[command(about = "Simulated underwater vehicle control API", long_about = None)]
struct Args {
    /// TOML configuration file, watched for changes.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => SimConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }
    validate_config(&config).map_err(ConfigError::Validation)?;

    logging::init_logging(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "auv-sim starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        requests_per_window = config.rate_limit.requests_per_window,
        window_secs = config.rate_limit.window_secs,
        step_ms = config.simulation.step_ms,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    // The watcher guard must outlive the server.
    let (_watcher, config_updates) = match &args.config {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            (Some(watcher.run()?), updates)
        }
        None => {
            let (_tx, updates) = mpsc::unbounded_channel();
            (None, updates)
        }
    };

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config)?;
    let server_task = tokio::spawn(server.run(listener, config_updates, shutdown.subscribe()));

    wait_for_signal().await;
    shutdown.trigger();

    server_task.await??;
    tracing::info!("auv-sim stopped");
    Ok(())
}
