//! fogplaned — the Fogplane daemon.
//!
//! Single binary that assembles the control plane:
//! - State store (redb)
//! - Node registry + expiry sweep
//! - Scheduler and rebalance analyzer
//! - Fleet metrics
//! - REST API
//!
//! # Usage
//!
//! ```text
//! fogplaned standalone --port 7070 --data-dir /var/lib/fogplane
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::info;

use fogplane_core::FogplaneConfig;

#[derive(Parser)]
#[command(name = "fogplaned", about = "Fogplane cloud-edge control plane")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the control plane in a single process.
    Standalone {
        /// Optional fogplane.toml; flags below override file values.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Port to listen on.
        #[arg(long)]
        port: Option<u16>,

        /// Data directory for persistent state.
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Node TTL in seconds.
        #[arg(long)]
        ttl: Option<u64>,

        /// Expiry sweep interval in seconds.
        #[arg(long)]
        sweep_interval: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,fogplaned=debug,fogplane=debug".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Standalone {
            config,
            port,
            data_dir,
            ttl,
            sweep_interval,
        } => {
            let mut config = match config {
                Some(path) => FogplaneConfig::from_file(&path)?,
                None => FogplaneConfig::default(),
            };
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(data_dir) = data_dir {
                config.server.data_dir = data_dir;
            }
            if let Some(ttl) = ttl {
                config.registry.ttl_seconds = ttl;
            }
            if let Some(sweep_interval) = sweep_interval {
                config.registry.sweep_interval_seconds = sweep_interval;
            }
            config.validate()?;

            run_standalone(config).await
        }
    }
}

async fn run_standalone(config: FogplaneConfig) -> anyhow::Result<()> {
    info!("Fogplane daemon starting in standalone mode");

    // Ensure data directory exists.
    std::fs::create_dir_all(&config.server.data_dir)?;
    let db_path = config.server.data_dir.join("fogplane.redb");

    // ── Initialize subsystems ──────────────────────────────────

    let store = fogplane_state::StateStore::open(&db_path)?;
    info!(path = ?db_path, "state store opened");

    let registry = fogplane_registry::NodeRegistry::new(
        store.clone(),
        Duration::from_secs(config.registry.ttl_seconds),
    )?;
    info!(ttl_secs = config.registry.ttl_seconds, "node registry initialized");

    let scheduler = fogplane_scheduler::Scheduler::new(registry.clone(), store.clone());
    let analyzer = fogplane_scheduler::RebalanceAnalyzer::new(scheduler.clone());
    info!("scheduler initialized");

    let metrics = fogplane_metrics::FleetMetrics::new();

    // ── Shutdown signal ────────────────────────────────────────

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ── Background expiry sweep ────────────────────────────────

    let sweep_interval = Duration::from_secs(config.registry.sweep_interval_seconds);
    let sweep_handle = tokio::spawn({
        let registry = registry.clone();
        let shutdown = shutdown_rx.clone();
        async move {
            registry.run(sweep_interval, shutdown).await;
        }
    });

    // ── Start API server ───────────────────────────────────────

    let router = fogplane_api::build_router(fogplane_api::ApiState {
        registry,
        scheduler,
        analyzer,
        metrics,
    });
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));

    info!(%addr, "API server starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Graceful shutdown on Ctrl-C.
    let server = axum::serve(listener, router).with_graceful_shutdown(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install CTRL+C handler");
        info!("shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    server.await?;

    // Wait for background tasks.
    let _ = sweep_handle.await;

    info!("Fogplane daemon stopped");
    Ok(())
}
