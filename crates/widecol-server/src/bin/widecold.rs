//! widecol store daemon
//!
//! The `widecold` binary serves an in-memory wide-column store over TCP:
//! - Binds the configured address (default `127.0.0.1:9090`)
//! - Serves table and row requests from `widecol` clients
//! - Shuts down on SIGTERM/SIGINT
//!
//! Data lives only as long as the process.
//!
//! # Usage
//!
//! ```bash
//! # Start with default settings
//! widecold
//!
//! # Listen on all interfaces, custom port
//! widecold --host 0.0.0.0 --port 9191
//!
//! # Use configuration file
//! widecold --config /etc/widecol/widecold.toml
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use widecol_server::config::ServerConfig;
use widecol_server::server::StoreServer;
use widecol_store::MemoryStore;

/// widecol store daemon
#[derive(Parser, Debug)]
#[command(
    name = "widecold",
    version,
    about = "In-memory wide-column store server",
    long_about = "widecold keeps tables of column families in memory and serves them \
                  over TCP to widecol clients.\n\n\
                  Data is not persisted; restarting the daemon empties the store."
)]
struct Args {
    /// Host address to bind to
    #[arg(short = 'H', long, env = "WIDECOL_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short = 'p', long, env = "WIDECOL_PORT")]
    port: Option<u16>,

    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Maximum number of concurrent connections
    #[arg(long, env = "WIDECOL_MAX_CONNECTIONS")]
    max_connections: Option<usize>,

    /// Enable verbose logging
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", env = "WIDECOL_LOG_LEVEL")]
    log_level: String,

    /// Print configuration and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args);

    let config = load_config(&args)?;

    if args.print_config {
        println!("{}", config.to_toml()?);
        return Ok(());
    }

    run_server(config).await
}

fn init_logging(args: &Args) {
    let level = if args.verbose {
        "debug"
    } else {
        &args.log_level
    };

    let filter = EnvFilter::try_new(format!(
        "widecold={level},widecol_server={level},widecol_store={level}"
    ))
    .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

fn load_config(args: &Args) -> Result<ServerConfig> {
    let mut config = if let Some(path) = &args.config {
        ServerConfig::from_file(path)
            .with_context(|| format!("Failed to load config file {}", path.display()))?
    } else {
        ServerConfig::default()
    };

    if let Some(host) = &args.host {
        config.host = host.clone();
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(max) = args.max_connections {
        config.max_connections = max;
    }

    Ok(config)
}

async fn run_server(config: ServerConfig) -> Result<()> {
    let store = Arc::new(MemoryStore::new());

    info!("widecold v{}", env!("CARGO_PKG_VERSION"));
    info!("Server configuration:");
    info!("  Listen address: {}", config.socket_addr());
    info!("  Max connections: {}", config.max_connections);

    let server = StoreServer::bind(Arc::clone(&store), &config)
        .await
        .context("Failed to start store server")?;
    let stats = server.stats();

    info!("Press Ctrl+C to shutdown");

    if let Err(e) = server.serve_until(shutdown_signal()).await {
        error!("Server error: {}", e);
        return Err(anyhow::anyhow!("Server error: {}", e));
    }

    info!("Shutting down gracefully...");
    if stats.active() > 0 {
        warn!("Dropping {} open connections", stats.active());
    }
    info!(
        "Served {} requests over {} connections",
        stats.requests(),
        stats.accepted()
    );
    info!("Server stopped. Goodbye!");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
