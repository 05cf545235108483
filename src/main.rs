//! linekv server
//!
//! Sets up logging, the storage engine and its expiry sweeper, then accepts
//! TCP connections until Ctrl+C.

use clap::Parser;
use linekv::commands::CommandHandler;
use linekv::connection::{handle_connection, ConnectionStats};
use linekv::storage::{ExpiryConfig, ExpirySweeper, StorageEngine};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Server configuration
#[derive(Parser, Debug)]
#[command(name = "linekv", version, about = "In-memory typed key-value server")]
struct ServerConfig {
    /// Host to bind to
    #[arg(long, default_value = linekv::DEFAULT_HOST, env = "LINEKV_HOST")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = linekv::DEFAULT_PORT, env = "LINEKV_PORT")]
    port: u16,

    /// Milliseconds between two background expiry sweeps
    #[arg(long, default_value_t = 1000)]
    sweep_interval_ms: u64,

    /// Log filter, e.g. `debug` or `linekv=trace` (overrides RUST_LOG)
    #[arg(long)]
    log_level: Option<String>,
}

impl ServerConfig {
    /// Returns the bind address as a string
    fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn expiry_config(&self) -> ExpiryConfig {
        ExpiryConfig {
            interval: Duration::from_millis(self.sweep_interval_ms.max(1)),
        }
    }
}

fn init_logging(config: &ServerConfig) {
    let filter = match &config.log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

fn print_banner(config: &ServerConfig) {
    println!(
        r#"
linekv v{} - In-Memory Typed Key-Value Server
──────────────────────────────────────────────
Server started on {}
Ready to accept connections.

Use Ctrl+C to shutdown gracefully.
"#,
        linekv::VERSION,
        config.bind_address()
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::parse();

    init_logging(&config);

    // Bind first so a taken port fails before anything else starts
    let listener = TcpListener::bind(config.bind_address()).await?;

    print_banner(&config);

    // Create the storage engine (shared across all connections)
    let storage = Arc::new(StorageEngine::new());
    info!("Storage engine initialized");

    let sweeper = ExpirySweeper::start(Arc::clone(&storage), config.expiry_config());

    let stats = Arc::new(ConnectionStats::new());
    info!("Listening on {}", config.bind_address());

    let shutdown = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Shutdown signal received, stopping server..."),
            Err(e) => {
                error!(error = %e, "Failed to listen for Ctrl+C");
                std::future::pending::<()>().await
            }
        }
    };

    tokio::select! {
        _ = accept_loop(listener, storage, stats) => {}
        _ = shutdown => {}
    }

    sweeper.stop();
    info!("Server shutdown complete");
    Ok(())
}

/// Main loop that accepts incoming connections
async fn accept_loop(
    listener: TcpListener,
    storage: Arc<StorageEngine>,
    stats: Arc<ConnectionStats>,
) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let handler = CommandHandler::new(Arc::clone(&storage));
                let stats = Arc::clone(&stats);

                tokio::spawn(handle_connection(stream, addr, handler, stats));
            }
            Err(e) => {
                error!(error = %e, "Failed to accept connection");
            }
        }
    }
}
