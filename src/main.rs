//! Calculator API
//!
//! An authenticated, rate-limited JSON calculator built with Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ assign request id ─▶ log ─▶ rate limit ─▶ authenticate ─▶ handler
//!                                                      │               │            │
//!                                                 token bucket    user directory  operation
//!                                                 (refill task)   + JWT verifier   history
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use calculator_api::auth::JwtCredentials;
use calculator_api::config::load_config;
use calculator_api::http::{Collaborators, HttpServer, OsRngIds};
use calculator_api::lifecycle::{wait_for_signal, Shutdown};
use calculator_api::observability::{self, TracingAccessLog};
use calculator_api::store::{MemoryOperationStore, MemoryUserDirectory};

#[derive(Parser, Debug)]
#[command(name = "calculator-api", version, about = "Authenticated, rate-limited calculator API")]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address
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

    observability::logging::init_logging(&config.observability);
    tracing::info!("calculator-api v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        capacity = config.rate_limit.capacity,
        refill_rate = config.rate_limit.refill_rate,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => observability::metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let users = Arc::new(MemoryUserDirectory::from_config(&config.users));
    let operations = Arc::new(match &config.storage.history_path {
        Some(path) => MemoryOperationStore::load_from_file(Path::new(path))?,
        None => MemoryOperationStore::new(None),
    });
    let credentials = Arc::new(JwtCredentials::from_config(&config.auth));

    let collaborators = Collaborators {
        users,
        issuer: credentials.clone(),
        verifier: credentials,
        operations: operations.clone(),
        log: Arc::new(TracingAccessLog),
        ids: Arc::new(OsRngIds),
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, collaborators)?;

    let trigger = shutdown.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        trigger.trigger();
    });

    server.run(listener, &shutdown).await?;

    if let Err(e) = operations.save_to_file() {
        tracing::error!(error = %e, "Failed to save operation history");
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
