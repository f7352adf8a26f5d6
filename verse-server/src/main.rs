//! verse-server - poem and progress storage service
//!
//! Serves the JSON API used by the trainer. Data lives in two JSON documents
//! inside the data folder.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info};
use verse_common::config::{resolve_data_dir, TomlConfig};
use verse_server::{build_router, AppState, JsonStore};

/// Command-line arguments for verse-server
#[derive(Parser, Debug)]
#[command(name = "verse-server")]
#[command(about = "Poem and progress storage service for verse")]
#[command(version)]
struct Args {
    /// Folder holding poems.json and progress.json
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Address to bind (defaults to the config file, then 127.0.0.1)
    #[arg(long, env = "VERSE_HOST")]
    host: Option<String>,

    /// Port to listen on (defaults to the config file, then 3001)
    #[arg(short, long, env = "VERSE_PORT")]
    port: Option<u16>,

    /// Config file path
    #[arg(short, long, env = "VERSE_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "verse_server=info,tower_http=info".into()),
        )
        .init();

    info!(
        "Starting verse-server v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let args = Args::parse();
    let config = TomlConfig::load_or_default(args.config.as_deref());

    let data_dir = resolve_data_dir(args.data_dir.as_deref(), &config);
    info!("Data folder: {}", data_dir.display());

    let store = JsonStore::open(&data_dir)
        .await
        .with_context(|| format!("Failed to open data folder {}", data_dir.display()))?;

    let app = build_router(AppState::new(store));

    let host = args.host.unwrap_or(config.server.host);
    let port = args.port.unwrap_or(config.server.port);
    let addr = format!("{}:{}", host, port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("verse-server listening on http://{}", addr);
    info!("Health check: http://{}/api/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
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
            Ok(mut stream) => {
                stream.recv().await;
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
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
