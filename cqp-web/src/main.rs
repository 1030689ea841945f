//! cqp-web - Coffee quality prediction web front-end
//!
//! Serves the intro and main pages plus the JSON API. Configuration comes
//! from the built-in table, an optional TOML file and command-line flags.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use cqp_common::artifact::store_from_config;
use cqp_common::config::CqpConfig;
use cqp_common::{ModelCatalog, PredictionHandler};
use cqp_web::{build_router, AppState};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for cqp-web
#[derive(Parser, Debug)]
#[command(name = "cqp-web")]
#[command(about = "Coffee quality prediction web front-end")]
#[command(version)]
struct Args {
    /// TOML config file merged over the built-in configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on (overrides server.host)
    #[arg(long, env = "CQP_HOST")]
    host: Option<String>,

    /// Port to listen on (overrides server.port)
    #[arg(short, long, env = "CQP_PORT")]
    port: Option<u16>,

    /// Directory of portable model exports (overrides artifacts.dir)
    #[arg(short, long, env = "CQP_ARTIFACT_DIR")]
    artifact_dir: Option<PathBuf>,

    /// Keep loaded models in memory between requests
    #[arg(long)]
    cache: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let (mut config, source) =
        CqpConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(dir) = args.artifact_dir {
        config.artifacts.dir = dir;
    }
    config.artifacts.cache |= args.cache;

    // Initialize tracing; RUST_LOG overrides the configured level
    let level = &config.logging.level;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("cqp_web={0},cqp_common={0},tower_http=info", level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting Coffee Quality Predictor (cqp-web) v{}",
        env!("CARGO_PKG_VERSION")
    );
    info!("Configuration: {}", source);

    let catalog = Arc::new(
        ModelCatalog::from_config(&config.catalog).context("Invalid model catalog")?,
    );
    let store = store_from_config(&config.artifacts).context("Invalid artifact configuration")?;
    info!(
        "Artifact backend: {} (dir {}, cache {})",
        store.backend(),
        config.artifacts.dir.display(),
        if config.artifacts.cache { "on" } else { "off" }
    );

    let state = AppState::new(PredictionHandler::new(catalog, store));
    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| {
            format!(
                "Invalid listen address {}:{}",
                config.server.host, config.server.port
            )
        })?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("cqp-web listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

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
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
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
