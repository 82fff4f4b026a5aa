//! resonance-pg - Similar-song playlist generator
//!
//! Serves `POST /generate-playlist` and `GET /health`.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use resonance_common::config::{default_config_path, load_toml_config};
use resonance_pg::config::ServiceConfig;
use resonance_pg::services::PlaylistService;
use resonance_pg::{build_http_client, build_router, AppState};

/// Command-line arguments for resonance-pg
#[derive(Parser, Debug)]
#[command(name = "resonance-pg")]
#[command(about = "Similar-song playlist generator")]
#[command(version)]
struct Args {
    /// Port to listen on (overrides the config file)
    #[arg(short, long, env = "RESONANCE_PORT")]
    port: Option<u16>,

    /// Path to the TOML config file
    #[arg(short, long, env = "RESONANCE_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let toml_config =
        load_toml_config(args.config.as_deref()).context("Failed to load configuration")?;

    let default_filter = format!(
        "resonance_pg={level},resonance_common={level},tower_http={level}",
        level = toml_config.logging.level
    );
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting resonance-pg v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    match args.config.clone().or_else(default_config_path) {
        Some(path) => info!("Config file: {}", path.display()),
        None => info!("Config file: none (built-in defaults)"),
    }

    let config = ServiceConfig::resolve(toml_config, args.port);
    info!(
        model = %config.generation.model,
        song_count = config.generation.song_count,
        timeout_ms = config.generation.timeout_ms,
        max_retries = config.generation.max_retries,
        catalog_enrichment = config.catalog_configured(),
        "Playlist generator configured"
    );

    let http_client = build_http_client().context("Failed to build HTTP client")?;
    let service = Arc::new(PlaylistService::from_config(&config, http_client));
    let app = build_router(AppState::new(service));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
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
            Ok(mut sigterm) => {
                sigterm.recv().await;
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
