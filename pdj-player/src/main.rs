//! PDJ player - main entry point
//!
//! Starts the playlist-clip player service: audio output, playback engine,
//! transport, local playlist store, and the HTTP/SSE control API.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pdj_common::config::Config;
use pdj_player::api::{self, AppContext};
use pdj_player::audio::{CpalOutput, NullSink, SampleSink, WORKING_SAMPLE_RATE};
use pdj_player::playback::PlaybackEngine;
use pdj_player::services::{CatalogClient, HttpAssetProvider, PublishClient};
use pdj_player::state::SharedState;
use pdj_player::store::PlaylistStore;
use pdj_player::transport::TransportController;

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "pdj-player")]
#[command(about = "Playlist-clip player service for PDJ")]
#[command(version)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, env = "PDJ_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on (overrides the config file)
    #[arg(short, long, env = "PDJ_PORT")]
    port: Option<u16>,

    /// Path to the playlist database (overrides the config file)
    #[arg(short, long, env = "PDJ_DATABASE")]
    database: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pdj_player=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(database) = args.database {
        config.database_path = database;
    }
    let config = Arc::new(config);

    info!("Starting PDJ player on port {}", config.port);

    let state = Arc::new(SharedState::new());
    state.set_volume(config.playback.volume);

    // Audio output; headless fallback keeps editing and publishing usable
    // on machines without a device
    let sink: Arc<dyn SampleSink> =
        match CpalOutput::new(config.playback.device.clone(), Arc::clone(&state.volume)) {
            Ok(output) => Arc::new(output),
            Err(e) => {
                warn!("audio output unavailable ({}), running headless", e);
                Arc::new(NullSink::new(WORKING_SAMPLE_RATE))
            }
        };

    let engine = PlaybackEngine::new(
        Arc::clone(&state),
        sink,
        Duration::from_millis(config.playback.progress_tick_ms),
    );

    let transport = Arc::new(TransportController::new(
        Arc::clone(&state),
        engine,
        HttpAssetProvider::new(),
        config.playback.loop_playlist,
    ));
    transport.spawn_auto_advance();

    let store = PlaylistStore::open(&config.database_path)
        .await
        .context("Failed to open playlist store")?;

    let ctx = AppContext {
        state,
        transport,
        catalog: Arc::new(CatalogClient::new(config.catalog.api_base_url.clone())),
        publisher: Arc::new(PublishClient::new(config.catalog.api_base_url.clone())),
        store: Arc::new(store),
        config: Arc::clone(&config),
    };

    let app = api::create_router(ctx);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

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
