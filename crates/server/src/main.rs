use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dynmap_core::{
    create_gate, load_config, prune_failed_runs, sweep_abandoned_runs, validate_config, Compositor,
    DomainGate, HttpTileFetcher, ImageCompositor, MosaicPipeline, TileFetcher,
};
use dynmap_server::{api::create_router, state::AppState};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("DYNMAP_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Configuration loaded successfully");
    info!("Gate method: {:?}", config.gate.method);
    info!("Workspace root: {:?}", config.workspace.root);

    tokio::fs::create_dir_all(&config.workspace.root)
        .await
        .with_context(|| format!("Failed to create workspace root {:?}", config.workspace.root))?;

    // Runs interrupted by a previous shutdown left unmarked directories behind.
    let abandoned = sweep_abandoned_runs(&config.workspace.root)
        .await
        .context("Failed to sweep abandoned run directories")?;
    let pruned = prune_failed_runs(
        &config.workspace.root,
        config.workspace.max_retained_failures,
    )
    .await
    .context("Failed to prune retained failed runs")?;
    if abandoned + pruned > 0 {
        info!(abandoned, pruned, "Cleaned up workspace root");
    }

    // Create domain gate
    let gate: Arc<dyn DomainGate> =
        Arc::from(create_gate(&config.gate).context("Failed to create domain gate")?);
    info!("Using domain gate: {}", gate.method_name());

    // Create tile fetcher
    let fetcher: Arc<dyn TileFetcher> = Arc::new(
        HttpTileFetcher::new(&config.fetch).context("Failed to create tile fetcher")?,
    );
    info!(
        "Tile fetcher ready (timeout: {:?})",
        Duration::from_secs(config.fetch.timeout_secs)
    );

    // Create compositor
    let compositor: Arc<dyn Compositor> = Arc::new(ImageCompositor::new(
        config.output.quality,
        config.output.layout,
    ));
    info!(
        "Compositor ready (quality: {}, layout: {:?})",
        config.output.quality, config.output.layout
    );

    let pipeline = MosaicPipeline::new(gate, fetcher, compositor, config.fetch.scheme.clone());

    // Create app state
    let addr = SocketAddr::new(config.server.host, config.server.port);
    let state = Arc::new(AppState::new(config, pipeline));

    // Create router
    let app = create_router(state);

    // Start server
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
