//! Movie Catalog - A read-mostly movie catalog API
//!
//! Serves movie queries and aggregate rankings over HTTP.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use movie_catalog::api::create_router;
use movie_catalog::store::{MemoryStore, MovieStore};
use movie_catalog::{AppState, CacheOptions, CatalogCaches, Config};

/// Main entry point for the catalog server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Open the movie store
/// 4. Build the catalog caches and register error logging
/// 5. Warm every cache; exit if the initial fetch fails
/// 6. Serve the API until SIGINT/SIGTERM, then stop the refresh timers
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();

    // LOG_SILENT wins over RUST_LOG
    let filter = if config.log_silent {
        tracing_subscriber::EnvFilter::new("off")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "movie_catalog=info,tower_http=info".into())
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Movie Catalog Server");
    info!(
        "Configuration loaded: port={}, refresh_interval={}s, auto_refresh={}, page_size={}",
        config.server_port, config.refresh_interval, config.auto_refresh, config.page_size
    );

    let store: Arc<dyn MovieStore> = Arc::new(
        MemoryStore::from_path(&config.data_path)
            .await
            .with_context(|| format!("failed to open movie store at {}", config.data_path))?,
    );

    let options = CacheOptions::new(config.refresh_period(), config.auto_refresh);
    let caches = CatalogCaches::new(Arc::clone(&store), options);
    caches.on_fetch_error(|cache, err| {
        error!(cache = cache, error = %err, "fetch config failure");
    });

    if let Err(err) = caches.warm_up().await {
        error!(error = %err, "initial cache fetch failed");
        std::process::exit(1);
    }

    let state = AppState::from_config(&config, caches.clone(), store);
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(caches))
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM), then stops cache refreshes.
async fn shutdown_signal(caches: CatalogCaches) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(error = %err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    caches.shutdown();
    info!("Cache refresh timers stopped");
}
