//! Session Gate
//!
//! Entry point for the navigation gate in front of the identity provider's
//! web front end.

use common::clock::SystemClock;
use session_gate::config::Config;
use session_gate::errors::GateError;
use session_gate::guard::RouteGuard;
use session_gate::observability::metrics::init_metrics_recorder;
use session_gate::routes::{self, AppState};
use session_gate::services::{ReleaseFeed, SessionBootstrapLoader, SessionClient};
use session_gate::version::{FileStore, KeyValueStore, MemoryStore, VersionFreshnessCache};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "session_gate=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Session Gate");

    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        GateError::Config(e.to_string())
    })?;

    info!(
        bind_address = %config.bind_address,
        app_config_show_all = config.app_config_show_all,
        version_cache_dir = ?config.version_cache_dir,
        version_cache_ttl_seconds = config.version_cache_ttl_seconds,
        "Configuration loaded successfully"
    );

    // Must be installed before any metric is recorded
    let metrics_handle = init_metrics_recorder().map_err(|e| {
        error!("Failed to initialize metrics recorder: {}", e);
        GateError::Metrics(e)
    })?;

    let session_client = SessionClient::new(
        config.api_base_url.clone(),
        config.access_token_cookie_name.clone(),
        config.api_request_timeout(),
    )?
    .with_show_all_config(config.app_config_show_all);

    let release_feed = ReleaseFeed::new(
        config.release_feed_url.clone(),
        config.release_feed_timeout(),
    )?;

    let store: Arc<dyn KeyValueStore> = match &config.version_cache_dir {
        Some(dir) => {
            info!(dir = %dir.display(), "Using file-backed version cache");
            Arc::new(FileStore::open(dir)?)
        }
        None => Arc::new(MemoryStore::new()),
    };

    let version_cache = VersionFreshnessCache::new(
        store,
        Arc::new(release_feed),
        Arc::new(SystemClock),
        config.version_cache_ttl(),
    );

    // Entries written by a previous build are never valid for this one
    version_cache.purge_if_upgraded();

    info!(
        current_version = %version_cache.current_version(),
        "Version cache ready"
    );

    let bind_address = config.bind_address.clone();

    let state = Arc::new(AppState {
        config,
        bootstrap_loader: SessionBootstrapLoader::new(Arc::new(session_client)),
        guard: Arc::new(RouteGuard::default()),
        version_cache,
    });

    let app = routes::build_routes(state, metrics_handle);

    let addr: SocketAddr = bind_address.parse().map_err(|e| {
        error!("Invalid bind address: {}", e);
        GateError::Bind(format!("{bind_address}: {e}"))
    })?;

    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
        error!("Failed to bind {}: {}", addr, e);
        GateError::Bind(e.to_string())
    })?;

    info!("Session Gate listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| GateError::Serve(e.to_string()))?;

    info!("Session Gate shutdown complete");

    Ok(())
}

/// Listens for shutdown signals (SIGTERM, SIGINT).
/// Returns when a shutdown signal is received and drain period is complete.
async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received SIGINT, starting graceful shutdown..."),
            Err(e) => error!("Failed to listen for SIGINT: {}", e),
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received SIGTERM, starting graceful shutdown...");
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    let drain_secs: u64 = std::env::var("GATE_DRAIN_SECONDS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);

    if drain_secs > 0 {
        warn!("Draining connections for {} seconds...", drain_secs);
        tokio::time::sleep(Duration::from_secs(drain_secs)).await;
        info!("Drain period complete");
    } else {
        info!("Skipping drain period (GATE_DRAIN_SECONDS=0)");
    }
}
