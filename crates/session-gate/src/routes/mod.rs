//! HTTP routes for Session Gate.
//!
//! Defines the Axum router and application state.

use crate::config::Config;
use crate::guard::RouteGuard;
use crate::handlers;
use crate::middleware::{http_metrics_middleware, navigation_guard, NavigationState};
use crate::services::SessionBootstrapLoader;
use crate::version::VersionFreshnessCache;
use axum::{middleware, routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Service configuration.
    pub config: Config,

    /// Per-navigation session bootstrap.
    pub bootstrap_loader: SessionBootstrapLoader,

    /// Route authorization guard.
    pub guard: Arc<RouteGuard>,

    /// Newest-release cache for the settings area.
    pub version_cache: VersionFreshnessCache,
}

/// Build the application routes.
///
/// Creates an Axum router with:
/// - `/health`, `/healthz` - Liveness probes (simple "OK") - not guarded
/// - `/metrics` - Prometheus metrics endpoint - not guarded
/// - `/` and `/*path` - Page data, behind the navigation middleware
/// - TraceLayer for request logging
/// - HTTP metrics middleware
/// - 30 second request timeout
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let navigation_state = Arc::new(NavigationState {
        bootstrap_loader: state.bootstrap_loader.clone(),
        guard: state.guard.clone(),
        cookie_name: state.config.access_token_cookie_name.clone(),
    });

    let health_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/healthz", get(handlers::health_check));

    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    // Static routes above take priority over the catch-all
    let page_routes = Router::new()
        .route("/", get(handlers::page_data))
        .route("/*path", get(handlers::page_data))
        .route_layer(middleware::from_fn_with_state(
            navigation_state,
            navigation_guard,
        ))
        .with_state(state);

    // Layer order (bottom-to-top execution):
    // 1. TimeoutLayer - Timeout the request (innermost)
    // 2. TraceLayer - Log request details
    // 3. http_metrics_middleware - Record ALL responses (outermost)
    health_routes
        .merge(metrics_routes)
        .merge(page_routes)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(middleware::from_fn(http_metrics_middleware))
}
