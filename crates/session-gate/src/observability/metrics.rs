//! Metrics definitions for Session Gate.
//!
//! All metrics follow Prometheus naming conventions:
//! - `gate_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded:
//! - `method`: HTTP methods
//! - `endpoint`: route families (`/login`, `/settings`, `/settings/admin`, ...)
//! - `status`: 3 values (success, error, timeout)
//! - `class`: 4 path classes
//! - `outcome`: allow/redirect for navigation, hit/refreshed/fallback for the
//!   version cache

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize the Prometheus recorder and return the handle used to
/// render `/metrics`.
///
/// Must be called before any metrics are recorded.
///
/// # Errors
///
/// Returns error if the recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("gate_http_request".to_string()),
            &[
                0.005, 0.010, 0.025, 0.050, 0.100, 0.150, 0.200, 0.300, 0.500, 1.000, 2.000,
            ],
        )
        .map_err(|e| format!("Failed to set HTTP request buckets: {e}"))?
        // Bootstrap is bounded by the backend request timeout
        .set_buckets_for_metric(
            Matcher::Prefix("gate_bootstrap".to_string()),
            &[
                0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.000, 2.500, 5.000, 10.000,
            ],
        )
        .map_err(|e| format!("Failed to set bootstrap buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

// ============================================================================
// HTTP Request Metrics
// ============================================================================

/// Record HTTP request completion.
///
/// Metric: `gate_http_requests_total`, `gate_http_request_duration_seconds`
/// Labels: `method`, `endpoint`, `status`
pub fn record_http_request(method: &str, endpoint: &str, status_code: u16, duration: Duration) {
    let normalized_endpoint = normalize_endpoint(endpoint);
    let status = categorize_status_code(status_code);

    histogram!("gate_http_request_duration_seconds",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint,
        "status" => status
    )
    .record(duration.as_secs_f64());

    counter!("gate_http_requests_total",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint,
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

/// Categorize HTTP status code into success/error/timeout.
///
/// Redirects issued by the guard count as success.
fn categorize_status_code(status_code: u16) -> &'static str {
    match status_code {
        200..=399 => "success",
        408 | 504 => "timeout",
        _ => "error",
    }
}

/// Route families used as `endpoint` labels, most specific first.
const ENDPOINT_FAMILIES: &[&str] = &[
    "/settings/admin",
    "/settings",
    "/login",
    "/lc",
    "/authorize",
    "/device",
    "/healthz",
    "/health",
    "/metrics",
];

/// Map a request path to its route family.
pub fn normalize_endpoint(path: &str) -> &'static str {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    if path == "/" {
        return "/";
    }

    ENDPOINT_FAMILIES
        .iter()
        .find(|root| {
            path.strip_prefix(**root)
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
        })
        .copied()
        .unwrap_or("/other")
}

// ============================================================================
// Navigation Metrics
// ============================================================================

/// Record a guard decision.
///
/// Metric: `gate_navigation_decisions_total`
/// Labels: `class`, `outcome` (allow, redirect)
pub fn record_navigation_decision(class: &'static str, redirected: bool) {
    let outcome = if redirected { "redirect" } else { "allow" };

    counter!("gate_navigation_decisions_total",
        "class" => class,
        "outcome" => outcome
    )
    .increment(1);
}

/// Record a completed session bootstrap.
///
/// Metric: `gate_bootstrap_duration_seconds`, `gate_bootstrap_total`
/// Labels: `user` (present, absent), `config` (present, absent)
pub fn record_bootstrap(user_present: bool, config_present: bool, duration: Duration) {
    let presence = |present: bool| if present { "present" } else { "absent" };

    histogram!("gate_bootstrap_duration_seconds").record(duration.as_secs_f64());

    counter!("gate_bootstrap_total",
        "user" => presence(user_present),
        "config" => presence(config_present)
    )
    .increment(1);
}

// ============================================================================
// Version Cache Metrics
// ============================================================================

/// Record how a newest-version lookup was answered.
///
/// Metric: `gate_version_cache_total`
/// Labels: `outcome` (hit, refreshed, fallback)
pub fn record_version_cache(outcome: &'static str) {
    counter!("gate_version_cache_total", "outcome" => outcome).increment(1);
}
