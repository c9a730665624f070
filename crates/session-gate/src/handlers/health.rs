//! Health check handlers.
//!
//! `/health` and `/healthz` are liveness probes. They do not touch the
//! identity backend or the release feed.

/// Liveness probe handler.
pub async fn health_check() -> &'static str {
    "OK"
}
