//! Page data handler.
//!
//! Serves the data a page is rendered from once the navigation middleware
//! has allowed the request. Pages in the settings area additionally get the
//! version block from the version freshness cache.

use crate::models::{PageData, Session};
use crate::routes::AppState;
use axum::{extract::State, http::Uri, Extension, Json};
use std::sync::Arc;
use tracing::instrument;

/// Root of the settings area.
const SETTINGS_ROOT: &str = "/settings";

/// True for `/settings` and every path below it.
pub fn is_settings_area(path: &str) -> bool {
    path.strip_prefix(SETTINGS_ROOT)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// Handler for every guarded `GET`.
///
/// Requires the `Session` inserted by the navigation middleware.
#[instrument(skip_all, name = "gate.handlers.page_data", fields(path = %uri.path()))]
pub async fn page_data(
    State(state): State<Arc<AppState>>,
    uri: Uri,
    Extension(session): Extension<Session>,
) -> Json<PageData> {
    let version_information = if is_settings_area(uri.path()) {
        Some(state.version_cache.version_information().await)
    } else {
        None
    };

    Json(PageData {
        user: session.user,
        app_config: session.app_config,
        version_information,
    })
}
