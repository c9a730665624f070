//! Session bootstrap.
//!
//! Establishes who is calling and what the application configuration is
//! before a route is resolved. Both lookups run concurrently and fail
//! independently; the bootstrap itself always produces a `Session`.

use crate::errors::ClientError;
use crate::models::Session;
use crate::observability::metrics;
use crate::services::session_client::SessionClientTrait;
use common::secret::SecretString;
use std::sync::Arc;
use std::time::Instant;
use tracing::instrument;

/// Builds a fresh `Session` for each navigation.
#[derive(Clone)]
pub struct SessionBootstrapLoader {
    client: Arc<dyn SessionClientTrait>,
}

impl SessionBootstrapLoader {
    pub fn new(client: Arc<dyn SessionClientTrait>) -> Self {
        Self { client }
    }

    /// Fetch the current user and the application configuration.
    ///
    /// Waits for both requests to settle. A failed user lookup yields an
    /// anonymous session; a failed configuration lookup yields
    /// `app_config: None` and is logged. Never fails.
    #[instrument(skip_all, name = "gate.bootstrap")]
    pub async fn bootstrap(&self, access_token: Option<&SecretString>) -> Session {
        let start = Instant::now();

        let (user_result, config_result) = tokio::join!(
            self.client.current_user(access_token),
            self.client.app_configuration(access_token),
        );

        let user = match user_result {
            Ok(user) => Some(user),
            Err(ClientError::Unauthorized) => {
                tracing::debug!(target: "gate.bootstrap", "Caller is not signed in");
                None
            }
            Err(e) => {
                // Treated as signed out; the guard will send the caller to login
                tracing::debug!(target: "gate.bootstrap", error = %e, "Current user lookup failed");
                None
            }
        };

        let app_config = match config_result {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::error!(
                    target: "gate.bootstrap",
                    error = %e,
                    error_kind = e.kind(),
                    "Failed to get application configuration"
                );
                None
            }
        };

        metrics::record_bootstrap(user.is_some(), app_config.is_some(), start.elapsed());

        Session { user, app_config }
    }
}
