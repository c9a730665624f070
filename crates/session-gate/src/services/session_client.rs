//! Identity backend HTTP client for session bootstrap.
//!
//! Performs the two calls a navigation needs: fetch the current user and
//! fetch the application configuration. The caller's access token is
//! forwarded as the access-token cookie so the backend sees the same
//! credentials the browser sent.
//!
//! # Security
//!
//! - Access tokens travel as `SecretString` and are only exposed when the
//!   `Cookie` header is written
//! - Backend error bodies are logged at debug level, never returned to the
//!   navigating caller

use crate::errors::ClientError;
use crate::models::{AppConfigEntry, AppConfigMap, User};
use common::secret::{ExposeSecret, SecretString};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{error, instrument};

/// Error body shape used by the identity backend: `{"error": "..."}`.
#[derive(Debug, Deserialize)]
struct BackendErrorBody {
    error: String,
}

/// Trait for session client operations (enables mocking).
#[async_trait::async_trait]
pub trait SessionClientTrait: Send + Sync {
    /// Fetch the signed-in user.
    ///
    /// Returns `ClientError::Unauthorized` when the caller is not signed in.
    async fn current_user(&self, access_token: Option<&SecretString>) -> Result<User, ClientError>;

    /// Fetch the application configuration as a typed map.
    async fn app_configuration(
        &self,
        access_token: Option<&SecretString>,
    ) -> Result<AppConfigMap, ClientError>;
}

/// HTTP client for the identity backend's session endpoints.
#[derive(Clone)]
pub struct SessionClient {
    /// HTTP client with configured timeouts.
    client: Client,

    /// Base URL of the backend API, without trailing slash.
    base_url: String,

    /// Cookie name the backend reads the access token from.
    cookie_name: String,

    /// Request `/application-configuration/all` instead of the public subset.
    show_all_config: bool,
}

impl SessionClient {
    /// Create a new session client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Backend API base URL (e.g., "http://localhost:1411/api")
    /// * `cookie_name` - Name of the access-token cookie
    /// * `timeout` - Per-request timeout
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NetworkFailure` if the HTTP client cannot be built.
    pub fn new(base_url: String, cookie_name: String, timeout: Duration) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| {
                error!(target: "gate.services.session_client", error = %e, "Failed to build HTTP client");
                ClientError::NetworkFailure(e.to_string())
            })?;

        Ok(Self {
            client,
            base_url,
            cookie_name,
            show_all_config: false,
        })
    }

    /// Request the full configuration set (`/all`) instead of the public one.
    pub fn with_show_all_config(mut self, show_all: bool) -> Self {
        self.show_all_config = show_all;
        self
    }

    fn config_path(&self) -> &'static str {
        if self.show_all_config {
            "/application-configuration/all"
        } else {
            "/application-configuration"
        }
    }

    /// Issue a GET with the caller's token and decode the JSON body.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        access_token: Option<&SecretString>,
    ) -> Result<T, ClientError> {
        let url = format!("{}{}", self.base_url, path);

        let mut request = self.client.get(&url);
        if let Some(token) = access_token {
            request = request.header(
                reqwest::header::COOKIE,
                format!("{}={}", self.cookie_name, token.expose_secret()),
            );
        }

        let response = request.send().await.map_err(|e| {
            tracing::debug!(target: "gate.services.session_client", path = %path, error = %e, "Backend request failed");
            ClientError::from(e)
        })?;

        handle_response(path, response).await
    }
}

/// Map a backend response to the decoded body or a typed error.
async fn handle_response<T: DeserializeOwned>(
    path: &str,
    response: reqwest::Response,
) -> Result<T, ClientError> {
    let status = response.status();

    if status.is_success() {
        return response.json::<T>().await.map_err(|e| {
            tracing::debug!(target: "gate.services.session_client", path = %path, error = %e, "Failed to parse backend response");
            ClientError::Malformed(e.to_string())
        });
    }

    if status.as_u16() == 401 || status.as_u16() == 403 {
        return Err(ClientError::Unauthorized);
    }

    // Prefer the backend's own error message when it sent one
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<BackendErrorBody>(&body)
        .map(|b| b.error)
        .unwrap_or_else(|_| {
            status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string()
        });

    tracing::debug!(
        target: "gate.services.session_client",
        path = %path,
        status = %status,
        message = %message,
        "Backend returned error status"
    );

    Err(ClientError::UnexpectedStatus {
        status: status.as_u16(),
        message,
    })
}

#[async_trait::async_trait]
impl SessionClientTrait for SessionClient {
    #[instrument(skip_all, name = "gate.services.session_client.current_user")]
    async fn current_user(&self, access_token: Option<&SecretString>) -> Result<User, ClientError> {
        // No token means nobody to look up. The backend would answer 401, so
        // the short-circuit yields the same `Unauthorized` without a round trip.
        if access_token.is_none() {
            return Err(ClientError::Unauthorized);
        }
        self.get_json("/users/me", access_token).await
    }

    #[instrument(skip_all, name = "gate.services.session_client.app_configuration")]
    async fn app_configuration(
        &self,
        access_token: Option<&SecretString>,
    ) -> Result<AppConfigMap, ClientError> {
        let entries: Vec<AppConfigEntry> = self.get_json(self.config_path(), access_token).await?;
        Ok(AppConfigMap::from_entries(entries))
    }
}

/// Mock session client module for testing.
///
/// This module provides mock implementations of the session client for use
/// in tests.
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Mock session client with fixed outcomes per call.
    pub struct MockSessionClient {
        user: Result<User, ClientError>,
        app_config: Result<AppConfigMap, ClientError>,
        user_calls: AtomicUsize,
        config_calls: AtomicUsize,
        /// Artificial latency applied to each call.
        delay: Option<Duration>,
        last_token: Mutex<Option<String>>,
    }

    impl MockSessionClient {
        /// Create a mock with explicit outcomes for both calls.
        pub fn new(
            user: Result<User, ClientError>,
            app_config: Result<AppConfigMap, ClientError>,
        ) -> Self {
            Self {
                user,
                app_config,
                user_calls: AtomicUsize::new(0),
                config_calls: AtomicUsize::new(0),
                delay: None,
                last_token: Mutex::new(None),
            }
        }

        /// Mock for an anonymous visitor with a working configuration endpoint.
        pub fn anonymous(app_config: AppConfigMap) -> Self {
            Self::new(Err(ClientError::Unauthorized), Ok(app_config))
        }

        /// Mock for a signed-in user with a working configuration endpoint.
        pub fn signed_in(user: User, app_config: AppConfigMap) -> Self {
            Self::new(Ok(user), Ok(app_config))
        }

        /// Delay every call by `delay` before answering.
        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        /// Number of `current_user` calls made.
        pub fn user_calls(&self) -> usize {
            self.user_calls.load(Ordering::SeqCst)
        }

        /// Number of `app_configuration` calls made.
        pub fn config_calls(&self) -> usize {
            self.config_calls.load(Ordering::SeqCst)
        }

        /// Access token passed to the most recent `current_user` call.
        pub fn last_token(&self) -> Option<String> {
            self.last_token.lock().ok().and_then(|token| token.clone())
        }
    }

    #[async_trait::async_trait]
    impl SessionClientTrait for MockSessionClient {
        async fn current_user(
            &self,
            access_token: Option<&SecretString>,
        ) -> Result<User, ClientError> {
            self.user_calls.fetch_add(1, Ordering::SeqCst);
            if let Ok(mut last) = self.last_token.lock() {
                *last = access_token.map(|token| token.expose_secret().to_string());
            }
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.user.clone()
        }

        async fn app_configuration(
            &self,
            _access_token: Option<&SecretString>,
        ) -> Result<AppConfigMap, ClientError> {
            self.config_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.app_config.clone()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> SessionClient {
        SessionClient::new(
            server.uri(),
            "__Host-access_token".to_string(),
            Duration::from_secs(2),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_current_user_forwards_cookie() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/me"))
            .and(header("cookie", "__Host-access_token=tok-123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "u1",
                "username": "anna",
                "isAdmin": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let token = SecretString::from("tok-123");
        let user = client.current_user(Some(&token)).await.unwrap();

        assert_eq!(user.username, "anna");
        assert!(user.is_admin);
    }

    #[tokio::test]
    async fn test_current_user_without_token_skips_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/me"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let result = client.current_user(None).await;

        assert_eq!(result, Err(ClientError::Unauthorized));
    }

    #[tokio::test]
    async fn test_current_user_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/me"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(serde_json::json!({"error": "You are not signed in"})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        let token = SecretString::from("expired");
        let result = client.current_user(Some(&token)).await;

        assert_eq!(result, Err(ClientError::Unauthorized));
    }

    #[tokio::test]
    async fn test_app_configuration_parses_triples() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/application-configuration"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"key": "appName", "type": "string", "value": "Pocket ID"},
                {"key": "sessionDuration", "type": "number", "value": "60"},
                {"key": "ldapEnabled", "type": "bool", "value": "false"}
            ])))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let config = client.app_configuration(None).await.unwrap();

        assert_eq!(config.get_str("appName"), Some("Pocket ID"));
        assert_eq!(config.get_number("sessionDuration"), Some(60.0));
        assert_eq!(config.get_bool("ldapEnabled"), Some(false));
    }

    #[tokio::test]
    async fn test_app_configuration_show_all_uses_all_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/application-configuration/all"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).with_show_all_config(true);
        let config = client.app_configuration(None).await.unwrap();

        assert!(config.is_empty());
    }

    #[tokio::test]
    async fn test_server_error_carries_backend_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/application-configuration"))
            .respond_with(
                ResponseTemplate::new(500)
                    .set_body_json(serde_json::json!({"error": "database is locked"})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        let result = client.app_configuration(None).await;

        assert_eq!(
            result,
            Err(ClientError::UnexpectedStatus {
                status: 500,
                message: "database is locked".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/application-configuration"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let result = client.app_configuration(None).await;

        assert!(matches!(result, Err(ClientError::Malformed(_))));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_network_failure() {
        // Port 9 (discard) on localhost is not listening in test environments
        let client = SessionClient::new(
            "http://127.0.0.1:9".to_string(),
            "__Host-access_token".to_string(),
            Duration::from_secs(2),
        )
        .unwrap();

        let result = client.app_configuration(None).await;
        assert!(matches!(
            result,
            Err(ClientError::NetworkFailure(_)) | Err(ClientError::Timeout)
        ));
    }

    #[tokio::test]
    async fn test_mock_counts_calls() {
        let mock = mock::MockSessionClient::anonymous(AppConfigMap::default());

        assert_eq!(
            mock.current_user(None).await,
            Err(ClientError::Unauthorized)
        );
        assert!(mock.app_configuration(None).await.is_ok());
        assert_eq!(mock.user_calls(), 1);
        assert_eq!(mock.config_calls(), 1);
    }
}
