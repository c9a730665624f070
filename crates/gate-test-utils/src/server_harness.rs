//! Test server harness for E2E testing
//!
//! Provides `TestGateServer` for spawning real gate instances in tests. The
//! server talks to whatever identity backend and release feed URLs it is
//! given, typically `wiremock` servers owned by the test.

use common::clock::SystemClock;
use metrics_exporter_prometheus::PrometheusBuilder;
use session_gate::config::Config;
use session_gate::guard::RouteGuard;
use session_gate::routes::{self, AppState};
use session_gate::services::{ReleaseFeed, SessionBootstrapLoader, SessionClient};
use session_gate::version::{FileStore, KeyValueStore, MemoryStore, VersionFreshnessCache};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Test harness for spawning Session Gate in E2E tests.
///
/// # Example
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_anonymous_is_sent_to_login() -> Result<()> {
///     let server = TestGateServer::spawn(&backend.uri(), &feed.uri()).await?;
///
///     let response = server.client().get(server.url_for("/settings")).send().await?;
///
///     assert_eq!(response.status(), 303);
///     Ok(())
/// }
/// ```
pub struct TestGateServer {
    addr: SocketAddr,
    config: Config,
    version_cache: VersionFreshnessCache,
    _handle: JoinHandle<()>,
}

impl TestGateServer {
    /// Spawn a gate against the given backend and release feed.
    ///
    /// The release feed URL is used as-is, so pass the full latest-release
    /// endpoint if the mock matches on path.
    pub async fn spawn(api_base_url: &str, release_feed_url: &str) -> Result<Self, anyhow::Error> {
        let vars = HashMap::from([
            ("API_BASE_URL".to_string(), api_base_url.to_string()),
            ("RELEASE_FEED_URL".to_string(), release_feed_url.to_string()),
        ]);

        Self::spawn_with(vars, None).await
    }

    /// Spawn a gate from explicit configuration variables.
    ///
    /// # Arguments
    /// * `vars` - Configuration variables, as read by `Config::from_vars`
    /// * `current_version` - Running version to report; defaults to the
    ///   gate's own package version
    ///
    /// The server will:
    /// - Bind to a random available port (127.0.0.1:0)
    /// - Start the HTTP server in the background
    pub async fn spawn_with(
        mut vars: HashMap<String, String>,
        current_version: Option<&str>,
    ) -> Result<Self, anyhow::Error> {
        vars.insert("BIND_ADDRESS".to_string(), "127.0.0.1:0".to_string());

        let config = Config::from_vars(&vars)
            .map_err(|e| anyhow::anyhow!("Failed to create config: {}", e))?;

        let session_client = SessionClient::new(
            config.api_base_url.clone(),
            config.access_token_cookie_name.clone(),
            config.api_request_timeout(),
        )
        .map_err(|e| anyhow::anyhow!("Failed to create session client: {}", e))?
        .with_show_all_config(config.app_config_show_all);

        let release_feed = ReleaseFeed::new(
            config.release_feed_url.clone(),
            config.release_feed_timeout(),
        )
        .map_err(|e| anyhow::anyhow!("Failed to create release feed: {}", e))?;

        let store: Arc<dyn KeyValueStore> = match &config.version_cache_dir {
            Some(dir) => Arc::new(
                FileStore::open(dir)
                    .map_err(|e| anyhow::anyhow!("Failed to open version cache: {}", e))?,
            ),
            None => Arc::new(MemoryStore::new()),
        };

        let mut version_cache = VersionFreshnessCache::new(
            store,
            Arc::new(release_feed),
            Arc::new(SystemClock),
            config.version_cache_ttl(),
        );
        if let Some(version) = current_version {
            version_cache = version_cache.with_current_version(version);
        }
        version_cache.purge_if_upgraded();

        let state = Arc::new(AppState {
            config: config.clone(),
            bootstrap_loader: SessionBootstrapLoader::new(Arc::new(session_client)),
            guard: Arc::new(RouteGuard::default()),
            version_cache: version_cache.clone(),
        });

        // Recorder is not installed globally so many servers can coexist
        let metrics_handle = PrometheusBuilder::new().build_recorder().handle();

        // Build routes using session-gate's real route builder
        let app = routes::build_routes(state, metrics_handle);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            config,
            version_cache,
            _handle: handle,
        })
    }

    /// Get the base URL of the test server.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get the absolute URL for `path`.
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.url(), path)
    }

    /// Get the socket address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Get reference to the server configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Handle on the server's version cache (shares its store).
    pub fn version_cache(&self) -> &VersionFreshnessCache {
        &self.version_cache
    }

    /// HTTP client that does not follow redirects, so tests see the
    /// gate's `303` responses.
    pub fn client(&self) -> reqwest::Client {
        reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap_or_default()
    }
}

impl Drop for TestGateServer {
    fn drop(&mut self) {
        // Abort the HTTP server task when the test completes
        self._handle.abort();
    }
}
