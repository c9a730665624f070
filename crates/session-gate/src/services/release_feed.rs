//! Release feed client.
//!
//! Fetches the tag of the latest published release. Calls are bounded by a
//! short timeout so a slow feed never holds up the settings area for long.

use crate::errors::ClientError;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::instrument;

/// Release payload; only the tag is consumed.
#[derive(Debug, Clone, Deserialize)]
pub struct LatestRelease {
    pub tag_name: String,
}

/// Trait for release feed operations (enables mocking).
#[async_trait::async_trait]
pub trait ReleaseFeedTrait: Send + Sync {
    /// Fetch the raw tag of the latest release (e.g. `"v1.4.0"`).
    async fn latest_tag(&self) -> Result<String, ClientError>;
}

/// HTTP release feed client.
#[derive(Clone)]
pub struct ReleaseFeed {
    client: Client,
    url: String,
}

impl ReleaseFeed {
    /// Create a release feed client.
    ///
    /// # Arguments
    ///
    /// * `url` - Latest-release endpoint
    /// * `timeout` - Total time allowed for a single fetch
    ///
    /// # Errors
    ///
    /// Returns `ClientError::NetworkFailure` if the HTTP client cannot be built.
    pub fn new(url: String, timeout: Duration) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(timeout)
            // The GitHub API rejects requests without a User-Agent
            .user_agent(concat!("session-gate/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                tracing::error!(target: "gate.services.release_feed", error = %e, "Failed to build HTTP client");
                ClientError::NetworkFailure(e.to_string())
            })?;

        Ok(Self { client, url })
    }
}

#[async_trait::async_trait]
impl ReleaseFeedTrait for ReleaseFeed {
    #[instrument(skip_all, name = "gate.services.release_feed.latest_tag")]
    async fn latest_tag(&self) -> Result<String, ClientError> {
        let response = self
            .client
            .get(&self.url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(ClientError::from)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::UnexpectedStatus {
                status: status.as_u16(),
                message: status
                    .canonical_reason()
                    .unwrap_or("unknown error")
                    .to_string(),
            });
        }

        let release: LatestRelease = response
            .json()
            .await
            .map_err(ClientError::from)?;

        if release.tag_name.trim().is_empty() {
            return Err(ClientError::Malformed("empty tag_name".to_string()));
        }

        Ok(release.tag_name)
    }
}

/// Strip a single leading `v`/`V` from a release tag.
pub fn strip_tag_prefix(tag: &str) -> &str {
    tag.strip_prefix(['v', 'V']).unwrap_or(tag)
}

/// Mock release feed module for testing.
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Mock release feed that replays scripted outcomes.
    ///
    /// The last outcome repeats once the script is exhausted.
    pub struct MockReleaseFeed {
        outcomes: Mutex<Vec<Result<String, ClientError>>>,
        call_count: AtomicUsize,
    }

    impl MockReleaseFeed {
        /// Feed that always reports `tag`.
        pub fn returning(tag: &str) -> Self {
            Self::with_outcomes(vec![Ok(tag.to_string())])
        }

        /// Feed that always fails with `error`.
        pub fn failing(error: ClientError) -> Self {
            Self::with_outcomes(vec![Err(error)])
        }

        /// Feed that returns `outcomes` in order.
        pub fn with_outcomes(outcomes: Vec<Result<String, ClientError>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes),
                call_count: AtomicUsize::new(0),
            }
        }

        /// Number of fetches made.
        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl ReleaseFeedTrait for MockReleaseFeed {
        async fn latest_tag(&self) -> Result<String, ClientError> {
            let count = self.call_count.fetch_add(1, Ordering::SeqCst);

            let outcomes = self
                .outcomes
                .lock()
                .map_err(|_| ClientError::NetworkFailure("mock poisoned".to_string()))?;

            let last = outcomes.len().saturating_sub(1);
            outcomes
                .get(count.min(last))
                .cloned()
                .unwrap_or_else(|| Err(ClientError::NetworkFailure("no outcome".to_string())))
        }
    }
}
