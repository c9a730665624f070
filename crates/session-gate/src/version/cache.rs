//! Version freshness cache.
//!
//! Answers "what is the newest released version?" for the settings area,
//! hitting the release feed at most once per TTL. The entry is tied to the
//! running build: after an upgrade the old entry is discarded even if it has
//! not expired, so an instance never reports itself outdated against a
//! release it already runs.
//!
//! Two concurrent `get_newest_version` calls on a cold cache may both fetch
//! and both write. The last write wins; both values are equally fresh.

use crate::models::{VersionCacheEntry, VersionInformation};
use crate::observability::metrics;
use crate::services::release_feed::{strip_tag_prefix, ReleaseFeedTrait};
use crate::version::store::KeyValueStore;
use common::clock::Clock;
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

/// Store key holding the cached entry.
pub const VERSION_CACHE_KEY: &str = "version_cache";

/// Version of the running gate build.
pub const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Cache of the newest released version, backed by a `KeyValueStore`.
#[derive(Clone)]
pub struct VersionFreshnessCache {
    store: Arc<dyn KeyValueStore>,
    feed: Arc<dyn ReleaseFeedTrait>,
    clock: Arc<dyn Clock>,
    current_version: String,
    ttl: Duration,
}

impl VersionFreshnessCache {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        feed: Arc<dyn ReleaseFeedTrait>,
        clock: Arc<dyn Clock>,
        ttl: Duration,
    ) -> Self {
        Self {
            store,
            feed,
            clock,
            current_version: CURRENT_VERSION.to_string(),
            ttl,
        }
    }

    /// Override the running version.
    #[must_use]
    pub fn with_current_version(mut self, version: impl Into<String>) -> Self {
        self.current_version = version.into();
        self
    }

    pub fn current_version(&self) -> &str {
        &self.current_version
    }

    /// Newest released version, without a leading `v`.
    ///
    /// Served from the store while the entry is fresh and was written by
    /// this build. Otherwise the feed is consulted; if that fails the
    /// discarded entry's value is returned, or the running version when
    /// there was none. Never fails.
    #[instrument(skip_all, name = "gate.version.get_newest_version")]
    pub async fn get_newest_version(&self) -> String {
        let now = self.clock.now_millis();

        let stale = match self.read_entry() {
            Some(entry) if entry.is_valid(now, self.ttl, &self.current_version) => {
                metrics::record_version_cache("hit");
                return entry.newest_version;
            }
            Some(entry) => {
                tracing::debug!(
                    target: "gate.version",
                    cached = %entry.newest_version,
                    built_for = %entry.last_current_version,
                    "Discarding stale version cache entry"
                );
                self.delete_entry();
                Some(entry)
            }
            None => None,
        };

        match self.feed.latest_tag().await {
            Ok(tag) => {
                let newest = strip_tag_prefix(&tag).to_string();
                self.write_entry(&VersionCacheEntry {
                    newest_version: newest.clone(),
                    timestamp: self.clock.now_millis(),
                    last_current_version: self.current_version.clone(),
                });
                metrics::record_version_cache("refreshed");
                tracing::debug!(target: "gate.version", newest = %newest, "Refreshed newest version");
                newest
            }
            Err(e) => {
                tracing::warn!(
                    target: "gate.version",
                    error = %e,
                    error_kind = e.kind(),
                    "Failed to fetch latest release"
                );
                metrics::record_version_cache("fallback");
                stale.map_or_else(|| self.current_version.clone(), |entry| entry.newest_version)
            }
        }
    }

    /// True when the newest released version equals the running version.
    #[instrument(skip_all, name = "gate.version.is_up_to_date")]
    pub async fn is_up_to_date(&self) -> bool {
        self.purge_if_upgraded();
        self.get_newest_version().await == self.current_version
    }

    /// Version block shown in the settings area.
    pub async fn version_information(&self) -> VersionInformation {
        let newest = self.get_newest_version().await;
        let is_up_to_date = newest == self.current_version;

        VersionInformation {
            current_version: self.current_version.clone(),
            newest_version: Some(newest),
            is_up_to_date: Some(is_up_to_date),
        }
    }

    /// Delete the stored entry if it was written by a different build.
    ///
    /// Returns true if an entry was purged. Malformed entries are purged too.
    pub fn purge_if_upgraded(&self) -> bool {
        match self.read_entry() {
            Some(entry) if !entry.matches_build(&self.current_version) => {
                tracing::info!(
                    target: "gate.version",
                    previous = %entry.last_current_version,
                    current = %self.current_version,
                    "Running version changed, purging version cache"
                );
                self.delete_entry();
                true
            }
            _ => false,
        }
    }

    /// Read and parse the entry. Read failures are a miss; unparsable data
    /// is deleted and treated as a miss.
    fn read_entry(&self) -> Option<VersionCacheEntry> {
        let raw = match self.store.get(VERSION_CACHE_KEY) {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::warn!(target: "gate.store", error = %e, "Failed to read version cache");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(target: "gate.store", error = %e, "Malformed version cache entry");
                self.delete_entry();
                None
            }
        }
    }

    fn write_entry(&self, entry: &VersionCacheEntry) {
        let raw = match serde_json::to_string(entry) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(target: "gate.store", error = %e, "Failed to encode version cache entry");
                return;
            }
        };
        if let Err(e) = self.store.set(VERSION_CACHE_KEY, &raw) {
            tracing::warn!(target: "gate.store", error = %e, "Failed to write version cache");
        }
    }

    fn delete_entry(&self) {
        if let Err(e) = self.store.delete(VERSION_CACHE_KEY) {
            tracing::warn!(target: "gate.store", error = %e, "Failed to delete version cache");
        }
    }
}
