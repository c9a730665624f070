//! Newest-release tracking for the settings area.

pub mod cache;
pub mod store;

pub use cache::{VersionFreshnessCache, CURRENT_VERSION, VERSION_CACHE_KEY};
pub use store::{FileStore, KeyValueStore, MemoryStore};
