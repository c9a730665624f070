//! Service layer for Session Gate.
//!
//! This module contains services that talk to external systems and the
//! bootstrap that combines them.
//!
//! # Components
//!
//! - `session_client` - HTTP client for the identity backend's session endpoints
//! - `release_feed` - HTTP client for the latest-release feed
//! - `bootstrap` - Per-navigation session bootstrap

pub mod bootstrap;
pub mod release_feed;
pub mod session_client;

pub use bootstrap::SessionBootstrapLoader;
pub use release_feed::{ReleaseFeed, ReleaseFeedTrait};
pub use session_client::{SessionClient, SessionClientTrait};
// Mocks exposed for integration tests
pub use release_feed::mock::MockReleaseFeed;
pub use session_client::mock::MockSessionClient;
