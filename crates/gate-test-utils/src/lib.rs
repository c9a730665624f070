//! # Gate Test Utilities
//!
//! Shared test utilities for Session Gate.
//!
//! This crate provides:
//! - Server test harness (`TestGateServer` for E2E tests)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use gate_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() -> Result<()> {
//!     let backend = wiremock::MockServer::start().await;
//!     let feed = wiremock::MockServer::start().await;
//!     let server = TestGateServer::spawn(&backend.uri(), &feed.uri()).await?;
//!
//!     let response = server.client().get(server.url_for("/health")).send().await?;
//!
//!     assert_eq!(response.status(), 200);
//!     Ok(())
//! }
//! ```

pub mod server_harness;

// Re-export commonly used items
pub use server_harness::*;
