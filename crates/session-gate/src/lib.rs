//! Session Gate Library
//!
//! Navigation gate for an OpenID Connect identity provider's web front end.
//! For every page navigation it:
//!
//! - bootstraps the caller's session (current user and application
//!   configuration) from the identity backend
//! - decides whether the caller may see the requested route or must be
//!   redirected
//! - for the settings area, reports whether a newer release is available
//!
//! # Architecture
//!
//! ```text
//! routes/mod.rs -> middleware/navigation.rs -> services/bootstrap.rs
//!                                           -> guard.rs
//!               -> handlers/page.rs -> version/cache.rs -> version/store.rs
//! ```
//!
//! # Modules
//!
//! - `config` - Service configuration from environment
//! - `errors` - Error types
//! - `guard` - Route authorization rules and decisions
//! - `handlers` - HTTP request handlers
//! - `middleware` - Navigation guard and HTTP metrics middleware
//! - `models` - Data models
//! - `observability` - Prometheus metrics
//! - `routes` - Axum router setup
//! - `services` - Identity backend and release feed clients, session bootstrap
//! - `version` - Newest-release cache and its store

pub mod config;
pub mod errors;
pub mod guard;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod routes;
pub mod services;
pub mod version;
