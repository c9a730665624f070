//! Middleware for Session Gate.
//!
//! # Components
//!
//! - `navigation` - Session bootstrap and route guard for page navigations
//! - `http_metrics` - HTTP request metrics

pub mod http_metrics;
pub mod navigation;

pub use http_metrics::http_metrics_middleware;
pub use navigation::{extract_access_token, navigation_guard, NavigationState};
