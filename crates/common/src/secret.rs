//! Secret types for access tokens and other credentials.
//!
//! Re-exports [`secrecy`] so that every crate in the workspace carries caller
//! credentials the same way. The access token read from the session cookie is
//! forwarded to the identity backend on every bootstrap; wrapping it in
//! `SecretString` means a stray `{:?}` in a log line or a `#[derive(Debug)]`
//! on a request struct prints `[REDACTED]` instead of a bearer credential.
//!
//! # Example
//!
//! ```rust
//! use common::secret::{ExposeSecret, SecretString};
//!
//! #[derive(Debug)]
//! struct NavigationRequest {
//!     path: String,
//!     access_token: Option<SecretString>,
//! }
//!
//! let req = NavigationRequest {
//!     path: "/settings".to_string(),
//!     access_token: Some(SecretString::from("eyJhbGciOi...")),
//! };
//!
//! // The token is redacted in Debug output
//! assert!(!format!("{req:?}").contains("eyJhbGciOi"));
//!
//! // Forwarding it requires an explicit call
//! let raw: Option<&str> = req.access_token.as_ref().map(|t| t.expose_secret());
//! assert!(raw.is_some());
//! ```
//!
//! Use `SecretString` for access tokens, refresh tokens and API keys. Only
//! call `expose_secret()` at the point the value is written onto the wire.

pub use secrecy::{ExposeSecret, SecretString};
