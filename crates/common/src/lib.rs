//! Common utilities and types shared across Session Gate components.

#![warn(clippy::pedantic)]

/// Module for common data types
pub mod types;

/// Module for secret types that prevent accidental logging
pub mod secret;

/// Module for wall-clock time as an injectable capability
pub mod clock;
