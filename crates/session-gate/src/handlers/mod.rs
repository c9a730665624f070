//! HTTP request handlers for Session Gate.

pub mod health;
pub mod metrics;
pub mod page;

pub use health::health_check;
pub use metrics::metrics_handler;
pub use page::page_data;
