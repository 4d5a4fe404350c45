//! Metrics and Monitoring Adapters
//!
//! Provides the Prometheus registry rendered at `/metrics` on the main
//! webhook server. Health and status routes live with the webhook server
//! itself; there is no separate metrics listener.

pub mod prometheus;

pub use prometheus::MetricsRegistry;
