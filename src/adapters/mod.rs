//! Adapters Layer - Hexagonal Architecture Outer Ring
//!
//! Implements the port traits defined in `crate::ports` with concrete
//! external dependencies and hosts the inbound HTTP surface. Each
//! sub-module groups adapters by infrastructure concern.
//!
//! Adapter categories:
//! - `exchange`: exchange REST client and credential loading
//! - `webhook`: axum server, signature verification, reply envelopes
//! - `metrics`: Prometheus registry rendered at `/metrics`

pub mod exchange;
pub mod metrics;
pub mod webhook;
