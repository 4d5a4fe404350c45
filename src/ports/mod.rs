//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) that the usecases layer requires from
//! the outside world. Adapters implement these traits.
//!
//! Port categories:
//! - `ExchangeApi`: signed order dispatch against the exchange REST API

pub mod exchange;

pub use exchange::{ExchangeApi, ExchangeApiError};
