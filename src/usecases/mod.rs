//! Use Cases Layer - Application Business Logic
//!
//! Orchestrates domain logic with port interfaces to implement the
//! service's core workflow. Each use case is a self-contained business
//! operation.
//!
//! Use cases:
//! - `TradeExecutor`: validate, sign and dispatch one signal with retry

pub mod executor;

pub use executor::{ExecutionError, TradeExecutor};
