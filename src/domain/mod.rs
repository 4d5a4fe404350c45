//! Domain layer - Core business logic and models.
//!
//! Pure signal, order and signing logic for the webhook executor.
//! No I/O here (hexagonal architecture inner ring); everything is
//! deterministic given its inputs and testable in isolation.

pub mod order;
pub mod signal;
pub mod signing;

// Re-export core types for convenience
pub use order::{epoch_millis_now, ExecutionReport, OrderRequest, SignedOrder};
pub use signal::{SignalError, TradeSide, TradeSignal};
pub use signing::{hmac_sha256_hex, hmac_sha256_verify};
