//! Exchange Execution Port - Signed Order Dispatch Interface
//!
//! The single seam between the trade executor and the exchange REST API.
//! Retry policy lives in the executor; implementors perform exactly one
//! HTTP call per invocation and classify its outcome so the retry
//! predicate can tell transient failures from terminal rejections.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::domain::SignedOrder;

/// One dispatch attempt's failure, classified for the retry predicate.
#[derive(Debug, Error)]
pub enum ExchangeApiError {
    /// The call did not complete within the adapter's request timeout.
    #[error("exchange request timed out")]
    Timeout,

    /// Transport failure before any exchange verdict (DNS, TLS, reset).
    #[error("exchange transport failure: {0}")]
    Transport(String),

    /// The exchange answered non-2xx. `code` is its business error code
    /// when the response body carried one.
    #[error("exchange rejected order (http {status}, code {code:?}): {message}")]
    Rejected {
        status: u16,
        code: Option<i64>,
        message: String,
    },
}

impl ExchangeApiError {
    /// Business error code, when the exchange supplied one.
    pub fn code(&self) -> Option<i64> {
        match self {
            Self::Rejected { code, .. } => *code,
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }
}

/// Trait for signed-order dispatch providers.
///
/// Implementors connect to the exchange REST API. One invocation maps to
/// one HTTP request; internal retries are forbidden so the executor's
/// attempt accounting stays exact.
#[async_trait]
pub trait ExchangeApi: Send + Sync + 'static {
    /// Submit one signed order and return the exchange acknowledgement.
    ///
    /// # Errors
    /// `Timeout` / `Transport` when no exchange verdict was received,
    /// `Rejected` when the exchange answered with an error.
    async fn place_order(&self, order: &SignedOrder) -> Result<Value, ExchangeApiError>;
}
