//! Trade Executor - Signal-to-Order Execution
//!
//! Turns one validated trade signal into one exchange order:
//! - semantic validation (cheap rejects before any network work)
//! - per-attempt parameter build with a fresh timestamp
//! - canonicalization and HMAC signing with the injected API secret
//! - bounded retry loop around the dispatch port
//!
//! The loop is explicit and sequential: at most one exchange call is in
//! flight per signal, and every retry rebuilds and re-signs so the
//! exchange never sees a stale timestamp twice.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::domain::order::{epoch_millis_now, ExecutionReport, OrderRequest, SignedOrder};
use crate::domain::signal::{SignalError, TradeSignal};
use crate::ports::exchange::{ExchangeApi, ExchangeApiError};

/// Why an execution ended without an exchange acknowledgement.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// Signal failed semantic validation. No exchange call was made.
    #[error("invalid signal: {0}")]
    Signal(#[from] SignalError),

    /// The exchange rejected the order with a non-retryable error.
    #[error("exchange error: {0}")]
    Exchange(#[source] ExchangeApiError),

    /// Every allowed attempt failed with a retryable error.
    #[error("retries exhausted after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: ExchangeApiError,
    },

    /// The request deadline elapsed or the caller went away.
    #[error("execution cancelled before completion")]
    Cancelled,
}

/// Executes signals against an exchange port with retry and signing.
pub struct TradeExecutor<E: ExchangeApi> {
    /// Dispatch port.
    exchange: Arc<E>,
    /// Exchange API secret used for order signing.
    api_secret: String,
    /// `recvWindow` sent with every order (ms).
    recv_window_ms: u64,
    /// Retries allowed after the initial attempt.
    max_retries: u32,
    /// Fixed delay between attempts (ms).
    delay_ms: u64,
    /// Exchange error codes treated as transient.
    retryable_codes: Vec<i64>,
    /// Strategy overrides, resolved to strings at startup.
    strategies: BTreeMap<String, BTreeMap<String, String>>,
    /// Build and sign without dispatching.
    dry_run: bool,
}

impl<E: ExchangeApi> TradeExecutor<E> {
    /// Create an executor. All tunables are copied out of the config
    /// here; nothing is re-read per request.
    pub fn new(exchange: Arc<E>, api_secret: impl Into<String>, config: &AppConfig) -> Self {
        Self {
            exchange,
            api_secret: api_secret.into(),
            recv_window_ms: config.exchange.recv_window_ms,
            max_retries: config.retry.max_retries,
            delay_ms: config.retry.delay_ms,
            retryable_codes: config.retry.retryable_codes.clone(),
            strategies: config.resolved_strategies(),
            dry_run: config.service.dry_run,
        }
    }

    /// Execute one signal to completion.
    ///
    /// Validation failures return immediately with zero exchange calls.
    /// Retryable failures (timeout, configured error codes) are retried
    /// up to `max_retries` times with a fixed delay, rebuilding and
    /// re-signing the order each attempt. Everything else is terminal on
    /// first sight.
    #[instrument(
        skip(self, signal),
        fields(
            request_id = %request_id,
            symbol = %signal.symbol,
            side = %signal.side,
        )
    )]
    pub async fn execute(
        &self,
        signal: &TradeSignal,
        request_id: Uuid,
    ) -> Result<ExecutionReport, ExecutionError> {
        signal.validate()?;
        let overrides = signal.resolve_overrides(&self.strategies);
        if signal.strategy.is_some() && overrides.is_none() {
            debug!(
                strategy = signal.strategy.as_deref().unwrap_or_default(),
                "No override table configured for strategy"
            );
        }

        let started = Instant::now();

        if self.dry_run {
            let signed = self.build_signed(signal, overrides);
            info!(query = %signed.query, "Dry run, order not dispatched");
            return Ok(ExecutionReport {
                data: serde_json::json!({ "dryRun": true, "order": signed.params }),
                latency_ms: started.elapsed().as_millis() as u64,
                attempts: 0,
            });
        }

        let mut attempts: u32 = 0;
        loop {
            let signed = self.build_signed(signal, overrides);
            attempts += 1;
            debug!(
                attempt = attempts,
                timestamp = signed.params.get("timestamp").map(String::as_str).unwrap_or_default(),
                "Dispatching signed order"
            );

            match self.exchange.place_order(&signed).await {
                Ok(data) => {
                    let latency_ms = started.elapsed().as_millis() as u64;
                    info!(attempts, latency_ms, "Order executed");
                    return Ok(ExecutionReport {
                        data,
                        latency_ms,
                        attempts,
                    });
                }
                Err(err) if self.is_retryable(&err) && attempts <= self.max_retries => {
                    warn!(
                        attempt = attempts,
                        error = %err,
                        delay_ms = self.delay_ms,
                        "Retryable exchange failure, will re-sign and retry"
                    );
                    tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
                }
                Err(err) if self.is_retryable(&err) => {
                    warn!(attempts, error = %err, "Retries exhausted");
                    return Err(ExecutionError::RetriesExhausted {
                        attempts,
                        source: err,
                    });
                }
                Err(err) => {
                    warn!(attempts, error = %err, "Terminal exchange failure");
                    return Err(ExecutionError::Exchange(err));
                }
            }
        }
    }

    /// Fresh timestamp, fresh signature. Called once per attempt.
    fn build_signed(
        &self,
        signal: &TradeSignal,
        overrides: Option<&BTreeMap<String, String>>,
    ) -> SignedOrder {
        OrderRequest::build(signal, self.recv_window_ms, epoch_millis_now(), overrides)
            .sign(self.api_secret.as_bytes())
    }

    /// Timeouts and the configured code list are worth another attempt;
    /// transport failures and other rejections are not.
    fn is_retryable(&self, err: &ExchangeApiError) -> bool {
        err.is_timeout() || err.code().is_some_and(|code| self.retryable_codes.contains(&code))
    }
}
