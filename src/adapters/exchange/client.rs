//! Exchange REST Client - Signed Order Dispatch
//!
//! Wraps reqwest for the exchange order endpoint. Exactly one HTTP call
//! per `place_order` invocation; the retry loop lives in the executor so
//! attempt accounting stays exact. The per-attempt timeout is carried by
//! the reqwest client, and the pooled client is safe to share across
//! concurrent requests.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ExchangeConfig;
use crate::domain::SignedOrder;
use crate::ports::exchange::{ExchangeApi, ExchangeApiError};

use super::types::classify_rejection;

/// HTTP adapter implementing the `ExchangeApi` port.
pub struct ExchangeRestClient {
    /// Underlying HTTP client.
    http: Client,
    /// Order endpoint URL, joined once at construction.
    order_url: String,
    /// API key for the `X-API-KEY` header.
    api_key: String,
}

impl ExchangeRestClient {
    /// Build the client from exchange config plus the API key.
    pub fn new(config: &ExchangeConfig, api_key: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .pool_max_idle_per_host(5)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            order_url: format!(
                "{}{}",
                config.base_url.trim_end_matches('/'),
                config.order_path
            ),
            api_key: api_key.into(),
        })
    }

    fn transport_error(err: reqwest::Error) -> ExchangeApiError {
        if err.is_timeout() {
            ExchangeApiError::Timeout
        } else {
            ExchangeApiError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl ExchangeApi for ExchangeRestClient {
    async fn place_order(&self, order: &SignedOrder) -> Result<Value, ExchangeApiError> {
        debug!(url = %self.order_url, "Dispatching signed order");

        let response = self
            .http
            .post(&self.order_url)
            .header("X-API-KEY", &self.api_key)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(order.body())
            .send()
            .await
            .map_err(Self::transport_error)?;

        let status = response.status();
        if status.is_success() {
            return response.json::<Value>().await.map_err(Self::transport_error);
        }

        let text = response.text().await.map_err(Self::transport_error)?;
        let err = classify_rejection(status.as_u16(), &text);
        warn!(status = status.as_u16(), error = %err, "Exchange rejected order");
        Err(err)
    }
}
