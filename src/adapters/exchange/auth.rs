//! Exchange Authentication - Credential Handling
//!
//! Credentials come from environment variables only, loaded once at
//! startup: EXCHANGE_API_KEY / EXCHANGE_API_SECRET for the exchange,
//! TV_WEBHOOK_SECRET for inbound webhook verification. They never appear
//! in `config.toml` and nothing here ever logs a secret.

use anyhow::{Context, Result};

/// Exchange API credentials.
///
/// The key travels in the `X-API-KEY` request header; the secret is only
/// ever used to compute order signatures.
pub struct ExchangeCredentials {
    /// API key from EXCHANGE_API_KEY.
    api_key: String,
    /// API secret from EXCHANGE_API_SECRET (never sent, never logged).
    api_secret: String,
}

impl ExchangeCredentials {
    /// Load credentials from environment variables.
    ///
    /// Required env vars: EXCHANGE_API_KEY, EXCHANGE_API_SECRET.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("EXCHANGE_API_KEY").context("EXCHANGE_API_KEY not set")?;
        let api_secret =
            std::env::var("EXCHANGE_API_SECRET").context("EXCHANGE_API_SECRET not set")?;
        anyhow::ensure!(!api_key.is_empty(), "EXCHANGE_API_KEY is empty");
        anyhow::ensure!(!api_secret.is_empty(), "EXCHANGE_API_SECRET is empty");
        Ok(Self {
            api_key,
            api_secret,
        })
    }

    /// Construct from explicit values. Intended for tests and tooling.
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }

    /// Get the API key for request headers.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Get the signing secret.
    pub fn api_secret(&self) -> &str {
        &self.api_secret
    }
}

/// Load the webhook shared secret from TV_WEBHOOK_SECRET.
pub fn webhook_secret_from_env() -> Result<String> {
    let secret = std::env::var("TV_WEBHOOK_SECRET").context("TV_WEBHOOK_SECRET not set")?;
    anyhow::ensure!(!secret.is_empty(), "TV_WEBHOOK_SECRET is empty");
    Ok(secret)
}
