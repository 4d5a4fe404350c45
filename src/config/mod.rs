//! Configuration Module - TOML-based Service Configuration
//!
//! Loads and validates configuration from `config.toml`. Everything
//! tunable is externalized here. Secrets never live in the file; they are
//! read from the environment once at startup. The loaded config is
//! immutable and injected at construction, so request handling never
//! consults the environment or re-reads the file mid-flight.

pub mod loader;

use std::collections::BTreeMap;

use serde::Deserialize;

/// Top-level service configuration.
///
/// Loaded from `config.toml` at startup. All fields are validated before
/// the server begins accepting signals.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Service identity and mode.
    pub service: ServiceConfig,
    /// Webhook HTTP server.
    pub server: ServerConfig,
    /// Downstream exchange REST API.
    pub exchange: ExchangeConfig,
    /// Retry policy for the dispatch loop.
    pub retry: RetryConfig,
    /// Admission rate limiting for the webhook route.
    pub rate_limit: RateLimitConfig,
    /// Metrics and monitoring.
    pub metrics: MetricsConfig,
    /// Per-strategy order overrides, keyed by strategy name.
    #[serde(default)]
    pub strategies: BTreeMap<String, StrategyOverrides>,
}

impl AppConfig {
    /// Canonicalize every strategy override table to plain strings.
    ///
    /// Called once at startup; request handling only ever sees the
    /// resolved string maps.
    pub fn resolved_strategies(&self) -> BTreeMap<String, BTreeMap<String, String>> {
        self.strategies
            .iter()
            .map(|(name, table)| (name.clone(), table.resolved()))
            .collect()
    }
}

/// Service identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Human-readable service name.
    pub name: String,
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Build and sign orders without dispatching them.
    #[serde(default)]
    pub dry_run: bool,
}

/// Webhook HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Listen address for the webhook server.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Whole-request deadline (milliseconds). Expiry cancels the
    /// in-flight execution, including any retry sleep.
    #[serde(default = "default_request_deadline")]
    pub request_deadline_ms: u64,
}

/// Exchange REST API configuration.
///
/// Credentials are NOT configured here. `EXCHANGE_API_KEY` and
/// `EXCHANGE_API_SECRET` come from the environment.
#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeConfig {
    /// Exchange REST base URL.
    pub base_url: String,
    /// Order endpoint path appended to `base_url`.
    #[serde(default = "default_order_path")]
    pub order_path: String,
    /// Per-attempt HTTP timeout (milliseconds).
    #[serde(default = "default_exchange_timeout")]
    pub timeout_ms: u64,
    /// `recvWindow` parameter sent with every order (milliseconds).
    #[serde(default = "default_recv_window")]
    pub recv_window_ms: u64,
}

/// Retry policy for the dispatch loop.
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// Retries allowed after the initial attempt.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Fixed delay between attempts (milliseconds).
    #[serde(default = "default_retry_delay")]
    pub delay_ms: u64,
    /// Exchange error codes treated as transient. Defaults to the
    /// stale-timestamp/signature family.
    #[serde(default = "default_retryable_codes")]
    pub retryable_codes: Vec<i64>,
}

/// Admission rate limiting for the webhook route.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum signals admitted per window.
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,
    /// Window length in seconds.
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

/// Metrics and monitoring configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// Enable the Prometheus registry and `/metrics` route.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Override table for one strategy.
///
/// Raw TOML scalars are accepted and canonicalized to the strings that
/// enter the signed query. Resolved once at startup, never per request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct StrategyOverrides {
    params: BTreeMap<String, ParamValue>,
}

impl StrategyOverrides {
    pub fn resolved(&self) -> BTreeMap<String, String> {
        self.params
            .iter()
            .map(|(key, value)| (key.clone(), value.to_string()))
            .collect()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.params.keys().map(String::as_str)
    }
}

/// A scalar override value as written in TOML.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl std::fmt::Display for ParamValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "{v}"),
        }
    }
}

// Default value functions for serde

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_bind_address() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_request_deadline() -> u64 {
    10_000
}

fn default_order_path() -> String {
    "/api/v3/order".to_string()
}

fn default_exchange_timeout() -> u64 {
    3_000
}

fn default_recv_window() -> u64 {
    5_000
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay() -> u64 {
    500
}

fn default_retryable_codes() -> Vec<i64> {
    vec![-1021, -1022]
}

fn default_max_requests() -> u32 {
    10
}

fn default_window_secs() -> u64 {
    1
}
