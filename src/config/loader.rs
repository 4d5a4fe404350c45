//! Configuration Loader - File Loading and Validation
//!
//! Handles loading `config.toml`, validating all parameters,
//! and providing clear error messages for misconfiguration.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use super::AppConfig;

/// Load and validate configuration from a TOML file.
///
/// # Arguments
/// * `path` - Path to the config.toml file
///
/// # Errors
/// Returns detailed error if:
/// - File doesn't exist or can't be read
/// - TOML parsing fails
/// - Validation rules are violated
pub fn load_config(path: &str) -> Result<AppConfig> {
    let path = Path::new(path);

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: AppConfig =
        toml::from_str(&content).with_context(|| "Failed to parse config.toml")?;

    validate_config(&config)?;

    info!(
        service = %config.service.name,
        exchange = %config.exchange.base_url,
        max_retries = config.retry.max_retries,
        strategies = config.strategies.len(),
        "Configuration loaded successfully"
    );

    Ok(config)
}

/// Validate all configuration parameters.
///
/// Checks for:
/// - Parseable bind address and exchange URL
/// - Sensible timeout, deadline and retry bounds
/// - Strategy override keys that cannot corrupt the signed query
fn validate_config(config: &AppConfig) -> Result<()> {
    anyhow::ensure!(
        !config.service.name.is_empty(),
        "service.name must not be empty"
    );

    // Server validation
    anyhow::ensure!(
        config.server.bind_address.parse::<std::net::SocketAddr>().is_ok(),
        "server.bind_address '{}' is not a valid socket address",
        config.server.bind_address
    );
    anyhow::ensure!(
        config.server.request_deadline_ms > 0,
        "server.request_deadline_ms must be positive"
    );

    // Exchange validation
    let base = url::Url::parse(&config.exchange.base_url)
        .with_context(|| format!("exchange.base_url '{}' is not a valid URL", config.exchange.base_url))?;
    anyhow::ensure!(
        matches!(base.scheme(), "http" | "https"),
        "exchange.base_url must be http(s), got '{}'",
        base.scheme()
    );
    anyhow::ensure!(
        config.exchange.order_path.starts_with('/'),
        "exchange.order_path must start with '/', got '{}'",
        config.exchange.order_path
    );
    anyhow::ensure!(
        config.exchange.timeout_ms > 0,
        "exchange.timeout_ms must be positive"
    );
    anyhow::ensure!(
        config.exchange.recv_window_ms > 0 && config.exchange.recv_window_ms <= 60_000,
        "exchange.recv_window_ms must be in (0, 60000], got {}",
        config.exchange.recv_window_ms
    );

    // Retry validation
    anyhow::ensure!(
        config.retry.max_retries <= 10,
        "retry.max_retries must be at most 10, got {}",
        config.retry.max_retries
    );
    anyhow::ensure!(
        config.retry.delay_ms <= 60_000,
        "retry.delay_ms must be at most 60000, got {}",
        config.retry.delay_ms
    );

    // Rate limit validation
    anyhow::ensure!(
        config.rate_limit.max_requests > 0,
        "rate_limit.max_requests must be positive"
    );
    anyhow::ensure!(
        config.rate_limit.window_secs > 0,
        "rate_limit.window_secs must be positive"
    );

    // Strategy overrides merge into the signed parameter set, so a key
    // named `signature` would collide with the appended signature itself.
    for (name, table) in &config.strategies {
        for key in table.keys() {
            anyhow::ensure!(
                !key.is_empty(),
                "strategy '{}' has an empty override key",
                name
            );
            anyhow::ensure!(
                key != "signature",
                "strategy '{}' must not override 'signature'",
                name
            );
        }
    }

    Ok(())
}
