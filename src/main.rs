//! tradehook - Entry Point
//!
//! Initializes configuration, logging, credentials and the webhook
//! server. Runs until SIGINT.
//!
//! Wiring sequence:
//! 1. Load config.toml + validate
//! 2. Init tracing (JSON structured logging)
//! 3. Load secrets from env vars (TV_WEBHOOK_SECRET, EXCHANGE_API_KEY, EXCHANGE_API_SECRET)
//! 4. Create ExchangeRestClient (implements ExchangeApi port)
//! 5. Wire WebhookVerifier + TradeExecutor + MetricsRegistry
//! 6. Serve webhook + health + status + metrics on one listener
//! 7. Wait for SIGINT → graceful shutdown (drain in-flight requests)

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use tradehook::adapters::exchange::auth::{webhook_secret_from_env, ExchangeCredentials};
use tradehook::adapters::exchange::ExchangeRestClient;
use tradehook::adapters::metrics::MetricsRegistry;
use tradehook::adapters::webhook::{AppState, WebhookServer, WebhookVerifier};
use tradehook::config;
use tradehook::usecases::executor::TradeExecutor;

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. Load configuration from config.toml ──────────────
    let config =
        config::loader::load_config("config.toml").context("Failed to load configuration")?;

    // ── 2. Initialize structured JSON logging ───────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.service.log_level)),
        )
        .json()
        .init();

    info!(
        name = %config.service.name,
        version = env!("CARGO_PKG_VERSION"),
        dry_run = config.service.dry_run,
        exchange = %config.exchange.base_url,
        "Starting webhook executor"
    );

    // ── 3. Shutdown signal channel ──────────────────────────
    let (shutdown_tx, _shutdown_rx) = broadcast::channel::<()>(1);

    // ── 4. Load secrets from env vars ───────────────────────
    let webhook_secret = webhook_secret_from_env().context("Failed to load webhook secret")?;
    let credentials = ExchangeCredentials::from_env()
        .context("Failed to load exchange credentials from env")?;

    // ── 5. Create exchange REST client (ExchangeApi port) ───
    let exchange = Arc::new(
        ExchangeRestClient::new(&config.exchange, credentials.api_key())
            .context("Failed to create exchange client")?,
    );

    // ── 6. Wire verifier, executor and metrics ──────────────
    let verifier = WebhookVerifier::new(webhook_secret);
    let executor = TradeExecutor::new(Arc::clone(&exchange), credentials.api_secret(), &config);
    let metrics = Arc::new(MetricsRegistry::new().context("Failed to create metrics registry")?);
    let state = Arc::new(AppState::new(&config, verifier, executor, metrics));

    if config.service.dry_run {
        warn!("Dry-run mode: orders are signed but NOT dispatched");
    }

    // ── 7. Spawn webhook server ─────────────────────────────
    let server = WebhookServer::new(Arc::clone(&state), config.server.bind_address.clone());
    let server_shutdown = shutdown_tx.subscribe();
    let server_handle = tokio::spawn(async move {
        if let Err(e) = server.run(server_shutdown).await {
            error!(error = %e, "Webhook server failed");
        }
    });

    info!("Webhook executor is running");

    // ── 8. Wait for SIGINT ──────────────────────────────────
    signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")?;
    info!("SIGINT received, initiating graceful shutdown");

    // Graceful shutdown: stop accepting, drain in-flight requests.
    let _ = shutdown_tx.send(());
    let _ = tokio::time::timeout(std::time::Duration::from_secs(30), server_handle).await;

    info!("Shutdown complete");
    Ok(())
}
