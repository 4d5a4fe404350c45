//! Webhook HTTP Server - Signal Intake and Routing
//!
//! Serves the TradingView webhook route plus health, status and metrics
//! via axum 0.7. The order of gates on the webhook route is fixed:
//! admission (rate limit) → signature verification → JSON parse →
//! execution under the request deadline. Authentication runs over the
//! raw body bytes before any parsing, and nothing past the verifier runs
//! for an unauthenticated request.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Bytes;
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use serde_json::json;
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::adapters::metrics::MetricsRegistry;
use crate::config::{AppConfig, RateLimitConfig};
use crate::domain::signal::TradeSignal;
use crate::ports::exchange::ExchangeApi;
use crate::usecases::executor::{ExecutionError, TradeExecutor};

use super::types::{execution_error_reply, WebhookReply};
use super::verify::{WebhookVerifier, SIGNATURE_HEADER};

/// Everything the webhook routes need, shared read-only across requests.
pub struct AppState<E: ExchangeApi> {
    /// Inbound signature verifier.
    pub verifier: WebhookVerifier,
    /// Signal executor.
    pub executor: TradeExecutor<E>,
    /// Prometheus registry.
    pub metrics: Arc<MetricsRegistry>,
    /// Admission gate for the webhook route. `None` disables throttling.
    limiter: Option<DefaultDirectRateLimiter>,
    /// Whole-request deadline.
    request_deadline: Duration,
    /// Whether `/metrics` is routed.
    metrics_enabled: bool,
    /// Service name reported by `/status`.
    service_name: String,
    /// Process start time reported by `/status`.
    started_at: DateTime<Utc>,
}

impl<E: ExchangeApi> AppState<E> {
    pub fn new(
        config: &AppConfig,
        verifier: WebhookVerifier,
        executor: TradeExecutor<E>,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        Self {
            verifier,
            executor,
            metrics,
            limiter: build_limiter(&config.rate_limit),
            request_deadline: Duration::from_millis(config.server.request_deadline_ms),
            metrics_enabled: config.metrics.enabled,
            service_name: config.service.name.clone(),
            started_at: Utc::now(),
        }
    }
}

/// Direct (not-keyed) limiter: `max_requests` burst, replenished evenly
/// over the window.
fn build_limiter(config: &RateLimitConfig) -> Option<DefaultDirectRateLimiter> {
    let burst = NonZeroU32::new(config.max_requests)?;
    let period = Duration::from_secs(config.window_secs) / config.max_requests;
    let quota = Quota::with_period(period)?.allow_burst(burst);
    Some(RateLimiter::direct(quota))
}

/// Build the full route tree.
pub fn router<E: ExchangeApi>(state: Arc<AppState<E>>) -> Router {
    let webhook_routes = Router::new()
        .route("/webhook/tradingview", post(handle_signal::<E>))
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            admission_gate::<E>,
        ));

    let mut service_routes = Router::new()
        .route("/health", get(health))
        .route("/status", get(service_status::<E>));
    if state.metrics_enabled {
        service_routes = service_routes.route("/metrics", get(render_metrics::<E>));
    }

    webhook_routes.merge(service_routes).with_state(state)
}

/// Axum-based webhook HTTP server.
pub struct WebhookServer<E: ExchangeApi> {
    state: Arc<AppState<E>>,
    bind_address: String,
}

impl<E: ExchangeApi> WebhookServer<E> {
    pub fn new(state: Arc<AppState<E>>, bind_address: impl Into<String>) -> Self {
        Self {
            state,
            bind_address: bind_address.into(),
        }
    }

    /// Serve until the shutdown channel fires.
    #[instrument(skip(self, shutdown_rx))]
    pub async fn run(self, mut shutdown_rx: broadcast::Receiver<()>) -> anyhow::Result<()> {
        let app = router(self.state);
        let listener = tokio::net::TcpListener::bind(&self.bind_address).await?;

        info!(address = %self.bind_address, "Webhook server started");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            })
            .await?;

        Ok(())
    }
}

/// Rate-limit gate in front of the webhook route only.
async fn admission_gate<E: ExchangeApi>(
    State(state): State<Arc<AppState<E>>>,
    request: Request,
    next: Next,
) -> Response {
    if let Some(limiter) = &state.limiter {
        if limiter.check().is_err() {
            let request_id = Uuid::new_v4();
            state.metrics.record_signal("throttled");
            warn!(request_id = %request_id, "Webhook throttled by admission gate");
            return reply(
                StatusCode::TOO_MANY_REQUESTS,
                WebhookReply::failure("Too many requests", request_id),
            );
        }
    }
    next.run(request).await
}

/// POST /webhook/tradingview
async fn handle_signal<E: ExchangeApi>(
    State(state): State<Arc<AppState<E>>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let received = Instant::now();
    let request_id = Uuid::new_v4();
    debug!(request_id = %request_id, body_len = body.len(), "Webhook received");

    let presented = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    if let Err(err) = state.verifier.verify(&body, presented, request_id) {
        state.metrics.record_signature_failure();
        state.metrics.record_signal("unauthenticated");
        return reply(
            StatusCode::UNAUTHORIZED,
            WebhookReply::failure(err.to_string(), request_id),
        );
    }

    let signal: TradeSignal = match serde_json::from_slice(&body) {
        Ok(signal) => signal,
        Err(err) => {
            state.metrics.record_signal("invalid");
            return reply(
                StatusCode::BAD_REQUEST,
                WebhookReply::failure(format!("invalid signal payload: {err}"), request_id),
            );
        }
    };
    if let Some(annotation) = &signal.message {
        // The alert's free-form message never becomes an order parameter;
        // the audit trail is the only place it goes.
        debug!(request_id = %request_id, annotation = %annotation, "Alert annotation");
    }

    let outcome = tokio::time::timeout(
        state.request_deadline,
        state.executor.execute(&signal, request_id),
    )
    .await;

    match outcome {
        Ok(Ok(report)) => {
            state.metrics.record_signal("executed");
            state
                .metrics
                .record_execution(&signal.side.to_string(), report.attempts, report.latency_ms);
            let total_ms = received.elapsed().as_millis() as u64;
            reply(
                StatusCode::OK,
                WebhookReply::executed(report, total_ms, request_id),
            )
        }
        Ok(Err(err)) => {
            state.metrics.record_signal(outcome_label(&err));
            let (status, envelope) = execution_error_reply(&err, request_id);
            reply(status, envelope)
        }
        Err(_elapsed) => {
            // Dropping the execute future aborts the in-flight exchange
            // call and any retry sleep.
            state.metrics.record_signal("cancelled");
            warn!(request_id = %request_id, "Request deadline elapsed, execution cancelled");
            let (status, envelope) = execution_error_reply(&ExecutionError::Cancelled, request_id);
            reply(status, envelope)
        }
    }
}

/// GET /health
async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// GET /status
async fn service_status<E: ExchangeApi>(State(state): State<Arc<AppState<E>>>) -> Response {
    let uptime_secs = (Utc::now() - state.started_at).num_seconds().max(0);
    Json(json!({
        "service": state.service_name,
        "version": env!("CARGO_PKG_VERSION"),
        "startedAt": state.started_at.to_rfc3339(),
        "uptimeSecs": uptime_secs,
    }))
    .into_response()
}

/// GET /metrics
async fn render_metrics<E: ExchangeApi>(State(state): State<Arc<AppState<E>>>) -> Response {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
        .into_response()
}

fn reply(status: StatusCode, envelope: WebhookReply) -> Response {
    (status, Json(envelope)).into_response()
}

fn outcome_label(err: &ExecutionError) -> &'static str {
    match err {
        ExecutionError::Signal(_) => "invalid",
        ExecutionError::Exchange(_) | ExecutionError::RetriesExhausted { .. } => "failed",
        ExecutionError::Cancelled => "cancelled",
    }
}
