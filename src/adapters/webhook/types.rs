//! Webhook HTTP Reply Types
//!
//! The JSON envelope every webhook response uses (camelCase on the wire)
//! and the mapping from execution failures to HTTP status plus envelope.

use axum::http::StatusCode;
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::domain::order::ExecutionReport;
use crate::ports::exchange::ExchangeApiError;
use crate::usecases::executor::ExecutionError;

/// Latency breakdown reported on success.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LatencyBreakdown {
    /// Whole-request wall time in milliseconds.
    pub total: u64,
    /// Time spent executing against the exchange, retries included.
    pub exchange_api: u64,
}

/// JSON envelope for every webhook response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookReply {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempt_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency: Option<LatencyBreakdown>,
    pub request_id: Uuid,
}

impl WebhookReply {
    /// Success envelope wrapping the exchange acknowledgement.
    pub fn executed(report: ExecutionReport, total_ms: u64, request_id: Uuid) -> Self {
        Self {
            success: true,
            message: "Order executed".to_string(),
            attempt_count: Some(report.attempts),
            latency: Some(LatencyBreakdown {
                total: total_ms,
                exchange_api: report.latency_ms,
            }),
            data: Some(report.data),
            error: None,
            request_id,
        }
    }

    /// Failure envelope with a message only.
    pub fn failure(message: impl Into<String>, request_id: Uuid) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            attempt_count: None,
            error: None,
            latency: None,
            request_id,
        }
    }

    /// Failure envelope carrying structured error detail.
    pub fn failure_with_detail(
        message: impl Into<String>,
        detail: Value,
        request_id: Uuid,
    ) -> Self {
        Self {
            error: Some(detail),
            ..Self::failure(message, request_id)
        }
    }
}

/// Map an execution failure to its HTTP status and reply envelope.
pub fn execution_error_reply(
    err: &ExecutionError,
    request_id: Uuid,
) -> (StatusCode, WebhookReply) {
    match err {
        ExecutionError::Signal(_) => (
            StatusCode::BAD_REQUEST,
            WebhookReply::failure(err.to_string(), request_id),
        ),
        ExecutionError::Exchange(source) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            WebhookReply::failure_with_detail(
                "Order rejected by exchange",
                exchange_error_detail(source),
                request_id,
            ),
        ),
        ExecutionError::RetriesExhausted { attempts, source } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            WebhookReply::failure_with_detail(
                format!("Retries exhausted after {attempts} attempts"),
                json!({ "attempts": attempts, "last": exchange_error_detail(source) }),
                request_id,
            ),
        ),
        ExecutionError::Cancelled => (
            StatusCode::GATEWAY_TIMEOUT,
            WebhookReply::failure("Request deadline elapsed before completion", request_id),
        ),
    }
}

fn exchange_error_detail(err: &ExchangeApiError) -> Value {
    match err {
        ExchangeApiError::Rejected {
            status,
            code,
            message,
        } => json!({
            "status": status,
            "code": code,
            "message": message,
        }),
        other => json!({ "message": other.to_string() }),
    }
}
