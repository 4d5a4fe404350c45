//! Exchange Client Tests - Wire Behavior Against a Stub Exchange
//!
//! Runs the REST adapter against a local axum stub standing in for the
//! exchange. Asserts what actually crosses the wire: the API key
//! header, the form-encoded signed body, and how acks, rejections and
//! timeouts come back.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};

use tradehook::adapters::exchange::ExchangeRestClient;
use tradehook::config::ExchangeConfig;
use tradehook::domain::order::{OrderRequest, SignedOrder};
use tradehook::domain::signal::TradeSignal;
use tradehook::ports::exchange::ExchangeApi;

// ---- Stub Exchange ----

struct Captured {
    api_key: Option<String>,
    content_type: Option<String>,
    body: String,
}

enum StubMode {
    Ack(Value),
    Reject { status: u16, body: String },
    Stall(Duration),
}

#[derive(Clone)]
struct StubState {
    captured: Arc<Mutex<Vec<Captured>>>,
    mode: Arc<StubMode>,
}

async fn order_endpoint(
    State(state): State<StubState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    state.captured.lock().unwrap().push(Captured {
        api_key: headers
            .get("x-api-key")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string),
        content_type: headers
            .get("content-type")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string),
        body: String::from_utf8_lossy(&body).into_owned(),
    });

    match &*state.mode {
        StubMode::Ack(value) => (StatusCode::OK, Json(value.clone())).into_response(),
        StubMode::Reject { status, body } => (
            StatusCode::from_u16(*status).unwrap(),
            body.clone(),
        )
            .into_response(),
        StubMode::Stall(pause) => {
            tokio::time::sleep(*pause).await;
            (StatusCode::OK, Json(json!({"lateAck": true}))).into_response()
        }
    }
}

async fn spawn_stub(mode: StubMode) -> (String, Arc<Mutex<Vec<Captured>>>) {
    let captured = Arc::new(Mutex::new(Vec::new()));
    let state = StubState {
        captured: Arc::clone(&captured),
        mode: Arc::new(mode),
    };
    let app = Router::new()
        .route("/api/v3/order", post(order_endpoint))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), captured)
}

// ---- Helpers ----

fn client_config(base_url: &str, timeout_ms: u64) -> ExchangeConfig {
    ExchangeConfig {
        base_url: base_url.to_string(),
        order_path: "/api/v3/order".to_string(),
        timeout_ms,
        recv_window_ms: 5_000,
    }
}

fn signed_order() -> SignedOrder {
    let signal: TradeSignal = serde_json::from_str(
        r#"{"symbol":"BTCUSDT","side":"buy","quantity":"0.001","price":"50000","type":"LIMIT"}"#,
    )
    .unwrap();
    OrderRequest::build(&signal, 5_000, 1_700_000_000_000, None).sign(b"s3cr3t")
}

// ---- Tests ----

#[tokio::test]
async fn test_ack_is_passed_through_verbatim() {
    let ack = json!({"orderId": 55, "status": "FILLED", "executedQty": "0.001"});
    let (base, _captured) = spawn_stub(StubMode::Ack(ack.clone())).await;

    let client = ExchangeRestClient::new(&client_config(&base, 3_000), "test-api-key").unwrap();
    let response = client.place_order(&signed_order()).await.unwrap();

    assert_eq!(response, ack);
}

#[tokio::test]
async fn test_request_carries_key_header_and_signed_form_body() {
    let (base, captured) = spawn_stub(StubMode::Ack(json!({"orderId": 1}))).await;

    let client = ExchangeRestClient::new(&client_config(&base, 3_000), "test-api-key").unwrap();
    let order = signed_order();
    client.place_order(&order).await.unwrap();

    let captured = captured.lock().unwrap();
    assert_eq!(captured.len(), 1);
    assert_eq!(captured[0].api_key.as_deref(), Some("test-api-key"));
    assert_eq!(
        captured[0].content_type.as_deref(),
        Some("application/x-www-form-urlencoded")
    );
    assert_eq!(captured[0].body, order.body());
    assert!(captured[0]
        .body
        .ends_with(&format!("&signature={}", order.signature)));
    assert!(captured[0].body.starts_with("price=50000&quantity=0.001&"));
}

#[tokio::test]
async fn test_rejection_with_exchange_code_is_classified() {
    let (base, _captured) = spawn_stub(StubMode::Reject {
        status: 400,
        body: r#"{"code":-1021,"msg":"Timestamp for this request is outside of the recvWindow."}"#
            .to_string(),
    })
    .await;

    let client = ExchangeRestClient::new(&client_config(&base, 3_000), "test-api-key").unwrap();
    let err = client.place_order(&signed_order()).await.unwrap_err();

    assert_eq!(err.code(), Some(-1021));
    assert!(!err.is_timeout());
    assert!(err.to_string().contains("recvWindow"));
}

#[tokio::test]
async fn test_unparseable_rejection_keeps_raw_text() {
    let (base, _captured) = spawn_stub(StubMode::Reject {
        status: 502,
        body: "Bad Gateway".to_string(),
    })
    .await;

    let client = ExchangeRestClient::new(&client_config(&base, 3_000), "test-api-key").unwrap();
    let err = client.place_order(&signed_order()).await.unwrap_err();

    assert_eq!(err.code(), None);
    assert!(err.to_string().contains("Bad Gateway"));
    assert!(err.to_string().contains("502"));
}

#[tokio::test]
async fn test_stalled_exchange_maps_to_timeout() {
    let (base, _captured) = spawn_stub(StubMode::Stall(Duration::from_millis(500))).await;

    let client = ExchangeRestClient::new(&client_config(&base, 100), "test-api-key").unwrap();
    let err = client.place_order(&signed_order()).await.unwrap_err();

    assert!(err.is_timeout());
}

#[tokio::test]
async fn test_trailing_slash_on_base_url_joins_cleanly() {
    let (base, _captured) = spawn_stub(StubMode::Ack(json!({"orderId": 2}))).await;

    let slashed = format!("{base}/");
    let client = ExchangeRestClient::new(&client_config(&slashed, 3_000), "test-api-key").unwrap();

    // A doubled slash would miss the stub route and come back 404.
    client.place_order(&signed_order()).await.unwrap();
}
