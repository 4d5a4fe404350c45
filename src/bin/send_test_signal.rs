//! Diagnostic binary to send a signed test signal to a running instance.
//!
//! Builds a TradeSignal, signs the serialized body with TV_WEBHOOK_SECRET
//! and posts it to the webhook route, then prints the reply.
//!
//! Run with: cargo run --bin send_test_signal [-- <url>]

use std::env;

use anyhow::Result;

use tradehook::adapters::webhook::SIGNATURE_HEADER;
use tradehook::domain::signal::{TradeSide, TradeSignal};
use tradehook::domain::signing::hmac_sha256_hex;

#[tokio::main]
async fn main() -> Result<()> {
    let secret =
        env::var("TV_WEBHOOK_SECRET").expect("TV_WEBHOOK_SECRET environment variable not set");
    let url = env::args()
        .nth(1)
        .unwrap_or_else(|| "http://127.0.0.1:8080/webhook/tradingview".to_string());

    let signal = TradeSignal {
        symbol: "BTCUSDT".to_string(),
        side: TradeSide::Buy,
        quantity: "0.001".to_string(),
        price: Some("50000".to_string()),
        order_type: "LIMIT".to_string(),
        strategy: None,
        message: Some("manual test signal".to_string()),
    };

    // The signature covers the exact serialized bytes that go on the wire.
    let body = serde_json::to_string(&signal)?;
    let signature = hmac_sha256_hex(secret.as_bytes(), body.as_bytes());

    println!("POST {url}");
    println!("  body:      {body}");
    println!("  signature: {signature}");

    let client = reqwest::Client::new();
    let response = client
        .post(&url)
        .header(SIGNATURE_HEADER, signature)
        .header("Content-Type", "application/json")
        .body(body)
        .send()
        .await?;

    let status = response.status();
    let reply = response.text().await?;
    println!("\n=== {status} ===");
    println!("{reply}");

    Ok(())
}
