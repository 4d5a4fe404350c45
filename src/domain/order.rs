//! Outbound order construction, canonicalization and signing.
//!
//! An `OrderRequest` is rebuilt from the signal for every dispatch attempt
//! so the `timestamp` parameter is fresh each time, then canonicalized and
//! signed. The canonical form is the exchange contract: keys sorted
//! lexicographically, values form-urlencoded, joined `k=v&…`. The hex
//! signature is computed over that string and appended afterwards, so it is
//! never part of its own digest.

use std::collections::BTreeMap;

use serde::Serialize;

use super::signal::TradeSignal;
use super::signing::hmac_sha256_hex;

/// Epoch milliseconds for the `timestamp` parameter.
pub fn epoch_millis_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn urlencode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// Parameter set for one order attempt, prior to signing.
#[derive(Debug, Clone)]
pub struct OrderRequest {
    params: BTreeMap<String, String>,
}

impl OrderRequest {
    /// Assemble the exchange parameter set from a validated signal.
    ///
    /// `side` and `type` are upper-cased; `price` is included only for
    /// limit orders that carry one; strategy overrides are merged last and
    /// win any key collision with the base parameters.
    pub fn build(
        signal: &TradeSignal,
        recv_window_ms: u64,
        timestamp_ms: u64,
        overrides: Option<&BTreeMap<String, String>>,
    ) -> Self {
        let mut params = BTreeMap::new();
        params.insert("symbol".to_string(), signal.symbol.clone());
        params.insert("side".to_string(), signal.side.to_string());
        params.insert("type".to_string(), signal.order_type.to_ascii_uppercase());
        params.insert("quantity".to_string(), signal.quantity.clone());
        if signal.is_limit() {
            if let Some(price) = &signal.price {
                params.insert("price".to_string(), price.clone());
            }
        }
        params.insert("recvWindow".to_string(), recv_window_ms.to_string());
        params.insert("timestamp".to_string(), timestamp_ms.to_string());
        if let Some(overrides) = overrides {
            for (key, value) in overrides {
                params.insert(key.clone(), value.clone());
            }
        }
        Self { params }
    }

    /// The sorted `k=v&…` string the signature is computed over.
    pub fn canonical_query(&self) -> String {
        // BTreeMap iteration order is the canonical key order.
        self.params
            .iter()
            .map(|(key, value)| format!("{key}={}", urlencode(value)))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Sign the canonical query with the exchange API secret.
    pub fn sign(self, secret: &[u8]) -> SignedOrder {
        let query = self.canonical_query();
        let signature = hmac_sha256_hex(secret, query.as_bytes());
        SignedOrder {
            params: self.params,
            query,
            signature,
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}

/// An order with its signature attached, ready for dispatch.
#[derive(Debug, Clone)]
pub struct SignedOrder {
    /// Parameters the signature covers, in canonical order.
    pub params: BTreeMap<String, String>,
    /// Canonical query string, exactly as signed.
    pub query: String,
    /// Hex HMAC-SHA256 of `query`.
    pub signature: String,
}

impl SignedOrder {
    /// Full form-urlencoded request body, signature last.
    pub fn body(&self) -> String {
        format!("{}&signature={}", self.query, self.signature)
    }
}

/// Terminal success value for one executed signal.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionReport {
    /// Exchange acknowledgement payload, passed through as received.
    pub data: serde_json::Value,
    /// Milliseconds from first parameter build to the final exchange reply.
    pub latency_ms: u64,
    /// Dispatch attempts made, counting the successful one.
    pub attempts: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::signal::TradeSide;

    const SECRET: &[u8] = b"s3cr3t";
    const TS: u64 = 1_700_000_000_000;

    fn limit_signal() -> TradeSignal {
        TradeSignal {
            symbol: "BTCUSDT".into(),
            side: TradeSide::Buy,
            quantity: "0.001".into(),
            price: Some("50000".into()),
            order_type: "LIMIT".into(),
            strategy: None,
            message: None,
        }
    }

    #[test]
    fn test_canonical_query_golden() {
        let order = OrderRequest::build(&limit_signal(), 5000, TS, None);
        assert_eq!(
            order.canonical_query(),
            "price=50000&quantity=0.001&recvWindow=5000&side=BUY&symbol=BTCUSDT&timestamp=1700000000000&type=LIMIT"
        );
    }

    #[test]
    fn test_signature_golden() {
        let signed = OrderRequest::build(&limit_signal(), 5000, TS, None).sign(SECRET);
        assert_eq!(
            signed.signature,
            "292c5b7be193926422b0308cc6f02cd422e5f91736a2b3ee2658fdf122aac4c2"
        );
        assert_eq!(signed.body(), format!("{}&signature={}", signed.query, signed.signature));
    }

    #[test]
    fn test_signature_golden_with_override() {
        let overrides = BTreeMap::from([("timeInForce".to_string(), "IOC".to_string())]);
        let signed =
            OrderRequest::build(&limit_signal(), 5000, TS, Some(&overrides)).sign(SECRET);
        assert_eq!(
            signed.query,
            "price=50000&quantity=0.001&recvWindow=5000&side=BUY&symbol=BTCUSDT&timeInForce=IOC&timestamp=1700000000000&type=LIMIT"
        );
        assert_eq!(
            signed.signature,
            "3e7eba867f9c66ae2360328ceaa87619a607245a17c93a72853f7338ee90a049"
        );
    }

    #[test]
    fn test_market_order_omits_price() {
        let mut signal = limit_signal();
        signal.order_type = "MARKET".into();
        let order = OrderRequest::build(&signal, 5000, TS, None);
        assert!(order.get("price").is_none());
        assert_eq!(order.get("type"), Some("MARKET"));
    }

    #[test]
    fn test_exotic_type_is_forwarded_uppercase() {
        let mut signal = limit_signal();
        signal.order_type = "stop_loss".into();
        let order = OrderRequest::build(&signal, 5000, TS, None);
        assert_eq!(order.get("type"), Some("STOP_LOSS"));
        assert!(order.get("price").is_none());
    }

    #[test]
    fn test_message_is_not_a_signed_parameter() {
        let mut signal = limit_signal();
        signal.message = Some("breakout confirmed".into());
        let order = OrderRequest::build(&signal, 5000, TS, None);
        assert!(order.get("message").is_none());
        assert!(!order.canonical_query().contains("message"));
    }

    #[test]
    fn test_limit_without_price_omits_price() {
        let mut signal = limit_signal();
        signal.price = None;
        let order = OrderRequest::build(&signal, 5000, TS, None);
        assert!(order.get("price").is_none());
        assert!(!order.canonical_query().contains("price="));
    }

    #[test]
    fn test_override_wins_key_collision() {
        let overrides = BTreeMap::from([("recvWindow".to_string(), "10000".to_string())]);
        let order = OrderRequest::build(&limit_signal(), 5000, TS, Some(&overrides));
        assert_eq!(order.get("recvWindow"), Some("10000"));
        assert_eq!(order.canonical_query().matches("recvWindow=").count(), 1);
    }

    #[test]
    fn test_values_are_form_urlencoded() {
        let overrides =
            BTreeMap::from([("newClientOrderId".to_string(), "tv a&b=c".to_string())]);
        let order = OrderRequest::build(&limit_signal(), 5000, TS, Some(&overrides));
        assert!(order.canonical_query().contains("newClientOrderId=tv+a%26b%3Dc"));
    }

    #[test]
    fn test_signature_ignores_override_insertion_order() {
        let mut first = BTreeMap::new();
        first.insert("timeInForce".to_string(), "IOC".to_string());
        first.insert("newClientOrderId".to_string(), "tv-1".to_string());
        let mut second = BTreeMap::new();
        second.insert("newClientOrderId".to_string(), "tv-1".to_string());
        second.insert("timeInForce".to_string(), "IOC".to_string());

        let a = OrderRequest::build(&limit_signal(), 5000, TS, Some(&first)).sign(SECRET);
        let b = OrderRequest::build(&limit_signal(), 5000, TS, Some(&second)).sign(SECRET);
        assert_eq!(a.signature, b.signature);
    }

    #[test]
    fn test_signature_is_not_self_digested() {
        let signed = OrderRequest::build(&limit_signal(), 5000, TS, None).sign(SECRET);
        assert!(!signed.query.contains("signature"));
        assert!(signed.body().ends_with(&format!("&signature={}", signed.signature)));
    }

    #[test]
    fn test_fresh_timestamp_changes_signature() {
        let a = OrderRequest::build(&limit_signal(), 5000, TS, None).sign(SECRET);
        let b = OrderRequest::build(&limit_signal(), 5000, TS + 1, None).sign(SECRET);
        assert_ne!(a.signature, b.signature);
    }
}
