//! Inbound trade-signal types.
//!
//! A `TradeSignal` is the JSON payload a TradingView alert posts at the
//! webhook, parsed leniently (unknown fields ignored, `side`
//! case-insensitive, `type` passed through as sent) and then validated
//! strictly before anything is sent to the exchange. Parsing failures and
//! validation failures both end the request with a 400; neither ever
//! reaches the dispatch path.

use std::collections::BTreeMap;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Semantic validation failure for an otherwise well-formed signal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignalError {
    #[error("field '{0}' must not be empty")]
    EmptyField(&'static str),
    #[error("quantity '{0}' is not a positive decimal")]
    InvalidQuantity(String),
    #[error("price '{0}' is not a positive decimal")]
    InvalidPrice(String),
    #[error("unsupported side '{0}', expected 'buy' or 'sell'")]
    UnknownSide(String),
}

/// Trade side. Renders upper-case for the exchange wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl std::fmt::Display for TradeSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}

impl FromStr for TradeSide {
    type Err = SignalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" => Ok(Self::Buy),
            "sell" => Ok(Self::Sell),
            _ => Err(SignalError::UnknownSide(s.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for TradeSide {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

fn default_order_type() -> String {
    "LIMIT".to_string()
}

/// One TradingView alert, as posted to the webhook.
///
/// `quantity` and `price` stay `String` on purpose: the exact decimal text
/// the sender produced is what gets signed and sent downstream, so the
/// service never reformats it. Validation parses a copy to check it is a
/// positive decimal and otherwise leaves the text alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeSignal {
    /// Exchange trading pair, passed through verbatim (e.g. "BTCUSDT").
    pub symbol: String,
    /// Buy or sell.
    pub side: TradeSide,
    /// Base-asset quantity as decimal text.
    pub quantity: String,
    /// Limit price as decimal text. Only attached to limit orders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    /// Exchange order type, defaulting to "LIMIT". Forwarded as sent
    /// (upper-cased on the wire); unsupported values are the exchange's
    /// to reject.
    #[serde(rename = "type", default = "default_order_type")]
    pub order_type: String,
    /// Strategy name selecting a configured override table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<String>,
    /// Free-form alert annotation. Logged, never sent to the exchange.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl TradeSignal {
    /// Semantic checks that serde cannot express.
    ///
    /// Decimal parsing is strict (no surrounding whitespace, no signs of
    /// leniency) so whatever passes here is safe to embed in the signed
    /// query verbatim.
    pub fn validate(&self) -> Result<(), SignalError> {
        if self.symbol.trim().is_empty() {
            return Err(SignalError::EmptyField("symbol"));
        }
        if self.quantity.is_empty() {
            return Err(SignalError::EmptyField("quantity"));
        }
        let quantity = Decimal::from_str(&self.quantity)
            .map_err(|_| SignalError::InvalidQuantity(self.quantity.clone()))?;
        if quantity <= Decimal::ZERO {
            return Err(SignalError::InvalidQuantity(self.quantity.clone()));
        }
        if let Some(price) = &self.price {
            let parsed = Decimal::from_str(price)
                .map_err(|_| SignalError::InvalidPrice(price.clone()))?;
            if parsed <= Decimal::ZERO {
                return Err(SignalError::InvalidPrice(price.clone()));
            }
        }
        Ok(())
    }

    /// Whether this is a limit order. Gates the `price` parameter.
    pub fn is_limit(&self) -> bool {
        self.order_type.eq_ignore_ascii_case("LIMIT")
    }

    /// Overrides to merge into the order, resolved from the startup-time
    /// strategy table. Absent strategy or unknown name yields no overrides.
    pub fn resolve_overrides<'a>(
        &self,
        strategies: &'a BTreeMap<String, BTreeMap<String, String>>,
    ) -> Option<&'a BTreeMap<String, String>> {
        self.strategy.as_deref().and_then(|name| strategies.get(name))
    }
}
