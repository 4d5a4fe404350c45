//! Exchange API Response Types
//!
//! Wire types for the exchange order endpoint. Acknowledgements are passed
//! through as raw JSON; only rejection bodies get a typed (and lenient)
//! parse so the retry predicate can see the business error code.

use serde::Deserialize;

use crate::ports::exchange::ExchangeApiError;

/// Error body shape returned on rejection, e.g. `{"code":-1021,"msg":"..."}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeErrorBody {
    /// Business error code. Negative numbers on Binance-style APIs.
    pub code: Option<i64>,
    /// Human-readable rejection reason.
    #[serde(alias = "message")]
    pub msg: Option<String>,
}

/// Turn a non-2xx response into a classified rejection.
///
/// The body is parsed leniently: anything that is not the `{code, msg}`
/// shape keeps its raw text as the message so the operator still sees
/// what the exchange actually said.
pub fn classify_rejection(status: u16, body_text: &str) -> ExchangeApiError {
    let parsed: Option<ExchangeErrorBody> = serde_json::from_str(body_text).ok();
    let (code, message) = match parsed {
        Some(body) => (
            body.code,
            body.msg.unwrap_or_else(|| body_text.to_string()),
        ),
        None => (None, body_text.to_string()),
    };
    ExchangeApiError::Rejected {
        status,
        code,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_coded_rejection() {
        let err = classify_rejection(
            400,
            r#"{"code":-1021,"msg":"Timestamp for this request is outside of the recvWindow."}"#,
        );
        assert_eq!(err.code(), Some(-1021));
        match err {
            ExchangeApiError::Rejected {
                status, message, ..
            } => {
                assert_eq!(status, 400);
                assert!(message.contains("recvWindow"));
            }
            other => panic!("unexpected classification: {other:?}"),
        }
    }

    #[test]
    fn test_classify_message_alias() {
        let err = classify_rejection(403, r#"{"code":-2015,"message":"Invalid API-key."}"#);
        assert_eq!(err.code(), Some(-2015));
    }

    #[test]
    fn test_classify_unparseable_body_keeps_raw_text() {
        let err = classify_rejection(502, "<html>Bad Gateway</html>");
        assert_eq!(err.code(), None);
        match err {
            ExchangeApiError::Rejected { message, .. } => {
                assert_eq!(message, "<html>Bad Gateway</html>");
            }
            other => panic!("unexpected classification: {other:?}"),
        }
    }

    #[test]
    fn test_classify_empty_body() {
        let err = classify_rejection(500, "");
        assert_eq!(err.code(), None);
        assert!(!err.is_timeout());
    }
}
