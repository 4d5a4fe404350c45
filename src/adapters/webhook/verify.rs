//! Webhook Signature Verification
//!
//! Authenticates inbound TradingView alerts. The sender computes a hex
//! HMAC-SHA256 over the exact raw body bytes with the shared secret and
//! sends it in the `x-tv-signature` header; verification recomputes the
//! digest over the same bytes and compares in constant time. The audit
//! log carries only 8-character digest prefixes; the secret and full
//! signatures never appear in any log line.

use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::signing::{hmac_sha256_hex, hmac_sha256_verify};

/// Header carrying the webhook signature.
pub const SIGNATURE_HEADER: &str = "x-tv-signature";

/// Authentication failure for an inbound webhook.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("missing x-tv-signature header")]
    MissingHeader,
    #[error("signature mismatch")]
    Mismatch,
}

/// Verifies inbound webhook signatures against the shared secret.
pub struct WebhookVerifier {
    secret: Vec<u8>,
}

impl WebhookVerifier {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Check one request. Nothing downstream runs unless this returns Ok.
    ///
    /// `body` must be the raw bytes exactly as received on the wire; any
    /// re-serialization breaks the digest.
    pub fn verify(
        &self,
        body: &[u8],
        presented: Option<&str>,
        request_id: Uuid,
    ) -> Result<(), AuthError> {
        let Some(presented) = presented else {
            warn!(request_id = %request_id, "Webhook rejected, signature header missing");
            return Err(AuthError::MissingHeader);
        };

        let ok = hmac_sha256_verify(&self.secret, body, presented);
        // Recomputed for the audit prefix only; the accept decision above
        // is the constant-time one.
        let computed = hmac_sha256_hex(&self.secret, body);
        let presented_prefix: String = presented.trim().chars().take(8).collect();

        if ok {
            info!(
                request_id = %request_id,
                digest_prefix = &computed[..8],
                "Webhook signature verified"
            );
            Ok(())
        } else {
            warn!(
                request_id = %request_id,
                expected_prefix = &computed[..8],
                presented_prefix = %presented_prefix,
                "Webhook rejected, signature mismatch"
            );
            Err(AuthError::Mismatch)
        }
    }
}
