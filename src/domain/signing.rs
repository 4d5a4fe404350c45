//! HMAC-SHA256 Signing Primitives
//!
//! One pair of helpers covers both directions of authentication: the
//! webhook verifier checks inbound bodies against `x-tv-signature`, and
//! the trade executor signs outbound canonical parameter strings. The
//! exchange dialect is hex-encoded digests, so everything here speaks hex.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Compute the hex-encoded HMAC-SHA256 of `message` under `secret`.
pub fn hmac_sha256_hex(secret: &[u8], message: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(message);
    hex::encode(mac.finalize().into_bytes())
}

/// Check a presented hex digest against the HMAC-SHA256 of `message`.
///
/// The digest comparison runs in constant time (`Mac::verify_slice`), so
/// response timing reveals nothing about how many leading bytes matched.
/// A presented value that is not valid hex can never match and returns
/// false without touching the MAC state.
pub fn hmac_sha256_verify(secret: &[u8], message: &[u8], presented_hex: &str) -> bool {
    let Ok(presented) = hex::decode(presented_hex.trim()) else {
        return false;
    };
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(message);
    mac.verify_slice(&presented).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    // Golden value: fixed JSON serialization signed with a fixed secret.
    // Any drift in the digest pipeline shows up here first.
    const BODY: &[u8] =
        br#"{"symbol":"BTCUSDT","side":"buy","quantity":"0.001","price":"50000","type":"LIMIT"}"#;
    const SECRET: &[u8] = b"s3cr3t";
    const GOLDEN: &str = "8e5056496020a96e2d04d538388a307e829c6728838abc19dc5326914e142362";

    #[test]
    fn golden_signature_is_reproducible() {
        assert_eq!(hmac_sha256_hex(SECRET, BODY), GOLDEN);
    }

    #[test]
    fn verify_accepts_matching_digest() {
        assert!(hmac_sha256_verify(SECRET, BODY, GOLDEN));
    }

    #[test]
    fn verify_accepts_uppercase_hex() {
        assert!(hmac_sha256_verify(SECRET, BODY, &GOLDEN.to_uppercase()));
    }

    #[test]
    fn verify_rejects_any_single_flipped_nibble() {
        for i in 0..GOLDEN.len() {
            let mut tampered: Vec<u8> = GOLDEN.bytes().collect();
            tampered[i] = if tampered[i] == b'0' { b'1' } else { b'0' };
            let tampered = String::from_utf8(tampered).unwrap();
            assert!(
                !hmac_sha256_verify(SECRET, BODY, &tampered),
                "flip at {i} should not verify"
            );
        }
    }

    #[test]
    fn verify_rejects_wrong_secret() {
        assert!(!hmac_sha256_verify(b"not-the-secret", BODY, GOLDEN));
    }

    #[test]
    fn verify_rejects_non_hex_input() {
        assert!(!hmac_sha256_verify(SECRET, BODY, "zz-definitely-not-hex"));
        assert!(!hmac_sha256_verify(SECRET, BODY, ""));
    }

    #[test]
    fn verify_rejects_truncated_digest() {
        assert!(!hmac_sha256_verify(SECRET, BODY, &GOLDEN[..32]));
    }
}
