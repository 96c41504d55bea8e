//! Webhook signature verification.
//!
//! Both collaborators (auth provider, payment gateway) sign notification
//! bodies with HMAC-SHA256 over the raw bytes, hex-encoded in a header.
//! Verification must happen before the payload is decoded or trusted.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Verify a hex-encoded HMAC-SHA256 signature over `body`.
///
/// Comparison is constant-time (delegated to the `hmac` crate's tag
/// verification). Returns `false` for malformed hex as well as for a
/// mismatched tag; callers treat both as an unauthorized notification.
#[must_use]
pub fn verify_signature(secret: &SecretString, body: &[u8], signature_hex: &str) -> bool {
    let Ok(provided) = hex::decode(signature_hex) else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(secret.expose_secret().as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&provided).is_ok()
}

/// Compute the hex signature for `body`. Used by tests; production
/// signatures come from the collaborators.
#[must_use]
pub fn sign(secret: &SecretString, body: &[u8]) -> String {
    #[allow(clippy::expect_used)] // HMAC accepts keys of any length
    let mut mac = HmacSha256::new_from_slice(secret.expose_secret().as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}
