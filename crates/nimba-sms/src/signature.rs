// SPDX-FileCopyrightText: 2026 Nimba Relay Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HMAC-SHA256 verification of webhook bodies.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::error;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the hex-encoded signature.
pub const SIGNATURE_HEADER: &str = "X-SMS-Signature";

/// Check `header_signature` against the HMAC of `raw_body`.
///
/// An empty secret accepts every request and logs a security warning each
/// time. Comparison is constant-time.
pub fn is_valid(configured_secret: &str, header_signature: Option<&str>, raw_body: &[u8]) -> bool {
    if configured_secret.is_empty() {
        error!(
            "SECURITY WARNING: webhook accepted without signature verification; \
             configure a webhook secret for this tenant"
        );
        return true;
    }

    let Some(signature) = header_signature else {
        return false;
    };
    let Ok(expected) = hex::decode(signature.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(configured_secret.as_bytes()) else {
        return false;
    };
    mac.update(raw_body);
    mac.verify_slice(&expected).is_ok()
}

/// Hex HMAC-SHA256 of `raw_body`, as the provider sends it.
pub fn sign(secret: &str, raw_body: &[u8]) -> String {
    // HMAC accepts keys of any length.
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return String::new(),
    };
    mac.update(raw_body);
    hex::encode(mac.finalize().into_bytes())
}
