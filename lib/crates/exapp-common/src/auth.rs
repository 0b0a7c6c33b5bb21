//! Shared-secret authentication for ExApp callbacks.
//!
//! The same predicate is used by outbound calls (to build the header) and by
//! whatever middleware gates inbound calls from ExApps.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

/// Build the `AUTHORIZATION-APP-API` header value for `user` and `secret`.
#[must_use]
pub fn authorization_header(user: &str, secret: &str) -> String {
    STANDARD.encode(format!("{user}:{secret}"))
}

/// Returns `true` if `header` carries `expected_secret`.
///
/// The header is `base64("<user>:<secret>")`; the user part is ignored here
/// and only the secret after the first `:` is compared. An empty expected
/// secret never matches.
#[must_use]
pub fn verify_shared_secret(expected_secret: &str, header: &str) -> bool {
    if expected_secret.is_empty() {
        return false;
    }
    let Ok(decoded) = STANDARD.decode(header.trim()) else {
        return false;
    };
    let Ok(decoded) = String::from_utf8(decoded) else {
        return false;
    };
    let Some((_, secret)) = decoded.split_once(':') else {
        return false;
    };
    constant_time_eq(secret.as_bytes(), expected_secret.as_bytes())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
