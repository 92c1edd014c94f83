//! CloudStack request signing
//!
//! The signature is computed over the query string with parameters sorted by
//! name, values URL-encoded, and the whole string lower-cased; it is the
//! base64 HMAC-SHA1 of that string keyed with the API secret.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

/// Encode parameters as a query string, sorted by lower-cased name
pub fn canonical_query(params: &[(String, String)]) -> String {
    let mut sorted: Vec<&(String, String)> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.to_lowercase().cmp(&b.0.to_lowercase()));

    sorted
        .iter()
        .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Signature for `params`, base64-encoded (not yet URL-encoded)
pub fn sign(params: &[(String, String)], secret: &str) -> String {
    let to_sign = canonical_query(params).to_lowercase();

    let mut mac = HmacSha1::new_from_slice(secret.as_bytes())
        .unwrap_or_else(|_| unreachable!("HMAC-SHA1 accepts keys of any length"));
    mac.update(to_sign.as_bytes());
    STANDARD.encode(mac.finalize().into_bytes())
}

/// Full signed query string, ready to append to the endpoint
pub fn signed_query(params: &[(String, String)], secret: &str) -> String {
    let signature = sign(params, secret);
    format!(
        "{}&signature={}",
        canonical_query(params),
        urlencoding::encode(&signature)
    )
}
