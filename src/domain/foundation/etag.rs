//! ETags for optimistic locking.
//!
//! An ETag is the hex HMAC-SHA256 of `<id>_<version>` keyed with a server
//! salt, so clients cannot forge a tag for a version they have not seen.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Computes the ETag of an entity version.
pub fn etag(id: &impl ToString, version: i64, salt: &str) -> String {
    let mut mac = match HmacSha256::new_from_slice(salt.as_bytes()) {
        Ok(mac) => mac,
        // HMAC accepts keys of any length.
        Err(_) => return String::new(),
    };
    mac.update(format!("{}_{}", id.to_string(), version).as_bytes());
    let bytes = mac.finalize().into_bytes();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Strips the `W/` prefix and quotes of an `If-Match` header value.
pub fn normalize(header_value: &str) -> &str {
    let trimmed = header_value.trim();
    let trimmed = trimmed.strip_prefix("W/").unwrap_or(trimmed);
    trimmed.trim_matches('"')
}

/// Checks an `If-Match` value against the current version in constant time.
pub fn etag_matches(if_match: &str, id: &impl ToString, version: i64, salt: &str) -> bool {
    let expected = etag(id, version, salt);
    let given = normalize(if_match);
    given.len() == expected.len() && bool::from(given.as_bytes().ct_eq(expected.as_bytes()))
}
