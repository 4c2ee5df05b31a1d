//! Base32 decoding for shared secrets.
//!
//! Secrets are typed by hand, so padding is optional, lower-case input is
//! accepted and unused trailing bits are ignored. Everything else must be
//! valid RFC4648 base32.

use data_encoding::{Encoding, BASE32};

use crate::AuthError;

const BLOCK_LEN: usize = 8;

/// Decodes a base32 secret into raw key bytes.
pub fn decode(secret: &str) -> Result<Vec<u8>, AuthError> {
    let normalized = normalize(secret);

    lenient_base32()?
        .decode(normalized.as_bytes())
        .map_err(|e| AuthError::InvalidSecret(e.to_string()))
}

/// Standard base32 that does not insist the leftover bits of the last
/// symbol are zero.
fn lenient_base32() -> Result<Encoding, AuthError> {
    let mut spec = BASE32.specification();
    spec.check_trailing_bits = false;

    spec.encoding()
        .map_err(|e| AuthError::InvalidSecret(e.to_string()))
}

/// Trims, upper-cases and pads the secret to a whole number of blocks.
fn normalize(secret: &str) -> String {
    let mut normalized = secret.trim().to_uppercase();

    let remainder = normalized.len() % BLOCK_LEN;
    if remainder != 0 {
        normalized.push_str(&"=".repeat(BLOCK_LEN - remainder));
    }

    normalized
}
