pub mod codec;
pub mod commands;
pub mod menu;
pub mod store;
pub mod totp;

use std::{fmt::Display, path::PathBuf};

use hmac::{Hmac, Mac};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid secret: {0}")]
    InvalidSecret(String),
    #[error("Invalid digest")]
    InvalidDigest(Vec<u8>),
    #[error("Key must not be empty")]
    InvalidKey,
    #[error("No secret stored for key [{0}]")]
    NotFound(String),
    #[error("Secret store at {path} is unavailable")]
    StorageUnavailable {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("Could not write to the secret store")]
    WriteFailed(#[source] rusqlite::Error),
    #[error("Could not read from the secret store")]
    ReadFailed(#[source] rusqlite::Error),
}

impl AuthError {
    pub(crate) fn unavailable(
        path: impl Into<PathBuf>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::StorageUnavailable {
            path: path.into(),
            source: source.into(),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct OtpCode {
    code: u32,
    digits: u32,
}

impl Display for OtpCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:0padding$}",
            self.code,
            padding = (self.digits as usize)
        )
    }
}

pub trait Otp {
    /// Decodes a secret (given as an RFC4648 base32-encoded ASCII string)
    /// into a byte string
    fn decode_secret(secret: &str) -> Result<Vec<u8>, AuthError> {
        codec::decode(secret)
    }

    /// Calculates the HMAC-SHA1 digest of `data` keyed by the decoded secret.
    fn calc_digest(decoded_secret: &[u8], data: u64) -> Result<Vec<u8>, AuthError> {
        let mut mac = HmacSha1::new_from_slice(decoded_secret)
            .map_err(|e| AuthError::InvalidSecret(e.to_string()))?;
        mac.update(&data.to_be_bytes());

        Ok(mac.finalize().into_bytes().to_vec())
    }

    /// Encodes the HMAC digest into a truncated integer.
    fn encode_digest_truncated(digest: &[u8], target_digits_count: u32) -> Result<u32, AuthError> {
        // The last byte tells us the offset
        let offset = match digest.last() {
            Some(x) => *x & 0xf,
            None => return Err(AuthError::InvalidDigest(Vec::from(digest))),
        } as usize;

        // Gets the 4 bytes that will compose the code
        let code_bytes: [u8; 4] = match digest
            .get(offset..offset + 4)
            .and_then(|bytes| bytes.try_into().ok())
        {
            Some(x) => x,
            None => return Err(AuthError::InvalidDigest(Vec::from(digest))),
        };

        let code = u32::from_be_bytes(code_bytes);
        let truncation_factor = u32::pow(10, target_digits_count);

        Ok((code & 0x7fffffff) % truncation_factor)
    }
}
