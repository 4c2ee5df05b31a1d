use std::time::{SystemTime, UNIX_EPOCH};

use crate::{AuthError, Otp, OtpCode};

/// Length of a time step, in seconds.
pub const PERIOD: u64 = 30;
/// Number of digits in a generated code.
pub const DIGITS: u32 = 6;

#[derive(Debug, Clone, PartialEq)]
pub struct Totp {
    pub(crate) secret: String,
}

impl Otp for Totp {}

impl Totp {
    /// Creates the config for the [Time-based One-time Password Algorithm](http://en.wikipedia.org/wiki/Time-based_One-time_Password_Algorithm)
    /// (TOTP) given an RFC4648 base32 encoded secret.
    ///
    /// Obs.: codes always use the SHA1 hash, 6 digits and a period of 30 seconds
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Generates a Totp from the provided seconds since the UNIX epoch
    pub fn generate(&self, seconds_since_epoch: u64) -> Result<OtpCode, AuthError> {
        let calculated_time = seconds_since_epoch / PERIOD;

        let decoded = Self::decode_secret(self.secret.as_str())?;
        let digest = Self::calc_digest(decoded.as_slice(), calculated_time)?;

        let code = Self::encode_digest_truncated(digest.as_ref(), DIGITS)?;

        Ok(OtpCode {
            code,
            digits: DIGITS,
        })
    }

    /// Generates a Totp for the given wall-clock time.
    ///
    /// Times before the UNIX epoch count as the epoch itself.
    pub fn generate_at(&self, at: SystemTime) -> Result<OtpCode, AuthError> {
        self.generate(seconds_since_epoch(at))
    }

    /// Seconds left before the code generated at `seconds_since_epoch` expires
    pub fn remaining_seconds(&self, seconds_since_epoch: u64) -> u64 {
        PERIOD - seconds_since_epoch % PERIOD
    }
}

/// Derives the code for a base32 `secret` at the given time.
pub fn generate_code(secret: &str, at: SystemTime) -> Result<OtpCode, AuthError> {
    Totp::new(secret).generate_at(at)
}

pub(crate) fn seconds_since_epoch(at: SystemTime) -> u64 {
    at.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}
