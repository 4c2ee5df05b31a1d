//! The workflow's commands, each run against an open store.

use std::time::SystemTime;

use tracing::{debug, info};

use crate::{
    menu::{self, Items},
    store::SecretStore,
    totp::{self, Totp},
    AuthError, OtpCode,
};

/// Generates the current code for `key`.
///
/// Returns [`AuthError::NotFound`] when nothing is stored under `key`. The
/// stored secret is not re-validated beyond what generating needs.
pub fn generate(store: &SecretStore, key: &str, now: SystemTime) -> Result<OtpCode, AuthError> {
    let secret = store
        .get(key)?
        .ok_or_else(|| AuthError::NotFound(key.to_string()))?;

    let totp = Totp::new(secret);
    let code = totp.generate_at(now)?;
    debug!(
        key,
        remaining = totp.remaining_seconds(totp::seconds_since_epoch(now)),
        "code generated"
    );

    Ok(code)
}

/// Stores `secret` under `key` once it has produced a code.
///
/// Returns the confirmation shown to the user.
pub fn add(
    store: &mut SecretStore,
    key: &str,
    secret: &str,
    now: SystemTime,
) -> Result<String, AuthError> {
    totp::generate_code(secret, now)?;
    store.put(key, secret)?;

    info!(key, "secret added");
    Ok(format!("add [{key}] secret success"))
}

/// Removes `key`, reporting success whether or not it existed.
pub fn delete(store: &mut SecretStore, key: &str) -> Result<String, AuthError> {
    store.delete(key)?;

    info!(key, "secret deleted");
    Ok(format!("del [{key}] secret success"))
}

/// Builds the Alfred menu for the typed query words.
pub fn query(store: &SecretStore, args: &[String]) -> Result<Items, AuthError> {
    menu::build(store, args)
}
