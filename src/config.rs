use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use dirs::home_dir;

/// Environment variable overriding the store location.
pub const DB_ENV: &str = "OXIDAUTH_DB";

const APP_DIR: &str = ".google-authenticator";
const DB_FILE: &str = "config.db";

/// Resolve the store path: explicit flag, then `OXIDAUTH_DB`, then the home default.
pub fn db_path(flag: Option<&Path>) -> Result<PathBuf> {
    resolve(
        flag,
        std::env::var_os(DB_ENV).map(PathBuf::from),
        home_dir(),
    )
}

fn resolve(flag: Option<&Path>, env: Option<PathBuf>, home: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = flag {
        return Ok(path.to_path_buf());
    }
    if let Some(path) = env.filter(|p| !p.as_os_str().is_empty()) {
        return Ok(path);
    }
    let home = home.ok_or_else(|| anyhow!("no home directory available"))?;
    Ok(home.join(APP_DIR).join(DB_FILE))
}
