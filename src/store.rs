//! Durable key to secret storage.
//!
//! Secrets live in a single SQLite table. Every mutation runs in its own
//! transaction, and the whole store is guarded by an exclusive lock on a
//! sidecar `<path>.lock` file for as long as the handle is open.

use std::{
    fs::{self, File, OpenOptions},
    ops::ControlFlow,
    path::{Path, PathBuf},
};

use fs4::FileExt;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, instrument, warn};

use crate::AuthError;

/// Open handle on the secret store.
///
/// Dropping the handle releases the lock; [`SecretStore::close`] does the
/// same but reports failures from closing the database.
pub struct SecretStore {
    path: PathBuf,
    conn: Connection,
    _lock: StoreLock,
}

/// Exclusive advisory lock, released when dropped.
struct StoreLock {
    path: PathBuf,
    file: File,
}

impl StoreLock {
    fn acquire(store_path: &Path) -> Result<Self, AuthError> {
        let path = lock_path(store_path);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|e| AuthError::unavailable(store_path, e))?;
        FileExt::try_lock_exclusive(&file).map_err(|e| AuthError::unavailable(store_path, e))?;

        Ok(Self { path, file })
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!(path = %self.path.display(), "failed to release store lock: {e}");
        }
    }
}

impl SecretStore {
    /// Opens (or creates) the store at `path`, creating parent directories.
    ///
    /// Fails with [`AuthError::StorageUnavailable`] when the store is held
    /// by another process.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AuthError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| AuthError::unavailable(path, e))?;
        }

        let lock = StoreLock::acquire(path)?;

        let conn = Connection::open(path).map_err(|e| AuthError::unavailable(path, e))?;
        conn.pragma_update(None, "synchronous", "FULL")
            .map_err(|e| AuthError::unavailable(path, e))?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS secret (
                key     TEXT PRIMARY KEY NOT NULL,
                secret  TEXT NOT NULL
            );",
        )
        .map_err(|e| AuthError::unavailable(path, e))?;

        debug!(path = %path.display(), "secret store opened");

        Ok(Self {
            path: path.to_path_buf(),
            conn,
            _lock: lock,
        })
    }

    /// Looks up the secret stored for `key`.
    pub fn get(&self, key: &str) -> Result<Option<String>, AuthError> {
        self.conn
            .query_row(
                "SELECT secret FROM secret WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(AuthError::ReadFailed)
    }

    /// Inserts the secret for `key`, replacing any previous one.
    ///
    /// Empty keys are rejected with [`AuthError::InvalidKey`].
    #[instrument(skip_all, fields(key = %key))]
    pub fn put(&mut self, key: &str, secret: &str) -> Result<(), AuthError> {
        if key.is_empty() {
            return Err(AuthError::InvalidKey);
        }

        let tx = self.conn.transaction().map_err(AuthError::WriteFailed)?;
        tx.execute(
            "INSERT INTO secret (key, secret) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET secret = excluded.secret",
            params![key, secret],
        )
        .map_err(AuthError::WriteFailed)?;
        tx.commit().map_err(AuthError::WriteFailed)?;

        debug!("secret stored");
        Ok(())
    }

    /// Removes the secret for `key`. Absent keys are not an error.
    #[instrument(skip_all, fields(key = %key))]
    pub fn delete(&mut self, key: &str) -> Result<(), AuthError> {
        let tx = self.conn.transaction().map_err(AuthError::WriteFailed)?;
        let removed = tx
            .execute("DELETE FROM secret WHERE key = ?1", params![key])
            .map_err(AuthError::WriteFailed)?;
        tx.commit().map_err(AuthError::WriteFailed)?;

        debug!(removed, "secret deleted");
        Ok(())
    }

    /// Visits every entry in ascending key order until `visit` breaks.
    pub fn for_each<F>(&self, mut visit: F) -> Result<(), AuthError>
    where
        F: FnMut(&str, &str) -> ControlFlow<()>,
    {
        let mut stmt = self
            .conn
            .prepare("SELECT key, secret FROM secret ORDER BY key")
            .map_err(AuthError::ReadFailed)?;
        let mut rows = stmt.query([]).map_err(AuthError::ReadFailed)?;

        while let Some(row) = rows.next().map_err(AuthError::ReadFailed)? {
            let key: String = row.get(0).map_err(AuthError::ReadFailed)?;
            let secret: String = row.get(1).map_err(AuthError::ReadFailed)?;
            if visit(&key, &secret).is_break() {
                break;
            }
        }

        Ok(())
    }

    /// Lists all stored keys in ascending order.
    pub fn keys(&self) -> Result<Vec<String>, AuthError> {
        let mut keys = Vec::new();
        self.for_each(|key, _| {
            keys.push(key.to_string());
            ControlFlow::Continue(())
        })?;

        Ok(keys)
    }

    /// Closes the database and releases the lock.
    pub fn close(self) -> Result<(), AuthError> {
        let Self { path, conn, _lock } = self;

        // The lock is dropped last, after the database is flushed and closed.
        conn.close()
            .map_err(|(_, e)| AuthError::unavailable(&path, e))?;

        debug!(path = %path.display(), "secret store closed");
        Ok(())
    }
}

fn lock_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".lock");
    PathBuf::from(name)
}
