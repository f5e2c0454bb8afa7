//! SQLite-backed identity store.
//!
//! One row per external identity: the stable user id discovered at login,
//! the login username, and the transmitted (still encoded) secret. Entries
//! are written on successful login, overwritten by re-login, and deleted on
//! login rollback together with the matching browser profile directory.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use tracing::info;

use shelfsync_core::{Error, Result};

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS identities (
    external_user_id TEXT PRIMARY KEY,
    username         TEXT NOT NULL,
    secret           TEXT NOT NULL,
    created_at       INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_identities_username ON identities (username);
";

/// Stored account credentials for one external user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalIdentity {
    pub external_user_id: String,
    pub username: String,
    /// Secret in its transmitted (encoded) form.
    pub secret: String,
}

/// Durable `external_user_id -> {username, secret}` mapping.
pub struct SessionStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl SessionStore {
    /// Open or create the store. `db_dir` is the directory; the file will be
    /// `db_dir/shelfsync.db`.
    pub fn open(db_dir: impl AsRef<Path>) -> Result<Self> {
        let db_dir = db_dir.as_ref();
        std::fs::create_dir_all(db_dir).map_err(|e| Error::Storage(e.to_string()))?;
        let db_path = db_dir.join("shelfsync.db");

        let conn = Connection::open(&db_path).map_err(|e| Error::Storage(e.to_string()))?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )
        .map_err(|e| Error::Storage(e.to_string()))?;
        conn.execute_batch(SCHEMA_SQL)
            .map_err(|e| Error::Storage(format!("Schema init failed: {}", e)))?;

        let store = Self {
            conn: Mutex::new(conn),
            db_path,
        };

        let count = store.count()?;
        info!(
            "SessionStore initialized: {} identities, path={}",
            count,
            store.db_path.display()
        );

        Ok(store)
    }

    /// Insert or overwrite an identity.
    pub fn put(&self, identity: &ExternalIdentity) -> Result<()> {
        let now = chrono::Utc::now().timestamp_millis();
        let conn = self.conn.lock();
        conn.prepare_cached(
            "INSERT INTO identities (external_user_id, username, secret, created_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(external_user_id) DO UPDATE SET
                 username = excluded.username,
                 secret = excluded.secret,
                 created_at = excluded.created_at",
        )
        .map_err(|e| Error::Storage(e.to_string()))?
        .execute(params![
            identity.external_user_id,
            identity.username,
            identity.secret,
            now
        ])
        .map_err(|e| Error::Storage(e.to_string()))?;
        Ok(())
    }

    /// Look up an identity by external user id.
    pub fn get(&self, external_user_id: &str) -> Result<Option<ExternalIdentity>> {
        let conn = self.conn.lock();
        let result = conn
            .prepare_cached(
                "SELECT external_user_id, username, secret FROM identities
                 WHERE external_user_id = ?1",
            )
            .map_err(|e| Error::Storage(e.to_string()))?
            .query_row(params![external_user_id], |row| {
                Ok(ExternalIdentity {
                    external_user_id: row.get(0)?,
                    username: row.get(1)?,
                    secret: row.get(2)?,
                })
            })
            .optional()
            .map_err(|e| Error::Storage(e.to_string()));
        result
    }

    /// Look up the most recently stored identity for a login username.
    ///
    /// Used by `connect?force=false` to reuse an existing session before the
    /// external id is known.
    pub fn find_by_username(&self, username: &str) -> Result<Option<ExternalIdentity>> {
        let conn = self.conn.lock();
        let result = conn
            .prepare_cached(
                "SELECT external_user_id, username, secret FROM identities
                 WHERE username = ?1 ORDER BY created_at DESC LIMIT 1",
            )
            .map_err(|e| Error::Storage(e.to_string()))?
            .query_row(params![username], |row| {
                Ok(ExternalIdentity {
                    external_user_id: row.get(0)?,
                    username: row.get(1)?,
                    secret: row.get(2)?,
                })
            })
            .optional()
            .map_err(|e| Error::Storage(e.to_string()));
        result
    }

    /// Delete an identity. Returns whether a row existed.
    pub fn delete(&self, external_user_id: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let changed = conn
            .prepare_cached("DELETE FROM identities WHERE external_user_id = ?1")
            .map_err(|e| Error::Storage(e.to_string()))?
            .execute(params![external_user_id])
            .map_err(|e| Error::Storage(e.to_string()))?;
        Ok(changed > 0)
    }

    /// Number of stored identities.
    pub fn count(&self) -> Result<usize> {
        let conn = self.conn.lock();
        let result = conn
            .prepare_cached("SELECT COUNT(*) FROM identities")
            .map_err(|e| Error::Storage(e.to_string()))?
            .query_row([], |row| row.get::<_, i64>(0))
            .map(|n| n as usize)
            .map_err(|e| Error::Storage(e.to_string()));
        result
    }
}
