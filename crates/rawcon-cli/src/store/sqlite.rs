use std::path::Path;
use std::time::Duration;

use anyhow::Context as _;
use rusqlite::{Connection, OptionalExtension as _, Transaction, TransactionBehavior};

use super::{KeyValueStore, StoreError};

const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

/// Key-value store backed by a single `kv` table in an `SQLite` file.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open or create the database at `path`, creating parent directories
    /// and the `kv` table as needed.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created or the DB cannot be opened.
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create db dir {}", parent.display()))?;
        }
        let conn =
            Connection::open(path).with_context(|| format!("open db at {}", path.display()))?;
        Self::from_connection(conn)
    }

    /// Wrap an existing connection (e.g. `Connection::open_in_memory`).
    ///
    /// # Errors
    /// Returns an error if the `kv` table cannot be created.
    pub fn from_connection(conn: Connection) -> anyhow::Result<Self> {
        // Overlapping commands queue on the write lock.
        conn.busy_timeout(BUSY_TIMEOUT).context("set busy timeout")?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )
        .context("create kv table")?;
        Ok(Self { conn })
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Option<String> {
        let result = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| {
                row.get::<_, String>(0)
            })
            .optional();
        match result {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!("could not read {key}: {e}");
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.conn
            .execute(
                "INSERT INTO kv (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                rusqlite::params![key, value],
            )
            .map(|_| ())
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }

    fn update(
        &self,
        key: &str,
        f: &mut dyn FnMut(Option<&str>) -> Result<String, StoreError>,
    ) -> Result<(), StoreError> {
        let unavailable = |e: rusqlite::Error| StoreError::Unavailable(e.to_string());
        // Write lock is held from the read through the commit.
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)
            .map_err(unavailable)?;
        let current = tx
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| {
                row.get::<_, String>(0)
            })
            .optional()
            .map_err(unavailable)?;
        let next = f(current.as_deref())?;
        tx.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            rusqlite::params![key, next],
        )
        .map_err(unavailable)?;
        tx.commit().map_err(unavailable)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", [key])
            .map(|_| ())
            .map_err(|e| StoreError::Unavailable(e.to_string()))
    }
}
