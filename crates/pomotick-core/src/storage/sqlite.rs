//! SQLite-backed key-value storage.
//!
//! Values live in a single `kv` table. An optional page limit
//! (`PRAGMA max_page_count`) bounds the file size; hitting it surfaces
//! as [`StorageError::QuotaExceeded`].

use std::path::Path;

use rusqlite::{params, Connection};

use super::backend::KvBackend;
use super::data_dir;
use crate::error::StorageError;

pub const DB_FILE: &str = "pomotick.db";

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open the database at `<data_dir>/pomotick.db`.
    ///
    /// # Errors
    /// Returns an error if the data directory or database cannot be
    /// opened or migrated.
    pub fn open_default() -> Result<Self, StorageError> {
        let dir = data_dir()?;
        Self::open(dir.join(DB_FILE))
    }

    /// Open (creating if needed) a database file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or migrated.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path).map_err(|source| StorageError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    /// Open an in-memory database.
    ///
    /// # Errors
    /// Returns an error if SQLite cannot allocate the connection.
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    /// Cap the database at `pages` pages. SQLite never shrinks the limit
    /// below the current page count.
    ///
    /// # Errors
    /// Returns an error if the pragma fails.
    pub fn with_max_pages(self, pages: u32) -> Result<Self, StorageError> {
        let applied: i64 =
            self.conn
                .pragma_update_and_check(None, "max_page_count", pages, |row| row.get(0))?;
        tracing::debug!(requested = pages, applied, "sqlite page limit set");
        Ok(self)
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    fn migrate(&self) -> Result<(), StorageError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;
        Ok(())
    }
}

impl KvBackend for SqliteStore {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<(), StorageError> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }
}
