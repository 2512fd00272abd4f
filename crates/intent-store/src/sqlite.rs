//! SQLite persistence backend using rusqlite.
//!
//! The default backend for desktop and device builds. Uses WAL mode unless
//! configured otherwise; every [`PrefEdit`] lands in one SQL transaction.
//!
//! # Example
//!
//! ```no_run
//! use intent_store::{PrefEdit, PrefStore, PrefValue, SqliteStore};
//!
//! let mut store = SqliteStore::open("provisioning.db").unwrap();
//! let mut edit = PrefEdit::new();
//! edit.put_long("deadline", 1_700_000_000);
//! store.commit("resume", edit).unwrap();
//!
//! let value = store.get("resume", "deadline").unwrap();
//! assert_eq!(value, Some(PrefValue::Long(1_700_000_000)));
//! ```

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension};

use crate::codec::{decode_value, encode_value, CodecError};
use crate::edit::PrefEdit;
use crate::traits::{DbInfo, NamespaceInfo, PrefStore, PrefValue};

/// SQLite configuration options.
#[derive(Debug, Clone)]
pub struct SqliteConfig {
    /// SQLite journal mode. Defaults to WAL.
    pub journal_mode: JournalMode,
    /// Busy timeout in milliseconds. Defaults to 5000.
    pub busy_timeout_ms: u32,
    /// SQLite page size. Defaults to 4096.
    pub page_size: u32,
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self {
            journal_mode: JournalMode::Wal,
            busy_timeout_ms: 5000,
            page_size: 4096,
        }
    }
}

/// SQLite journal mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JournalMode {
    /// Write-ahead logging; readers proceed during writes.
    Wal,
    /// Traditional rollback journal.
    Delete,
    /// In-memory journal (fastest, no crash recovery).
    Memory,
}

impl JournalMode {
    fn as_str(self) -> &'static str {
        match self {
            Self::Wal => "WAL",
            Self::Delete => "DELETE",
            Self::Memory => "MEMORY",
        }
    }
}

/// Error type for the SQLite backend.
#[derive(Debug, thiserror::Error)]
pub enum SqliteError {
    /// An error from rusqlite.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A stored value could not be encoded or decoded.
    #[error("value codec error in {namespace}/{key}: {source}")]
    Codec {
        namespace: String,
        key: String,
        #[source]
        source: CodecError,
    },
    /// Lock poisoned.
    #[error("sqlite lock poisoned")]
    LockPoisoned,
}

/// SQLite persistence backend.
///
/// Wraps a `rusqlite::Connection` behind a `Mutex` for safe shared access.
/// Creates the `prefs` table automatically on first open.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a SQLite database at the given path with default config.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SqliteError> {
        Self::open_with_config(path, SqliteConfig::default())
    }

    /// Open with custom configuration.
    pub fn open_with_config<P: AsRef<Path>>(
        path: P,
        config: SqliteConfig,
    ) -> Result<Self, SqliteError> {
        let conn = Connection::open(path)?;
        Self::init_connection(&conn, &config)?;
        Self::create_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (useful for testing).
    pub fn open_in_memory() -> Result<Self, SqliteError> {
        let conn = Connection::open_in_memory()?;
        Self::init_connection(&conn, &SqliteConfig::default())?;
        Self::create_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn init_connection(conn: &Connection, config: &SqliteConfig) -> Result<(), SqliteError> {
        conn.execute_batch(&format!(
            "PRAGMA journal_mode = {};
             PRAGMA busy_timeout = {};
             PRAGMA page_size = {};
             PRAGMA synchronous = NORMAL;",
            config.journal_mode.as_str(),
            config.busy_timeout_ms,
            config.page_size,
        ))?;
        Ok(())
    }

    fn create_schema(conn: &Connection) -> Result<(), SqliteError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS prefs (
                namespace   TEXT NOT NULL,
                key         TEXT NOT NULL,
                data        BLOB NOT NULL,
                updated_at  INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY (namespace, key)
            );",
        )?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, SqliteError> {
        self.conn.lock().map_err(|_| SqliteError::LockPoisoned)
    }

    fn now_ms() -> i64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
            .unwrap_or_default()
    }

    fn decode(namespace: &str, key: &str, data: &[u8]) -> Result<PrefValue, SqliteError> {
        decode_value(data).map_err(|source| SqliteError::Codec {
            namespace: namespace.to_string(),
            key: key.to_string(),
            source,
        })
    }

    /// Get summary information about the database.
    pub fn db_info(&self) -> Result<DbInfo, SqliteError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT namespace, COUNT(*) FROM prefs GROUP BY namespace ORDER BY namespace",
        )?;
        let namespaces = stmt
            .query_map([], |row| {
                let count: i64 = row.get(1)?;
                Ok(NamespaceInfo {
                    name: row.get(0)?,
                    entry_count: count as u64,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(DbInfo {
            total_entries: namespaces.iter().map(|ns| ns.entry_count).sum(),
            namespaces,
        })
    }

    /// Milliseconds since the Unix epoch of the last write to a namespace,
    /// or `None` if the namespace is empty.
    pub fn last_updated(&self, namespace: &str) -> Result<Option<i64>, SqliteError> {
        let conn = self.lock()?;
        let ts: Option<i64> = conn.query_row(
            "SELECT MAX(updated_at) FROM prefs WHERE namespace = ?1",
            params![namespace],
            |row| row.get(0),
        )?;
        Ok(ts)
    }

    /// Get the database file size in bytes.
    pub fn file_size(&self) -> Result<u64, SqliteError> {
        let conn = self.lock()?;
        let page_count: i64 = conn.query_row("PRAGMA page_count", [], |row| row.get(0))?;
        let page_size: i64 = conn.query_row("PRAGMA page_size", [], |row| row.get(0))?;
        Ok((page_count * page_size) as u64)
    }

    /// Get the current journal mode.
    pub fn journal_mode(&self) -> Result<String, SqliteError> {
        let conn = self.lock()?;
        let mode: String = conn.query_row("PRAGMA journal_mode", [], |row| row.get(0))?;
        Ok(mode)
    }

    /// Close the connection, reporting any error SQLite raises on close.
    pub fn close(self) -> Result<(), SqliteError> {
        let conn = self
            .conn
            .into_inner()
            .map_err(|_| SqliteError::LockPoisoned)?;
        conn.close().map_err(|(_, e)| SqliteError::Sqlite(e))
    }
}

impl PrefStore for SqliteStore {
    type Error = SqliteError;

    fn get(&self, namespace: &str, key: &str) -> Result<Option<PrefValue>, Self::Error> {
        let conn = self.lock()?;
        let data: Option<Vec<u8>> = conn
            .query_row(
                "SELECT data FROM prefs WHERE namespace = ?1 AND key = ?2",
                params![namespace, key],
                |row| row.get(0),
            )
            .optional()?;
        data.map(|d| Self::decode(namespace, key, &d)).transpose()
    }

    fn list_keys(&self, namespace: &str) -> Result<Vec<String>, Self::Error> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT key FROM prefs WHERE namespace = ?1 ORDER BY key")?;
        let keys = stmt
            .query_map(params![namespace], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(keys)
    }

    fn entries(&self, namespace: &str) -> Result<Vec<(String, PrefValue)>, Self::Error> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT key, data FROM prefs WHERE namespace = ?1 ORDER BY key")?;
        let rows = stmt
            .query_map(params![namespace], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, Vec<u8>>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(key, data)| {
                let value = Self::decode(namespace, &key, &data)?;
                Ok((key, value))
            })
            .collect()
    }

    fn namespaces(&self) -> Result<Vec<String>, Self::Error> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT DISTINCT namespace FROM prefs ORDER BY namespace")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(names)
    }

    fn commit(&mut self, namespace: &str, edit: PrefEdit) -> Result<(), Self::Error> {
        if edit.is_empty() {
            return Ok(());
        }
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;
        let now = Self::now_ms();

        if edit.clears() {
            tx.execute("DELETE FROM prefs WHERE namespace = ?1", params![namespace])?;
        }
        for (key, change) in edit.net_changes() {
            match change {
                Some(value) => {
                    let data = encode_value(value).map_err(|source| SqliteError::Codec {
                        namespace: namespace.to_string(),
                        key: key.to_string(),
                        source,
                    })?;
                    tx.execute(
                        "INSERT INTO prefs (namespace, key, data, updated_at)
                         VALUES (?1, ?2, ?3, ?4)
                         ON CONFLICT(namespace, key)
                         DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at",
                        params![namespace, key, data, now],
                    )?;
                }
                None => {
                    tx.execute(
                        "DELETE FROM prefs WHERE namespace = ?1 AND key = ?2",
                        params![namespace, key],
                    )?;
                }
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn contains(&self, namespace: &str, key: &str) -> Result<bool, Self::Error> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM prefs WHERE namespace = ?1 AND key = ?2",
            params![namespace, key],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}
