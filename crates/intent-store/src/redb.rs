//! Pure-Rust key-value backend using [`redb`](https://docs.rs/redb).
//!
//! No C dependencies, for targets where bundling SQLite is awkward.
//!
//! Enable with `features = ["redb"]`.
//!
//! ```no_run
//! use intent_store::{PrefEdit, PrefStore, RedbStore};
//!
//! let mut store = RedbStore::open("/tmp/prefs.redb").unwrap();
//! let mut edit = PrefEdit::new();
//! edit.put_boolean("isSet", true);
//! store.commit("resume", edit).unwrap();
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use redb::{Database, ReadableTable, TableDefinition};

use crate::codec::{decode_value, encode_value, CodecError};
use crate::edit::PrefEdit;
use crate::traits::{DbInfo, NamespaceInfo, PrefStore, PrefValue};

/// Keys are `len(namespace) as u32 BE ++ namespace ++ key`; values are
/// codec-encoded [`PrefValue`]s.
const PREFS_TABLE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("prefs");

/// Errors returned by [`RedbStore`] operations.
#[derive(Debug, thiserror::Error)]
pub enum RedbError {
    /// Database, transaction, table or storage failure.
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),
    /// A stored value could not be encoded or decoded.
    #[error("value codec error in {namespace}/{key}: {source}")]
    Codec {
        namespace: String,
        key: String,
        #[source]
        source: CodecError,
    },
}

fn err(e: impl Into<redb::Error>) -> RedbError {
    RedbError::Redb(e.into())
}

fn codec_err(namespace: &str, key: &str, source: CodecError) -> RedbError {
    RedbError::Codec {
        namespace: namespace.to_string(),
        key: key.to_string(),
        source,
    }
}

/// A pure-Rust persistence backend built on [`redb`].
///
/// Every [`commit`](PrefStore::commit) runs in a single redb write
/// transaction.
pub struct RedbStore {
    db: Database,
}

impl RedbStore {
    /// Open or create a redb database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, RedbError> {
        let db = Database::create(path).map_err(err)?;
        Self::init(db)
    }

    /// Create an in-memory redb database (for testing).
    pub fn open_in_memory() -> Result<Self, RedbError> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(err)?;
        Self::init(db)
    }

    fn init(db: Database) -> Result<Self, RedbError> {
        // Ensure the table exists so read transactions can open it.
        let txn = db.begin_write().map_err(err)?;
        txn.open_table(PREFS_TABLE).map_err(err)?;
        txn.commit().map_err(err)?;
        Ok(Self { db })
    }

    /// Return summary information about the database.
    pub fn db_info(&self) -> Result<DbInfo, RedbError> {
        let txn = self.db.begin_read().map_err(err)?;
        let table = txn.open_table(PREFS_TABLE).map_err(err)?;

        let mut counts: BTreeMap<String, u64> = BTreeMap::new();
        for item in table.iter().map_err(err)? {
            let (key_guard, _) = item.map_err(err)?;
            if let Some((ns, _)) = parse_pref_key(key_guard.value()) {
                *counts.entry(ns.to_string()).or_insert(0) += 1;
            }
        }

        Ok(DbInfo {
            total_entries: counts.values().sum(),
            namespaces: counts
                .into_iter()
                .map(|(name, entry_count)| NamespaceInfo { name, entry_count })
                .collect(),
        })
    }

    /// Close the database.
    pub fn close(self) {
        drop(self.db);
    }

    fn scan(&self, namespace: &str) -> Result<Vec<(String, Vec<u8>)>, RedbError> {
        let txn = self.db.begin_read().map_err(err)?;
        let table = txn.open_table(PREFS_TABLE).map_err(err)?;

        let prefix = pref_key_prefix(namespace);
        let range = table.range(prefix.as_slice()..).map_err(err)?;

        let mut rows = Vec::new();
        for item in range {
            let (key_guard, value_guard) = item.map_err(err)?;
            let raw = key_guard.value();
            if !raw.starts_with(&prefix) {
                break;
            }
            if let Ok(k) = std::str::from_utf8(&raw[prefix.len()..]) {
                rows.push((k.to_string(), value_guard.value().to_vec()));
            }
        }
        Ok(rows)
    }
}

impl PrefStore for RedbStore {
    type Error = RedbError;

    fn get(&self, namespace: &str, key: &str) -> Result<Option<PrefValue>, RedbError> {
        let txn = self.db.begin_read().map_err(err)?;
        let table = txn.open_table(PREFS_TABLE).map_err(err)?;
        match table.get(pref_key(namespace, key).as_slice()).map_err(err)? {
            Some(guard) => decode_value(guard.value())
                .map(Some)
                .map_err(|e| codec_err(namespace, key, e)),
            None => Ok(None),
        }
    }

    fn list_keys(&self, namespace: &str) -> Result<Vec<String>, RedbError> {
        Ok(self.scan(namespace)?.into_iter().map(|(k, _)| k).collect())
    }

    fn entries(&self, namespace: &str) -> Result<Vec<(String, PrefValue)>, RedbError> {
        self.scan(namespace)?
            .into_iter()
            .map(|(key, data)| {
                let value = decode_value(&data).map_err(|e| codec_err(namespace, &key, e))?;
                Ok((key, value))
            })
            .collect()
    }

    fn namespaces(&self) -> Result<Vec<String>, RedbError> {
        Ok(self
            .db_info()?
            .namespaces
            .into_iter()
            .map(|ns| ns.name)
            .collect())
    }

    fn commit(&mut self, namespace: &str, edit: PrefEdit) -> Result<(), RedbError> {
        if edit.is_empty() {
            return Ok(());
        }
        let txn = self.db.begin_write().map_err(err)?;
        {
            let mut table = txn.open_table(PREFS_TABLE).map_err(err)?;

            if edit.clears() {
                let prefix = pref_key_prefix(namespace);
                let mut doomed = Vec::new();
                for item in table.range(prefix.as_slice()..).map_err(err)? {
                    let (key_guard, _) = item.map_err(err)?;
                    let raw = key_guard.value();
                    if !raw.starts_with(&prefix) {
                        break;
                    }
                    doomed.push(raw.to_vec());
                }
                for key in doomed {
                    table.remove(key.as_slice()).map_err(err)?;
                }
            }

            for (key, change) in edit.net_changes() {
                let k = pref_key(namespace, key);
                match change {
                    Some(value) => {
                        let data = encode_value(value).map_err(|e| codec_err(namespace, key, e))?;
                        table.insert(k.as_slice(), data.as_slice()).map_err(err)?;
                    }
                    None => {
                        table.remove(k.as_slice()).map_err(err)?;
                    }
                }
            }
        }
        txn.commit().map_err(err)?;
        Ok(())
    }
}

// ── Key encoding ────────────────────────────────────────────────────

/// Entry key: `len(namespace)` as a big-endian `u32`, the namespace, then the
/// key. The length prefix keeps a namespace from matching the start of a
/// longer one, whatever bytes either name contains.
fn pref_key(namespace: &str, key: &str) -> Vec<u8> {
    let mut k = pref_key_prefix(namespace);
    k.extend_from_slice(key.as_bytes());
    k
}

/// Every key in a namespace starts with this prefix, and no key outside it does.
fn pref_key_prefix(namespace: &str) -> Vec<u8> {
    let mut k = Vec::with_capacity(4 + namespace.len());
    k.extend_from_slice(&(namespace.len() as u32).to_be_bytes());
    k.extend_from_slice(namespace.as_bytes());
    k
}

fn parse_pref_key(key: &[u8]) -> Option<(&str, &str)> {
    if key.len() < 4 {
        return None;
    }
    let (len, rest) = key.split_at(4);
    let len = u32::from_be_bytes(len.try_into().ok()?) as usize;
    if rest.len() < len {
        return None;
    }
    let (ns, k) = rest.split_at(len);
    Some((std::str::from_utf8(ns).ok()?, std::str::from_utf8(k).ok()?))
}
