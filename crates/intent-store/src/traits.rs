use std::fmt;

use serde::{Deserialize, Serialize};

use crate::edit::PrefEdit;

/// A primitive value held by a preference store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrefValue {
    /// UTF-8 text.
    String(String),
    /// 32-bit signed integer.
    Int(i32),
    /// 64-bit signed integer.
    Long(i64),
    /// Boolean flag.
    Boolean(bool),
}

impl PrefValue {
    /// Short name of the value kind.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Int(_) => "int",
            Self::Long(_) => "long",
            Self::Boolean(_) => "boolean",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_long(&self) -> Option<i64> {
        match self {
            Self::Long(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for PrefValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{s:?}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Long(v) => write!(f, "{v}L"),
            Self::Boolean(v) => write!(f, "{v}"),
        }
    }
}

/// Summary information about a stored namespace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamespaceInfo {
    /// Name of the namespace.
    pub name: String,
    /// Number of entries.
    pub entry_count: u64,
}

/// Summary information about the entire database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbInfo {
    /// Total number of entries across all namespaces.
    pub total_entries: u64,
    /// Per-namespace breakdown.
    pub namespaces: Vec<NamespaceInfo>,
}

/// Core trait for preference persistence.
///
/// Every backend implements this trait. Entries are primitive values
/// addressed by `(namespace, key)`; distinct namespaces never see each
/// other's keys.
///
/// All writes go through [`commit`](PrefStore::commit), which applies a
/// [`PrefEdit`] as a single unit: a reader never observes half of an edit.
/// How durable that unit is across crashes depends on the backend.
pub trait PrefStore {
    /// Error type for this backend.
    type Error: fmt::Debug + fmt::Display;

    /// Retrieve a value by `(namespace, key)`.
    /// Returns `None` if the key does not exist.
    fn get(&self, namespace: &str, key: &str) -> Result<Option<PrefValue>, Self::Error>;

    /// List all keys in a namespace, sorted.
    fn list_keys(&self, namespace: &str) -> Result<Vec<String>, Self::Error>;

    /// All entries of a namespace, sorted by key, read as one snapshot.
    fn entries(&self, namespace: &str) -> Result<Vec<(String, PrefValue)>, Self::Error>;

    /// Names of all namespaces holding at least one entry, sorted.
    fn namespaces(&self) -> Result<Vec<String>, Self::Error>;

    /// Apply `edit` to `namespace` atomically.
    fn commit(&mut self, namespace: &str, edit: PrefEdit) -> Result<(), Self::Error>;

    /// Check if a key exists in a namespace.
    fn contains(&self, namespace: &str, key: &str) -> Result<bool, Self::Error> {
        Ok(self.get(namespace, key)?.is_some())
    }
}
