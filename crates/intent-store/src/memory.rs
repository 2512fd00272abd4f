use std::collections::BTreeMap;

use crate::edit::PrefEdit;
use crate::traits::{DbInfo, NamespaceInfo, PrefStore, PrefValue};

/// In-memory storage backend.
///
/// All entries live in a single `BTreeMap`; nothing touches disk.
/// Ideal for testing and prototyping.
///
/// # Example
///
/// ```
/// use intent_store::{MemoryStore, PrefEdit, PrefStore, PrefValue};
///
/// let mut store = MemoryStore::new();
/// let mut edit = PrefEdit::new();
/// edit.put_boolean("isSet", true);
/// store.commit("resume", edit).unwrap();
///
/// assert_eq!(store.get("resume", "isSet").unwrap(), Some(PrefValue::Boolean(true)));
/// assert_eq!(store.get("other", "isSet").unwrap(), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    /// (namespace, key) -> value
    entries: BTreeMap<(String, String), PrefValue>,
}

/// Error type for the in-memory backend.
///
/// This backend never actually fails, but the trait requires an error type.
#[derive(Debug, Clone, thiserror::Error)]
#[error("memory store error: {0}")]
pub struct MemoryError(String);

impl MemoryStore {
    /// Create a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of entries across all namespaces.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Summary information about every namespace.
    #[must_use]
    pub fn db_info(&self) -> DbInfo {
        let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
        for (ns, _) in self.entries.keys() {
            *counts.entry(ns.as_str()).or_insert(0) += 1;
        }
        DbInfo {
            total_entries: self.entries.len() as u64,
            namespaces: counts
                .into_iter()
                .map(|(name, entry_count)| NamespaceInfo {
                    name: name.to_string(),
                    entry_count,
                })
                .collect(),
        }
    }

    fn ns_key(namespace: &str, key: &str) -> (String, String) {
        (namespace.to_string(), key.to_string())
    }

    fn in_namespace<'a>(
        &'a self,
        namespace: &'a str,
    ) -> impl Iterator<Item = (&'a String, &'a PrefValue)> + 'a {
        self.entries
            .range(Self::ns_key(namespace, "")..)
            .take_while(move |((ns, _), _)| ns == namespace)
            .map(|((_, k), v)| (k, v))
    }
}

impl PrefStore for MemoryStore {
    type Error = MemoryError;

    fn get(&self, namespace: &str, key: &str) -> Result<Option<PrefValue>, Self::Error> {
        Ok(self.entries.get(&Self::ns_key(namespace, key)).cloned())
    }

    fn list_keys(&self, namespace: &str) -> Result<Vec<String>, Self::Error> {
        Ok(self.in_namespace(namespace).map(|(k, _)| k.clone()).collect())
    }

    fn entries(&self, namespace: &str) -> Result<Vec<(String, PrefValue)>, Self::Error> {
        Ok(self
            .in_namespace(namespace)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    fn namespaces(&self) -> Result<Vec<String>, Self::Error> {
        let mut names: Vec<String> = self.entries.keys().map(|(ns, _)| ns.clone()).collect();
        names.dedup();
        Ok(names)
    }

    fn commit(&mut self, namespace: &str, edit: PrefEdit) -> Result<(), Self::Error> {
        let mut current: BTreeMap<String, PrefValue> = self.entries(namespace)?.into_iter().collect();
        edit.apply_to(&mut current);

        self.entries.retain(|(ns, _), _| ns != namespace);
        self.entries.extend(
            current
                .into_iter()
                .map(|(k, v)| ((namespace.to_string(), k), v)),
        );
        Ok(())
    }

    fn contains(&self, namespace: &str, key: &str) -> Result<bool, Self::Error> {
        Ok(self.entries.contains_key(&Self::ns_key(namespace, key)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn put(store: &mut MemoryStore, ns: &str, key: &str, value: PrefValue) {
        let mut edit = PrefEdit::new();
        edit.put(key, value);
        store.commit(ns, edit).unwrap();
    }

    #[test]
    fn put_get_remove() {
        let mut store = MemoryStore::new();
        put(&mut store, "ns", "k1", PrefValue::String("hello".into()));
        assert_eq!(
            store.get("ns", "k1").unwrap(),
            Some(PrefValue::String("hello".into()))
        );

        put(&mut store, "ns", "k1", PrefValue::Long(7));
        assert_eq!(store.get("ns", "k1").unwrap(), Some(PrefValue::Long(7)));

        let mut edit = PrefEdit::new();
        edit.remove("k1");
        store.commit("ns", edit).unwrap();
        assert_eq!(store.get("ns", "k1").unwrap(), None);
        assert!(!store.contains("ns", "k1").unwrap());
    }

    #[test]
    fn namespace_isolation() {
        let mut store = MemoryStore::new();
        put(&mut store, "a", "k1", PrefValue::Int(1));
        put(&mut store, "b", "k1", PrefValue::Int(2));
        // A namespace sharing a prefix stays separate.
        put(&mut store, "ab", "k0", PrefValue::Int(3));

        assert_eq!(store.get("a", "k1").unwrap(), Some(PrefValue::Int(1)));
        assert_eq!(store.get("b", "k1").unwrap(), Some(PrefValue::Int(2)));
        assert_eq!(store.list_keys("a").unwrap(), vec!["k1"]);
    }

    #[test]
    fn clear_only_touches_own_namespace() {
        let mut store = MemoryStore::new();
        put(&mut store, "a", "x", PrefValue::Boolean(true));
        put(&mut store, "a", "y", PrefValue::Boolean(false));
        put(&mut store, "b", "x", PrefValue::Boolean(true));

        let mut edit = PrefEdit::new();
        edit.clear().put_int("z", 9);
        store.commit("a", edit).unwrap();

        assert_eq!(store.list_keys("a").unwrap(), vec!["z"]);
        assert_eq!(store.get("b", "x").unwrap(), Some(PrefValue::Boolean(true)));
        assert_eq!(store.entry_count(), 2);
    }

    #[test]
    fn entries_and_namespaces_sorted() {
        let mut store = MemoryStore::new();
        put(&mut store, "ns", "b", PrefValue::Int(2));
        put(&mut store, "ns", "a", PrefValue::Int(1));
        put(&mut store, "other", "c", PrefValue::Int(3));

        let entries = store.entries("ns").unwrap();
        assert_eq!(
            entries,
            vec![
                ("a".to_string(), PrefValue::Int(1)),
                ("b".to_string(), PrefValue::Int(2)),
            ]
        );
        assert_eq!(store.namespaces().unwrap(), vec!["ns", "other"]);

        let info = store.db_info();
        assert_eq!(info.total_entries, 3);
        assert_eq!(info.namespaces[0].name, "ns");
        assert_eq!(info.namespaces[0].entry_count, 2);
    }
}
