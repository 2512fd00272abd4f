use std::collections::BTreeMap;

use crate::traits::PrefValue;

/// A pending change to one namespace, applied by
/// [`PrefStore::commit`](crate::PrefStore::commit).
///
/// If [`clear`](Self::clear) was requested, every existing entry of the
/// namespace is dropped first, no matter where in the sequence it was
/// called. The recorded puts and removes are then applied in order.
///
/// # Example
///
/// ```
/// use intent_store::{MemoryStore, PrefEdit, PrefStore, PrefValue};
///
/// let mut store = MemoryStore::new();
/// let mut edit = PrefEdit::new();
/// edit.put_string("org", "Example Corp").put_int("retries", 3);
/// store.commit("resume", edit).unwrap();
///
/// assert_eq!(store.get("resume", "retries").unwrap(), Some(PrefValue::Int(3)));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrefEdit {
    clear: bool,
    changes: Vec<(String, Option<PrefValue>)>,
}

impl PrefEdit {
    /// An edit that changes nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every existing entry of the namespace before applying changes.
    pub fn clear(&mut self) -> &mut Self {
        self.clear = true;
        self
    }

    pub fn put(&mut self, key: impl Into<String>, value: PrefValue) -> &mut Self {
        self.changes.push((key.into(), Some(value)));
        self
    }

    pub fn put_string(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.put(key, PrefValue::String(value.into()))
    }

    pub fn put_int(&mut self, key: impl Into<String>, value: i32) -> &mut Self {
        self.put(key, PrefValue::Int(value))
    }

    pub fn put_long(&mut self, key: impl Into<String>, value: i64) -> &mut Self {
        self.put(key, PrefValue::Long(value))
    }

    pub fn put_boolean(&mut self, key: impl Into<String>, value: bool) -> &mut Self {
        self.put(key, PrefValue::Boolean(value))
    }

    pub fn remove(&mut self, key: impl Into<String>) -> &mut Self {
        self.changes.push((key.into(), None));
        self
    }

    /// Whether the namespace is cleared before the changes are applied.
    #[must_use]
    pub fn clears(&self) -> bool {
        self.clear
    }

    /// Recorded changes in order; `None` marks a removal.
    pub fn changes(&self) -> impl Iterator<Item = (&str, Option<&PrefValue>)> {
        self.changes.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }

    /// Whether committing this edit would change nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.clear && self.changes.is_empty()
    }

    /// Collapse the change list to its net effect per key, sorted by key.
    ///
    /// Backends that write through a single upsert/delete per key use this
    /// instead of replaying [`changes`](Self::changes).
    #[must_use]
    pub fn net_changes(&self) -> BTreeMap<&str, Option<&PrefValue>> {
        self.changes().collect()
    }

    /// Apply this edit to an in-memory map of one namespace.
    pub fn apply_to(&self, entries: &mut BTreeMap<String, PrefValue>) {
        if self.clear {
            entries.clear();
        }
        for (key, value) in &self.changes {
            match value {
                Some(v) => {
                    entries.insert(key.clone(), v.clone());
                }
                None => {
                    entries.remove(key);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_applies_before_changes() {
        let mut entries = BTreeMap::new();
        entries.insert("old".to_string(), PrefValue::Int(1));

        let mut edit = PrefEdit::new();
        edit.put_int("new", 2).clear();
        edit.apply_to(&mut entries);

        assert_eq!(entries.len(), 1);
        assert_eq!(entries.get("new"), Some(&PrefValue::Int(2)));
    }

    #[test]
    fn later_changes_win() {
        let mut edit = PrefEdit::new();
        edit.put_string("k", "a").remove("k").put_boolean("k", true);
        edit.put_long("gone", 1).remove("gone");

        let net = edit.net_changes();
        assert_eq!(net.get("k"), Some(&Some(&PrefValue::Boolean(true))));
        assert_eq!(net.get("gone"), Some(&None));

        let mut entries = BTreeMap::new();
        edit.apply_to(&mut entries);
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn empty_edit() {
        assert!(PrefEdit::new().is_empty());
        assert!(!PrefEdit::new().clear().is_empty());
    }
}
