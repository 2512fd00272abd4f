use std::collections::BTreeMap;

use tracing::warn;

use crate::persistable::PersistableBundle;

/// A typed value carried in a [`Bundle`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Extra {
    /// UTF-8 text.
    String(String),
    /// 32-bit signed integer.
    Int(i32),
    /// 64-bit signed integer.
    Long(i64),
    /// Boolean flag.
    Boolean(bool),
    /// Structured value.
    PersistableBundle(PersistableBundle),
}

impl Extra {
    /// Short name of the value kind, used in diagnostics.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::String(_) => "String",
            Self::Int(_) => "Integer",
            Self::Long(_) => "Long",
            Self::Boolean(_) => "Boolean",
            Self::PersistableBundle(_) => "PersistableBundle",
        }
    }
}

impl From<String> for Extra {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for Extra {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<i32> for Extra {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<i64> for Extra {
    fn from(v: i64) -> Self {
        Self::Long(v)
    }
}

impl From<bool> for Extra {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<PersistableBundle> for Extra {
    fn from(v: PersistableBundle) -> Self {
        Self::PersistableBundle(v)
    }
}

/// A transient mapping from key to typed value.
///
/// The numeric and boolean getters follow the lenient convention of the
/// records this crate models: a missing key yields the type's default, and a
/// key holding another kind yields the default plus a warning. Use
/// [`contains_key`](Self::contains_key) or [`get`](Self::get) to tell the
/// cases apart.
///
/// # Example
///
/// ```
/// use intent_kit::Bundle;
///
/// let mut extras = Bundle::new();
/// extras.put_string("org", "Example Corp");
/// extras.put_int("retries", 3);
///
/// assert_eq!(extras.get_string("org"), Some("Example Corp"));
/// assert_eq!(extras.get_int("retries"), 3);
/// assert_eq!(extras.get_int("missing"), 0);
/// assert_eq!(extras.get_int_or("missing", -1), -1);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bundle {
    map: BTreeMap<String, Extra>,
}

impl Bundle {
    /// Create an empty bundle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether the bundle has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Whether `key` is present, whatever its kind.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    /// Raw access to a value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Extra> {
        self.map.get(key)
    }

    /// Insert or replace a value, returning the previous one.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Extra>) -> Option<Extra> {
        self.map.insert(key.into(), value.into())
    }

    /// Remove a value.
    pub fn remove(&mut self, key: &str) -> Option<Extra> {
        self.map.remove(key)
    }

    /// Keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.map.keys().map(String::as_str)
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Extra)> {
        self.map.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn put_string(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.map.insert(key.into(), Extra::String(value.into()));
    }

    pub fn put_int(&mut self, key: impl Into<String>, value: i32) {
        self.map.insert(key.into(), Extra::Int(value));
    }

    pub fn put_long(&mut self, key: impl Into<String>, value: i64) {
        self.map.insert(key.into(), Extra::Long(value));
    }

    pub fn put_boolean(&mut self, key: impl Into<String>, value: bool) {
        self.map.insert(key.into(), Extra::Boolean(value));
    }

    pub fn put_persistable_bundle(&mut self, key: impl Into<String>, value: PersistableBundle) {
        self.map
            .insert(key.into(), Extra::PersistableBundle(value));
    }

    /// Text value, or `None` if absent or of another kind.
    pub fn get_string(&self, key: &str) -> Option<&str> {
        match self.map.get(key)? {
            Extra::String(s) => Some(s),
            other => {
                type_mismatch(key, "String", other);
                None
            }
        }
    }

    /// 64-bit value, or 0.
    pub fn get_long(&self, key: &str) -> i64 {
        self.get_long_or(key, 0)
    }

    pub fn get_long_or(&self, key: &str, default: i64) -> i64 {
        match self.map.get(key) {
            None => default,
            Some(Extra::Long(v)) => *v,
            Some(other) => {
                type_mismatch(key, "Long", other);
                default
            }
        }
    }

    /// 32-bit value, or 0.
    pub fn get_int(&self, key: &str) -> i32 {
        self.get_int_or(key, 0)
    }

    pub fn get_int_or(&self, key: &str, default: i32) -> i32 {
        match self.map.get(key) {
            None => default,
            Some(Extra::Int(v)) => *v,
            Some(other) => {
                type_mismatch(key, "Integer", other);
                default
            }
        }
    }

    /// Boolean value, or `false`.
    pub fn get_boolean(&self, key: &str) -> bool {
        self.get_boolean_or(key, false)
    }

    pub fn get_boolean_or(&self, key: &str, default: bool) -> bool {
        match self.map.get(key) {
            None => default,
            Some(Extra::Boolean(v)) => *v,
            Some(other) => {
                type_mismatch(key, "Boolean", other);
                default
            }
        }
    }

    /// Structured value, or `None` if absent or of another kind.
    pub fn get_persistable_bundle(&self, key: &str) -> Option<&PersistableBundle> {
        match self.map.get(key)? {
            Extra::PersistableBundle(b) => Some(b),
            other => {
                type_mismatch(key, "PersistableBundle", other);
                None
            }
        }
    }
}

impl<K: Into<String>, V: Into<Extra>> FromIterator<(K, V)> for Bundle {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            map: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

fn type_mismatch(key: &str, expected: &str, found: &Extra) {
    warn!(
        key,
        expected,
        found = found.kind_name(),
        "bundle value has unexpected type, returning default"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_keys_yield_defaults() {
        let b = Bundle::new();
        assert_eq!(b.get_string("s"), None);
        assert_eq!(b.get_long("l"), 0);
        assert_eq!(b.get_int("i"), 0);
        assert!(!b.get_boolean("z"));
        assert!(b.get_persistable_bundle("p").is_none());
    }

    #[test]
    fn mismatched_kind_yields_default() {
        let mut b = Bundle::new();
        b.put_int("n", 42);
        b.put_string("s", "text");

        assert_eq!(b.get_long("n"), 0);
        assert_eq!(b.get_long_or("n", 9), 9);
        assert_eq!(b.get_string("n"), None);
        assert!(!b.get_boolean("s"));
        assert_eq!(b.get_int("n"), 42);
    }

    #[test]
    fn setters_and_collect() {
        let mut nested = PersistableBundle::new();
        nested.insert("k", 1_i32);

        let mut b: Bundle = [("a", Extra::from("x")), ("b", Extra::from(7_i64))]
            .into_iter()
            .collect();
        b.put_boolean("c", true);
        b.put_persistable_bundle("d", nested.clone());

        assert_eq!(b.len(), 4);
        assert_eq!(b.get_string("a"), Some("x"));
        assert_eq!(b.get_long("b"), 7);
        assert!(b.get_boolean("c"));
        assert_eq!(b.get_persistable_bundle("d"), Some(&nested));
        assert_eq!(b.keys().collect::<Vec<_>>(), vec!["a", "b", "c", "d"]);

        assert_eq!(b.remove("a"), Some(Extra::String("x".into())));
        assert!(!b.contains_key("a"));
    }
}
