use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Name of the sentinel entry marking a namespace as holding saved data.
///
/// Reserved: no field may be declared under this name.
pub const IS_SET_KEY: &str = "isSet";

/// Kind of a declared field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// UTF-8 text, stored verbatim.
    Text,
    /// 64-bit signed integer.
    Long,
    /// 32-bit signed integer.
    Int,
    /// Boolean flag.
    Boolean,
    /// A [`PersistableBundle`](intent_kit::PersistableBundle), stored as XML text.
    Blob,
}

impl FieldKind {
    /// Every kind, in the order fields are saved and loaded.
    pub const ALL: [FieldKind; 5] = [
        FieldKind::Text,
        FieldKind::Long,
        FieldKind::Int,
        FieldKind::Boolean,
        FieldKind::Blob,
    ];

    /// Lowercase name, as used in schema files.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Long => "long",
            Self::Int => "int",
            Self::Boolean => "boolean",
            Self::Blob => "blob",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejected field declaration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    /// The name is already declared under a different kind.
    #[error("field `{key}` is already declared as {existing}, cannot redeclare as {requested}")]
    KindConflict {
        key: String,
        existing: FieldKind,
        requested: FieldKind,
    },
    /// The name collides with the sentinel entry.
    #[error("field name `{0}` is reserved")]
    ReservedKey(String),
    /// An empty field name.
    #[error("empty field name in {0} list")]
    EmptyKey(FieldKind),
}

/// Declared fields of a store: a map from field name to [`FieldKind`].
///
/// Every name has exactly one kind. Within a kind, names keep the order in
/// which they were declared.
///
/// ```
/// use intent_store::{FieldKind, FieldSchema, SchemaError};
///
/// let mut schema = FieldSchema::new();
/// schema.set_keys(FieldKind::Text, ["org", "ssid"]).unwrap();
/// schema.set_keys(FieldKind::Int, ["retries"]).unwrap();
///
/// assert_eq!(schema.kind_of("ssid"), Some(FieldKind::Text));
/// assert!(matches!(
///     schema.set_keys(FieldKind::Long, ["org"]),
///     Err(SchemaError::KindConflict { .. })
/// ));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSchema {
    kinds: BTreeMap<String, FieldKind>,
    order: [Vec<String>; 5],
}

impl FieldSchema {
    /// A schema with no declared fields.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the list of fields declared under `kind`.
    ///
    /// Every name is checked before anything changes: on error the schema is
    /// left as it was. Repeating a name within `keys` declares it once.
    pub fn set_keys<I, K>(&mut self, kind: FieldKind, keys: I) -> Result<(), SchemaError>
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        let mut list: Vec<String> = Vec::new();
        for key in keys {
            let key = key.into();
            if key.is_empty() {
                return Err(SchemaError::EmptyKey(kind));
            }
            if key == IS_SET_KEY {
                return Err(SchemaError::ReservedKey(key));
            }
            if let Some(&existing) = self.kinds.get(&key) {
                if existing != kind {
                    return Err(SchemaError::KindConflict {
                        key,
                        existing,
                        requested: kind,
                    });
                }
            }
            if !list.contains(&key) {
                list.push(key);
            }
        }

        for old in std::mem::take(&mut self.order[kind.index()]) {
            self.kinds.remove(&old);
        }
        for key in &list {
            self.kinds.insert(key.clone(), kind);
        }
        self.order[kind.index()] = list;
        Ok(())
    }

    /// Kind a field is declared under, if any.
    #[must_use]
    pub fn kind_of(&self, key: &str) -> Option<FieldKind> {
        self.kinds.get(key).copied()
    }

    /// Names declared under `kind`, in declaration order.
    #[must_use]
    pub fn keys(&self, kind: FieldKind) -> &[String] {
        &self.order[kind.index()]
    }

    /// All declared fields: kinds in [`FieldKind::ALL`] order, names in
    /// declaration order within a kind.
    pub fn iter(&self) -> impl Iterator<Item = (&str, FieldKind)> + '_ {
        FieldKind::ALL.into_iter().flat_map(move |kind| {
            self.order[kind.index()]
                .iter()
                .map(move |key| (key.as_str(), kind))
        })
    }

    /// Number of declared fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}
