use std::collections::BTreeMap;

/// A value that can live inside a [`PersistableBundle`].
///
/// Only primitives, primitive arrays and nested bundles are allowed, which is
/// what makes the bundle representable as a self-contained text document.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PersistableValue {
    /// UTF-8 text.
    String(String),
    /// 32-bit signed integer.
    Int(i32),
    /// 64-bit signed integer.
    Long(i64),
    /// 64-bit float.
    Double(f64),
    /// Boolean flag.
    Boolean(bool),
    /// Array of strings.
    StringArray(Vec<String>),
    /// Array of 32-bit integers.
    IntArray(Vec<i32>),
    /// Array of 64-bit integers.
    LongArray(Vec<i64>),
    /// Array of doubles.
    DoubleArray(Vec<f64>),
    /// Array of booleans.
    BooleanArray(Vec<bool>),
    /// A nested bundle.
    Bundle(PersistableBundle),
}

impl PersistableValue {
    /// Short name of the value kind, used in diagnostics.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Int(_) => "int",
            Self::Long(_) => "long",
            Self::Double(_) => "double",
            Self::Boolean(_) => "boolean",
            Self::StringArray(_) => "string-array",
            Self::IntArray(_) => "int-array",
            Self::LongArray(_) => "long-array",
            Self::DoubleArray(_) => "double-array",
            Self::BooleanArray(_) => "boolean-array",
            Self::Bundle(_) => "persistable-bundle",
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for PersistableValue {
                fn from(v: $ty) -> Self {
                    Self::$variant(v)
                }
            }
        )*
    };
}

impl_from! {
    String => String,
    i32 => Int,
    i64 => Long,
    f64 => Double,
    bool => Boolean,
    Vec<String> => StringArray,
    Vec<i32> => IntArray,
    Vec<i64> => LongArray,
    Vec<f64> => DoubleArray,
    Vec<bool> => BooleanArray,
    PersistableBundle => Bundle,
}

impl From<&str> for PersistableValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

/// A nested, typed key-value structure restricted to persistable values.
///
/// Keys are kept sorted so two bundles with the same content compare equal
/// and serialize identically.
///
/// # Example
///
/// ```
/// use intent_kit::PersistableBundle;
///
/// let mut wifi = PersistableBundle::new();
/// wifi.insert("ssid", "corp-guest");
/// wifi.insert("hidden", false);
///
/// let mut admin = PersistableBundle::new();
/// admin.insert("retries", 3_i32);
/// admin.insert("wifi", wifi);
///
/// assert_eq!(admin.get_int("retries"), Some(3));
/// assert_eq!(
///     admin.get_persistable_bundle("wifi").and_then(|w| w.get_string("ssid")),
///     Some("corp-guest"),
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PersistableBundle {
    map: BTreeMap<String, PersistableValue>,
}

impl PersistableBundle {
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
    pub fn get(&self, key: &str) -> Option<&PersistableValue> {
        self.map.get(key)
    }

    /// Insert or replace a value, returning the previous one.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<PersistableValue>,
    ) -> Option<PersistableValue> {
        self.map.insert(key.into(), value.into())
    }

    /// Remove a value.
    pub fn remove(&mut self, key: &str) -> Option<PersistableValue> {
        self.map.remove(key)
    }

    /// Keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.map.keys().map(String::as_str)
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PersistableValue)> {
        self.map.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn get_string(&self, key: &str) -> Option<&str> {
        match self.map.get(key)? {
            PersistableValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn get_int(&self, key: &str) -> Option<i32> {
        match self.map.get(key)? {
            PersistableValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn get_long(&self, key: &str) -> Option<i64> {
        match self.map.get(key)? {
            PersistableValue::Long(v) => Some(*v),
            _ => None,
        }
    }

    pub fn get_double(&self, key: &str) -> Option<f64> {
        match self.map.get(key)? {
            PersistableValue::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn get_boolean(&self, key: &str) -> Option<bool> {
        match self.map.get(key)? {
            PersistableValue::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn get_string_array(&self, key: &str) -> Option<&[String]> {
        match self.map.get(key)? {
            PersistableValue::StringArray(v) => Some(v),
            _ => None,
        }
    }

    pub fn get_int_array(&self, key: &str) -> Option<&[i32]> {
        match self.map.get(key)? {
            PersistableValue::IntArray(v) => Some(v),
            _ => None,
        }
    }

    pub fn get_long_array(&self, key: &str) -> Option<&[i64]> {
        match self.map.get(key)? {
            PersistableValue::LongArray(v) => Some(v),
            _ => None,
        }
    }

    pub fn get_double_array(&self, key: &str) -> Option<&[f64]> {
        match self.map.get(key)? {
            PersistableValue::DoubleArray(v) => Some(v),
            _ => None,
        }
    }

    pub fn get_boolean_array(&self, key: &str) -> Option<&[bool]> {
        match self.map.get(key)? {
            PersistableValue::BooleanArray(v) => Some(v),
            _ => None,
        }
    }

    pub fn get_persistable_bundle(&self, key: &str) -> Option<&PersistableBundle> {
        match self.map.get(key)? {
            PersistableValue::Bundle(b) => Some(b),
            _ => None,
        }
    }
}

impl<K: Into<String>, V: Into<PersistableValue>> FromIterator<(K, V)> for PersistableBundle {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            map: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
