//! Typed field persistence between records and a preference namespace.
//!
//! [`IntentStore`] copies a declared set of fields out of a [`Bundle`] into
//! one namespace of a [`PrefStore`], and later rebuilds an [`Intent`] from
//! what was saved.
//!
//! # Example
//!
//! ```
//! use intent_kit::{Bundle, ComponentName, PersistableBundle};
//! use intent_store::{IntentStore, MemoryStore};
//!
//! let target = ComponentName::new("com.example.setup", "com.example.setup.Resume");
//! let mut store = IntentStore::new(MemoryStore::new(), target, "resume")
//!     .with_text_keys(["org"]).unwrap()
//!     .with_int_keys(["retries"]).unwrap()
//!     .with_blob_keys(["admin"]).unwrap();
//!
//! let mut admin = PersistableBundle::new();
//! admin.insert("wifi", true);
//!
//! let mut extras = Bundle::new();
//! extras.put_string("org", "Example Corp");
//! extras.put_persistable_bundle("admin", admin.clone());
//! store.save(&extras).unwrap();
//!
//! let intent = store.load().unwrap().unwrap();
//! assert_eq!(intent.get_string_extra("org"), Some("Example Corp"));
//! // Absent numeric fields are saved as their default.
//! assert_eq!(intent.get_int_extra("retries", -1), 0);
//! assert_eq!(intent.get_persistable_bundle_extra("admin"), Some(&admin));
//! ```

use std::collections::BTreeMap;

use intent_kit::{xml, Bundle, ComponentName, Intent};
use tracing::{debug, error, warn};

use crate::edit::PrefEdit;
use crate::schema::{FieldKind, FieldSchema, SchemaError, IS_SET_KEY};
use crate::schema_file::{validate_schema, SchemaFile, SchemaFileError, ValidationError};
use crate::traits::{PrefStore, PrefValue};

/// Saves declared fields of a [`Bundle`] to one namespace of a backing
/// store and loads them back as an [`Intent`] aimed at a fixed target.
///
/// A successful [`save`](Self::save) also writes the `isSet` marker;
/// [`load`](Self::load) returns `None` until the marker is present and true.
pub struct IntentStore<S: PrefStore> {
    store: S,
    target: ComponentName,
    namespace: String,
    schema: FieldSchema,
}

impl<S: PrefStore> IntentStore<S> {
    /// A store with no declared fields.
    pub fn new(store: S, target: ComponentName, namespace: impl Into<String>) -> Self {
        Self {
            store,
            target,
            namespace: namespace.into(),
            schema: FieldSchema::new(),
        }
    }

    /// Configure a store from a validated schema file.
    pub fn from_schema(store: S, file: &SchemaFile) -> Result<Self, SchemaFileError> {
        validate_schema(file).map_err(SchemaFileError::Validation)?;
        let target = file.target().ok_or_else(|| {
            SchemaFileError::Validation(vec![ValidationError {
                kind: None,
                field: None,
                message: format!("store.target `{}` is not a component name", file.store.target),
            }])
        })?;
        let schema = file.field_schema()?;
        Ok(Self::new(store, target, file.store.name.clone()).with_schema(schema))
    }

    /// Use `schema` as the complete set of declared fields.
    ///
    /// Build the [`FieldSchema`] first when declarations may be rejected:
    /// the `with_*_keys` builders consume `self`, so an error from them
    /// drops the backing store along with this wrapper.
    #[must_use]
    pub fn with_schema(mut self, schema: FieldSchema) -> Self {
        self.schema = schema;
        self
    }

    /// Declare the text fields, replacing any earlier text list.
    ///
    /// On error the wrapper and its backing store are dropped; see
    /// [`with_schema`](Self::with_schema) to validate without losing the store.
    pub fn with_text_keys<I, K>(self, keys: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        self.with_keys(FieldKind::Text, keys)
    }

    /// Declare the 64-bit integer fields.
    pub fn with_long_keys<I, K>(self, keys: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        self.with_keys(FieldKind::Long, keys)
    }

    /// Declare the 32-bit integer fields.
    pub fn with_int_keys<I, K>(self, keys: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        self.with_keys(FieldKind::Int, keys)
    }

    /// Declare the boolean fields.
    pub fn with_boolean_keys<I, K>(self, keys: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        self.with_keys(FieldKind::Boolean, keys)
    }

    /// Declare the structured fields, stored as XML text.
    pub fn with_blob_keys<I, K>(self, keys: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        self.with_keys(FieldKind::Blob, keys)
    }

    fn with_keys<I, K>(mut self, kind: FieldKind, keys: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        self.schema.set_keys(kind, keys)?;
        Ok(self)
    }

    #[must_use]
    pub fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Component every loaded [`Intent`] is addressed to.
    #[must_use]
    pub fn target(&self) -> &ComponentName {
        &self.target
    }

    /// Get a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Get a mutable reference to the underlying store.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Consume this wrapper and return the underlying store.
    pub fn into_store(self) -> S {
        self.store
    }

    /// Whether the namespace currently holds saved data.
    pub fn is_set(&self) -> Result<bool, S::Error> {
        let marker = self.store.get(&self.namespace, IS_SET_KEY)?;
        Ok(matches!(marker, Some(PrefValue::Boolean(true))))
    }

    /// Erase every entry of the namespace, the marker included.
    pub fn clear(&mut self) -> Result<(), S::Error> {
        let mut edit = PrefEdit::new();
        edit.clear();
        self.store.commit(&self.namespace, edit)?;
        debug!(namespace = %self.namespace, "cleared saved fields");
        Ok(())
    }

    /// Replace the namespace's contents with the declared fields of `extras`.
    ///
    /// Text fields missing from `extras` are not written. Long, int and
    /// boolean fields are always written, as `0`/`false` when missing, so a
    /// later [`load`](Self::load) reports them as present. A structured
    /// field that is missing or fails to serialize is skipped and logged.
    /// The whole save is a single commit.
    pub fn save(&mut self, extras: &Bundle) -> Result<(), S::Error> {
        let mut edit = PrefEdit::new();
        edit.clear();

        let mut skipped = 0usize;
        for (key, kind) in self.schema.iter() {
            match kind {
                FieldKind::Text => match extras.get_string(key) {
                    Some(text) => {
                        edit.put_string(key, text);
                    }
                    None => skipped += 1,
                },
                FieldKind::Long => {
                    edit.put_long(key, extras.get_long(key));
                }
                FieldKind::Int => {
                    edit.put_int(key, extras.get_int(key));
                }
                FieldKind::Boolean => {
                    edit.put_boolean(key, extras.get_boolean(key));
                }
                FieldKind::Blob => {
                    let Some(bundle) = extras.get_persistable_bundle(key) else {
                        skipped += 1;
                        continue;
                    };
                    match xml::to_xml_string(bundle) {
                        Ok(text) => {
                            edit.put_string(key, text);
                        }
                        Err(e) => {
                            error!(key, error = %e, "failed to serialize persistable bundle");
                            skipped += 1;
                        }
                    }
                }
            }
        }
        edit.put_boolean(IS_SET_KEY, true);

        self.store.commit(&self.namespace, edit)?;
        debug!(
            namespace = %self.namespace,
            fields = self.schema.len() - skipped,
            skipped,
            "saved fields"
        );
        Ok(())
    }

    /// Rebuild the saved record, or `None` if nothing was saved.
    ///
    /// Every declared field present in the namespace is copied into the
    /// returned [`Intent`]'s extras. A structured field whose text does not
    /// parse is left out and logged. Reading never modifies the store.
    pub fn load(&self) -> Result<Option<Intent>, S::Error> {
        let entries: BTreeMap<String, PrefValue> =
            self.store.entries(&self.namespace)?.into_iter().collect();

        match entries.get(IS_SET_KEY) {
            Some(PrefValue::Boolean(true)) => {}
            Some(PrefValue::Boolean(false)) | None => {
                debug!(namespace = %self.namespace, "no saved fields");
                return Ok(None);
            }
            Some(other) => {
                warn!(
                    namespace = %self.namespace,
                    found = other.kind_name(),
                    "saved-data marker is not a boolean"
                );
                return Ok(None);
            }
        }

        let mut intent = Intent::new().with_component(self.target.clone());
        for (key, kind) in self.schema.iter() {
            let Some(value) = entries.get(key) else {
                continue;
            };
            match (kind, value) {
                (FieldKind::Text, PrefValue::String(text)) => intent.put_extra(key, text.as_str()),
                (FieldKind::Long, PrefValue::Long(v)) => intent.put_extra(key, *v),
                (FieldKind::Int, PrefValue::Int(v)) => intent.put_extra(key, *v),
                (FieldKind::Boolean, PrefValue::Boolean(v)) => intent.put_extra(key, *v),
                (FieldKind::Blob, PrefValue::String(text)) => match xml::from_xml_str(text) {
                    Ok(bundle) => intent.put_extra(key, bundle),
                    Err(e) => {
                        error!(key, error = %e, "failed to restore persistable bundle");
                    }
                },
                (kind, other) => {
                    warn!(
                        key,
                        expected = %kind,
                        found = other.kind_name(),
                        "stored value has the wrong kind"
                    );
                }
            }
        }

        debug!(
            namespace = %self.namespace,
            fields = intent.extras().len(),
            "loaded fields"
        );
        Ok(Some(intent))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;
    use intent_kit::PersistableBundle;

    fn target() -> ComponentName {
        ComponentName::new("com.example.setup", "com.example.setup.Resume")
    }

    fn store() -> IntentStore<MemoryStore> {
        IntentStore::new(MemoryStore::new(), target(), "resume")
    }

    #[test]
    fn load_before_save_is_none() {
        let store = store().with_text_keys(["a"]).unwrap();
        assert!(store.load().unwrap().is_none());
        assert!(!store.is_set().unwrap());
    }

    #[test]
    fn save_writes_marker_and_defaults() {
        let mut store = store()
            .with_text_keys(["name"])
            .unwrap()
            .with_long_keys(["deadline"])
            .unwrap()
            .with_boolean_keys(["skip"])
            .unwrap();
        store.save(&Bundle::new()).unwrap();

        let raw = store.store().entries("resume").unwrap();
        assert_eq!(
            raw,
            vec![
                ("deadline".to_string(), PrefValue::Long(0)),
                ("isSet".to_string(), PrefValue::Boolean(true)),
                ("skip".to_string(), PrefValue::Boolean(false)),
            ]
        );
        assert!(store.is_set().unwrap());
    }

    #[test]
    fn loaded_intent_targets_component() {
        let mut store = store().with_int_keys(["n"]).unwrap();
        let mut extras = Bundle::new();
        extras.put_int("n", 5);
        store.save(&extras).unwrap();

        let intent = store.load().unwrap().unwrap();
        assert_eq!(intent.component(), Some(&target()));
        assert_eq!(intent.get_int_extra("n", 0), 5);
    }

    #[test]
    fn undeclared_extras_are_not_saved() {
        let mut store = store().with_text_keys(["kept"]).unwrap();
        let mut extras = Bundle::new();
        extras.put_string("kept", "yes");
        extras.put_string("dropped", "no");
        store.save(&extras).unwrap();

        let intent = store.load().unwrap().unwrap();
        assert!(intent.has_extra("kept"));
        assert!(!intent.has_extra("dropped"));
    }

    #[test]
    fn mismatched_extra_falls_back() {
        let mut store = store()
            .with_text_keys(["t"])
            .unwrap()
            .with_int_keys(["i"])
            .unwrap();
        let mut extras = Bundle::new();
        extras.put_int("t", 1);
        extras.put_string("i", "oops");
        store.save(&extras).unwrap();

        let intent = store.load().unwrap().unwrap();
        assert!(!intent.has_extra("t"));
        assert_eq!(intent.get_int_extra("i", -1), 0);
    }

    #[test]
    fn wrong_kind_in_store_is_skipped() {
        let mut store = store().with_long_keys(["n"]).unwrap();
        let mut edit = PrefEdit::new();
        edit.put_boolean(IS_SET_KEY, true).put_int("n", 3);
        store.store_mut().commit("resume", edit).unwrap();

        let intent = store.load().unwrap().unwrap();
        assert!(!intent.has_extra("n"));
    }

    #[test]
    fn non_boolean_marker_means_unset() {
        let store = store();
        let mut inner = store.into_store();
        let mut edit = PrefEdit::new();
        edit.put_string(IS_SET_KEY, "true");
        inner.commit("resume", edit).unwrap();

        let store = IntentStore::new(inner, target(), "resume");
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn false_marker_means_unset() {
        let mut store = store().with_int_keys(["n"]).unwrap();
        let mut edit = PrefEdit::new();
        edit.put_int("n", 7).put_boolean(IS_SET_KEY, false);
        store.store_mut().commit("resume", edit).unwrap();

        assert!(!store.is_set().unwrap());
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn rejected_schema_keeps_store_usable() {
        let mut backend = MemoryStore::new();
        let mut edit = PrefEdit::new();
        edit.put_boolean(IS_SET_KEY, true).put_string("org", "kept");
        backend.commit("resume", edit).unwrap();

        let mut schema = FieldSchema::new();
        schema.set_keys(FieldKind::Text, ["org"]).unwrap();
        let err = schema.set_keys(FieldKind::Int, ["org"]).unwrap_err();
        assert!(matches!(err, SchemaError::KindConflict { .. }));

        let store = IntentStore::new(backend, target(), "resume").with_schema(schema);
        let intent = store.load().unwrap().unwrap();
        assert_eq!(intent.get_string_extra("org"), Some("kept"));
    }

    #[test]
    fn clear_erases_marker() {
        let mut store = store().with_boolean_keys(["b"]).unwrap();
        store.save(&Bundle::new()).unwrap();
        store.clear().unwrap();

        assert!(store.load().unwrap().is_none());
        assert!(store.store().list_keys("resume").unwrap().is_empty());
    }

    #[test]
    fn blob_roundtrip_and_corruption() {
        let mut store = store().with_blob_keys(["good", "bad"]).unwrap();
        let mut nested = PersistableBundle::new();
        nested.insert("depth", 2_i32);
        let mut good = PersistableBundle::new();
        good.insert("inner", nested);
        good.insert("label", "x < y & z");

        let mut extras = Bundle::new();
        extras.put_persistable_bundle("good", good.clone());
        extras.put_persistable_bundle("bad", PersistableBundle::new());
        store.save(&extras).unwrap();

        let mut edit = PrefEdit::new();
        edit.put_string("bad", "<not-a-bundle/>");
        store.store_mut().commit("resume", edit).unwrap();

        let intent = store.load().unwrap().unwrap();
        assert_eq!(intent.get_persistable_bundle_extra("good"), Some(&good));
        assert!(!intent.has_extra("bad"));
    }

    #[test]
    fn from_schema_file() {
        let file = SchemaFile::from_toml_str(
            r#"
[store]
name = "wizard"
target = "com.example.setup/.Resume"

[fields]
text = ["org"]
int = ["retries"]
"#,
        )
        .unwrap();

        let store = IntentStore::from_schema(MemoryStore::new(), &file).unwrap();
        assert_eq!(store.namespace(), "wizard");
        assert_eq!(store.target(), &target());
        assert_eq!(store.schema().kind_of("retries"), Some(FieldKind::Int));
    }
}
