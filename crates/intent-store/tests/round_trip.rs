//! Save/load behavior of `IntentStore`, checked against every backend.
//!
//! Each scenario is written once against `PrefStore` and instantiated per
//! backend at the bottom of the file.

use intent_kit::{xml, Bundle, ComponentName, PersistableBundle};
use intent_store::{IntentStore, MemoryStore, PrefStore, PrefValue, SchemaError, IS_SET_KEY};

const NS: &str = "resume_prefs";

fn target() -> ComponentName {
    ComponentName::new("com.example.provisioning", "com.example.provisioning.Resume")
}

fn full_store<S: PrefStore>(backend: S) -> IntentStore<S> {
    IntentStore::new(backend, target(), NS)
        .with_text_keys(["org", "ssid"])
        .unwrap()
        .with_long_keys(["deadline"])
        .unwrap()
        .with_int_keys(["retries"])
        .unwrap()
        .with_boolean_keys(["skip_encryption"])
        .unwrap()
        .with_blob_keys(["admin_extras"])
        .unwrap()
}

fn admin_extras() -> PersistableBundle {
    let mut wifi = PersistableBundle::new();
    wifi.insert("hidden", true);
    wifi.insert("channels", vec![1_i32, 6, 11]);

    let mut admin = PersistableBundle::new();
    admin.insert("wifi", wifi);
    admin.insert("owner", "Ops <ops@example.com>");
    admin.insert("quota", 2.5);
    admin
}

// ── Scenarios ───────────────────────────────────────────────────────

fn present_fields_round_trip<S: PrefStore>(backend: S) {
    let mut store = full_store(backend);
    let mut extras = Bundle::new();
    extras.put_string("org", "Example Corp");
    extras.put_string("ssid", "");
    extras.put_long("deadline", i64::MAX);
    extras.put_int("retries", -3);
    extras.put_boolean("skip_encryption", true);
    store.save(&extras).unwrap();

    let intent = store.load().unwrap().unwrap();
    assert_eq!(intent.get_string_extra("org"), Some("Example Corp"));
    assert_eq!(intent.get_string_extra("ssid"), Some(""));
    assert_eq!(intent.get_long_extra("deadline", 0), i64::MAX);
    assert_eq!(intent.get_int_extra("retries", 0), -3);
    assert!(intent.get_boolean_extra("skip_encryption", false));
    assert!(!intent.has_extra("admin_extras"));
}

fn unsaved_and_cleared_are_empty<S: PrefStore>(backend: S) {
    let mut store = full_store(backend);
    assert!(store.load().unwrap().is_none());

    store.save(&Bundle::new()).unwrap();
    assert!(store.load().unwrap().is_some());

    store.clear().unwrap();
    assert!(store.load().unwrap().is_none());
    assert!(store.store().get(NS, IS_SET_KEY).unwrap().is_none());
}

fn nested_blob_round_trips<S: PrefStore>(backend: S) {
    let mut store = full_store(backend);
    let admin = admin_extras();
    let mut extras = Bundle::new();
    extras.put_persistable_bundle("admin_extras", admin.clone());
    store.save(&extras).unwrap();

    let intent = store.load().unwrap().unwrap();
    let restored = intent.get_persistable_bundle_extra("admin_extras").unwrap();
    assert_eq!(restored, &admin);
    assert_eq!(
        restored
            .get_persistable_bundle("wifi")
            .and_then(|w| w.get_boolean("hidden")),
        Some(true)
    );
}

fn foreign_blob_text_is_dropped<S: PrefStore>(backend: S) {
    let mut store = full_store(backend);
    let mut extras = Bundle::new();
    extras.put_string("org", "kept");
    extras.put_persistable_bundle("admin_extras", admin_extras());
    store.save(&extras).unwrap();

    let mut edit = intent_store::PrefEdit::new();
    edit.put_string("admin_extras", "<?xml version='1.0'?><bundle></bundle>");
    store.store_mut().commit(NS, edit).unwrap();

    let intent = store.load().unwrap().unwrap();
    assert!(!intent.has_extra("admin_extras"));
    assert_eq!(intent.get_string_extra("org"), Some("kept"));
}

fn second_save_replaces_first<S: PrefStore>(backend: S) {
    let mut store = full_store(backend);
    let mut first = Bundle::new();
    first.put_string("org", "First");
    first.put_string("ssid", "first-net");
    first.put_persistable_bundle("admin_extras", admin_extras());
    store.save(&first).unwrap();

    let mut second = Bundle::new();
    second.put_string("org", "Second");
    store.save(&second).unwrap();

    let intent = store.load().unwrap().unwrap();
    assert_eq!(intent.get_string_extra("org"), Some("Second"));
    assert!(!intent.has_extra("ssid"));
    assert!(!intent.has_extra("admin_extras"));
}

fn two_field_scenario<S: PrefStore>(backend: S) {
    let mut store = IntentStore::new(backend, target(), NS)
        .with_text_keys(["a"])
        .unwrap()
        .with_int_keys(["b"])
        .unwrap();

    let mut extras = Bundle::new();
    extras.put_string("a", "hello");
    extras.put_int("b", 42);
    store.save(&extras).unwrap();

    let intent = store.load().unwrap().unwrap();
    assert_eq!(intent.get_string_extra("a"), Some("hello"));
    assert_eq!(intent.get_int_extra("b", 0), 42);
    assert_eq!(intent.component(), Some(&target()));

    store.clear().unwrap();
    assert!(store.load().unwrap().is_none());
}

/// Absent numeric and boolean fields are written as defaults on save, and
/// load then reports them as present.
fn absent_primitives_come_back_as_defaults<S: PrefStore>(backend: S) {
    let mut store = full_store(backend);
    store.save(&Bundle::new()).unwrap();

    assert_eq!(
        store.store().get(NS, "retries").unwrap(),
        Some(PrefValue::Int(0))
    );
    assert!(store.store().get(NS, "org").unwrap().is_none());

    let intent = store.load().unwrap().unwrap();
    assert!(intent.has_extra("deadline"));
    assert!(intent.has_extra("retries"));
    assert!(intent.has_extra("skip_encryption"));
    assert_eq!(intent.get_long_extra("deadline", -1), 0);
    assert_eq!(intent.get_int_extra("retries", -1), 0);
    assert!(!intent.get_boolean_extra("skip_encryption", true));
    assert!(!intent.has_extra("org"));
}

fn namespaces_are_isolated<S: PrefStore>(backend: S) {
    let mut a = full_store(backend);
    let mut extras = Bundle::new();
    extras.put_string("org", "A");
    a.save(&extras).unwrap();

    let backend = a.into_store();
    let mut b = IntentStore::new(backend, target(), "other")
        .with_text_keys(["org"])
        .unwrap();
    assert!(b.load().unwrap().is_none());

    extras.put_string("org", "B");
    b.save(&extras).unwrap();
    b.clear().unwrap();

    let a = IntentStore::new(b.into_store(), target(), NS)
        .with_text_keys(["org"])
        .unwrap();
    let intent = a.load().unwrap().unwrap();
    assert_eq!(intent.get_string_extra("org"), Some("A"));
}

fn load_is_idempotent<S: PrefStore>(backend: S) {
    let mut store = full_store(backend);
    let mut extras = Bundle::new();
    extras.put_persistable_bundle("admin_extras", admin_extras());
    extras.put_int("retries", 7);
    store.save(&extras).unwrap();

    let first = store.load().unwrap();
    let second = store.load().unwrap();
    assert_eq!(first, second);
}

macro_rules! backend_tests {
    ($module:ident, $open:expr) => {
        mod $module {
            #[test]
            fn present_fields_round_trip() {
                super::present_fields_round_trip($open);
            }

            #[test]
            fn unsaved_and_cleared_are_empty() {
                super::unsaved_and_cleared_are_empty($open);
            }

            #[test]
            fn nested_blob_round_trips() {
                super::nested_blob_round_trips($open);
            }

            #[test]
            fn foreign_blob_text_is_dropped() {
                super::foreign_blob_text_is_dropped($open);
            }

            #[test]
            fn second_save_replaces_first() {
                super::second_save_replaces_first($open);
            }

            #[test]
            fn two_field_scenario() {
                super::two_field_scenario($open);
            }

            #[test]
            fn absent_primitives_come_back_as_defaults() {
                super::absent_primitives_come_back_as_defaults($open);
            }

            #[test]
            fn namespaces_are_isolated() {
                super::namespaces_are_isolated($open);
            }

            #[test]
            fn load_is_idempotent() {
                super::load_is_idempotent($open);
            }
        }
    };
}

backend_tests!(memory, intent_store::MemoryStore::new());

#[cfg(feature = "sqlite")]
backend_tests!(sqlite, intent_store::SqliteStore::open_in_memory().unwrap());

#[cfg(feature = "redb")]
backend_tests!(redb, intent_store::RedbStore::open_in_memory().unwrap());

// ── Backend-independent checks ──────────────────────────────────────

#[test]
fn wrapper_mismatch_is_an_error_value() {
    let err = xml::from_xml_str("<?xml version='1.0'?><other/>").unwrap_err();
    assert!(matches!(err, intent_kit::XmlError::MissingWrapper { .. }));
    assert!(xml::from_xml_str("").is_err());
    assert!(xml::from_xml_str("not xml at all").is_err());
}

#[test]
fn sentinel_and_cross_kind_declarations_are_rejected() {
    let err = IntentStore::new(MemoryStore::new(), target(), NS)
        .with_boolean_keys([IS_SET_KEY])
        .err();
    assert_eq!(err, Some(SchemaError::ReservedKey(IS_SET_KEY.to_string())));

    let err = IntentStore::new(MemoryStore::new(), target(), NS)
        .with_text_keys(["x"])
        .unwrap()
        .with_blob_keys(["x"])
        .err();
    assert!(matches!(err, Some(SchemaError::KindConflict { .. })));
}

#[cfg(feature = "sqlite")]
#[test]
fn saved_fields_survive_reopen() {
    use intent_store::SqliteStore;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("prefs.db");

    let mut store = full_store(SqliteStore::open(&path).unwrap());
    let mut extras = Bundle::new();
    extras.put_string("org", "Durable");
    extras.put_persistable_bundle("admin_extras", admin_extras());
    store.save(&extras).unwrap();
    store.into_store().close().unwrap();

    let store = full_store(SqliteStore::open(&path).unwrap());
    let intent = store.load().unwrap().unwrap();
    assert_eq!(intent.get_string_extra("org"), Some("Durable"));
    assert_eq!(
        intent.get_persistable_bundle_extra("admin_extras"),
        Some(&admin_extras())
    );
}

#[cfg(feature = "redb")]
#[test]
fn redb_fields_survive_reopen() {
    use intent_store::RedbStore;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("prefs.redb");

    let mut store = full_store(RedbStore::open(&path).unwrap());
    let mut extras = Bundle::new();
    extras.put_long("deadline", 99);
    store.save(&extras).unwrap();
    store.into_store().close();

    let store = full_store(RedbStore::open(&path).unwrap());
    let intent = store.load().unwrap().unwrap();
    assert_eq!(intent.get_long_extra("deadline", 0), 99);
}
