//! # Resume Provisioning: Save wizard state, crash, resume
//!
//! A setup wizard persists its progress before a reboot, then a fresh
//! process reopens the same SQLite file and rebuilds the record that
//! restarts the flow at the right screen.
//!
//! Run: `cargo run -p intent-store --example resume_provisioning`

use intent_kit::{Bundle, ComponentName, PersistableBundle};
use intent_store::{IntentStore, SqliteStore};

const NAMESPACE: &str = "provisioning_resume";

fn open(path: &std::path::Path) -> IntentStore<SqliteStore> {
    let target = ComponentName::new(
        "com.example.provisioning",
        "com.example.provisioning.ResumeActivity",
    );
    IntentStore::new(SqliteStore::open(path).unwrap(), target, NAMESPACE)
        .with_text_keys(["org_name", "wifi_ssid"])
        .unwrap()
        .with_long_keys(["deadline_ms"])
        .unwrap()
        .with_int_keys(["step"])
        .unwrap()
        .with_boolean_keys(["skip_encryption"])
        .unwrap()
        .with_blob_keys(["admin_extras"])
        .unwrap()
}

fn main() {
    println!("=== Resume Provisioning Example ===\n");

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("prefs.db");

    // ── Step 1: first boot, save progress ───────────────────────────
    println!("1. Wizard reaches step 3 and saves its state...");

    let mut admin = PersistableBundle::new();
    admin.insert("policy", "kiosk");
    admin.insert("allowed_ports", vec![443_i32, 8443]);
    let mut proxy = PersistableBundle::new();
    proxy.insert("host", "proxy.example.com");
    proxy.insert("port", 3128_i32);
    admin.insert("proxy", proxy);

    let mut extras = Bundle::new();
    extras.put_string("org_name", "Example Corp");
    extras.put_string("wifi_ssid", "corp-guest");
    extras.put_long("deadline_ms", 1_700_000_000_000);
    extras.put_int("step", 3);
    extras.put_persistable_bundle("admin_extras", admin);
    // skip_encryption is left out on purpose: it is stored as `false`.

    let mut store = open(&path);
    store.save(&extras).unwrap();
    println!("   saved namespace `{}`", store.namespace());
    store.into_store().close().unwrap();

    // ── Step 2: after reboot, resume ────────────────────────────────
    println!("\n2. New process reopens the database...");

    let store = open(&path);
    match store.load().unwrap() {
        Some(intent) => {
            println!("   resume target: {}", intent.component().unwrap());
            for (key, value) in intent.extras().iter() {
                println!("   {key:<16} = {value:?}");
            }
        }
        None => println!("   nothing to resume"),
    }

    // ── Step 3: provisioning finished, forget the state ─────────────
    println!("\n3. Provisioning completes; clearing saved state...");
    let mut store = store;
    store.clear().unwrap();
    println!("   load after clear: {:?}", store.load().unwrap());

    println!("\n=== Done ===");
}
