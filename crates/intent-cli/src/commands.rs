use console::style;
use intent_kit::{xml, Bundle, Extra, PersistableBundle};
use intent_store::{
    FieldKind, IntentStore, PrefStore, PrefValue, SchemaFile, SqliteStore, IS_SET_KEY,
};
use serde_json::{json, Value};

type Result = std::result::Result<(), Box<dyn std::error::Error>>;

/// `intent-store status <db>`: Show database status and statistics.
pub fn status(db_path: &str) -> Result {
    let store = SqliteStore::open(db_path)?;
    let info = store.db_info()?;
    let size = store.file_size()?;
    let journal = store.journal_mode()?;

    println!("Database: {db_path} (SQLite, {journal} mode)");
    println!("Size: {}", format_bytes(size));
    println!();

    if info.namespaces.is_empty() {
        println!("  (empty database)");
        return Ok(());
    }

    println!(
        "  {}",
        style(format!(
            "{:<28} {:>8} {:>6}  {:<20}",
            "Namespace", "Entries", "Set", "Updated"
        ))
        .bold()
    );
    println!("  {}", "-".repeat(66));

    for ns in &info.namespaces {
        let set = match store.get(&ns.name, IS_SET_KEY)? {
            Some(PrefValue::Boolean(true)) => style("yes").green(),
            _ => style("no").dim(),
        };
        let updated = store
            .last_updated(&ns.name)?
            .map(format_timestamp)
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:<28} {:>8} {:>6}  {:<20}",
            truncate(&ns.name, 28),
            format_num(ns.entry_count),
            set,
            updated,
        );
    }

    println!("  {}", "-".repeat(66));
    println!("  {:<28} {:>8}", "Total", format_num(info.total_entries));
    println!();

    Ok(())
}

/// `intent-store inspect <db> [key]`: List entries or show one in detail.
pub fn inspect(db_path: &str, key: Option<&str>, namespace: Option<&str>) -> Result {
    let store = SqliteStore::open(db_path)?;

    match key {
        Some(key) => inspect_entry(&store, key, namespace),
        None => inspect_list(&store, namespace),
    }
}

fn inspect_entry(store: &SqliteStore, key: &str, namespace: Option<&str>) -> Result {
    for ns in &namespaces(store, namespace)? {
        if let Some(value) = store.get(ns, key)? {
            println!("Key: {key}");
            println!("Namespace: {ns}");
            println!("Kind: {}", value.kind_name());

            match &value {
                PrefValue::String(text) => match xml::from_xml_str(text) {
                    Ok(bundle) => {
                        println!("Blob: {} entries", bundle.len());
                        println!(
                            "{}",
                            serde_json::to_string_pretty(&persistable_json(&bundle))?
                        );
                    }
                    Err(_) => println!("Value: {value}"),
                },
                _ => println!("Value: {value}"),
            }
            println!();
            return Ok(());
        }
    }

    eprintln!("Key '{key}' not found");
    Ok(())
}

fn inspect_list(store: &SqliteStore, namespace: Option<&str>) -> Result {
    let names = namespaces(store, namespace)?;

    if names.is_empty() {
        println!("  (empty database)");
        return Ok(());
    }

    for ns in &names {
        let entries = store.entries(ns)?;
        println!(
            "{} ({} entries)",
            style(format!("Namespace: {ns}")).bold(),
            entries.len()
        );

        for (key, value) in &entries {
            let shown = match value {
                PrefValue::String(text) if xml::from_xml_str(text).is_ok() => {
                    format!("<blob, {} bytes>", text.len())
                }
                other => truncate(&other.to_string(), 40),
            };
            println!("  {key:<32} {:<8} {shown}", value.kind_name());
        }
        println!();
    }

    Ok(())
}

/// `intent-store export <db>`: Export entries as JSON.
pub fn export(db_path: &str, namespace: Option<&str>) -> Result {
    let store = SqliteStore::open(db_path)?;
    let info = store.db_info()?;
    let mut exported = serde_json::Map::new();

    for ns in &namespaces(&store, namespace)? {
        let mut fields = serde_json::Map::new();
        for (key, value) in store.entries(ns)? {
            fields.insert(key, pref_json(&value));
        }
        exported.insert(ns.clone(), Value::Object(fields));
    }

    let output = json!({
        "database": {
            "path": db_path,
            "total_entries": info.total_entries,
        },
        "namespaces": exported,
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// `intent-store save <db> -s schema.toml KEY=VALUE...`: Save fields.
pub fn save(db_path: &str, schema_path: &str, values: &[String]) -> Result {
    let file = SchemaFile::load(schema_path)?;
    let mut store = IntentStore::from_schema(SqliteStore::open(db_path)?, &file)?;

    let mut extras = Bundle::new();
    for assignment in values {
        let (key, raw) = split_assignment(assignment)?;
        let kind = store
            .schema()
            .kind_of(key)
            .ok_or_else(|| format!("field `{key}` is not declared in {schema_path}"))?;
        extras.insert(key, parse_field(kind, raw)?);
    }

    store.save(&extras)?;
    println!(
        "Saved {} of {} declared fields to `{}`",
        extras.len(),
        store.schema().len(),
        store.namespace()
    );
    Ok(())
}

/// `intent-store load <db> -s schema.toml`: Print the saved record.
pub fn load(db_path: &str, schema_path: &str) -> Result {
    let file = SchemaFile::load(schema_path)?;
    let store = IntentStore::from_schema(SqliteStore::open(db_path)?, &file)?;

    match store.load()? {
        Some(intent) => println!("{}", serde_json::to_string_pretty(&intent)?),
        None => println!("no saved data in `{}`", store.namespace()),
    }
    Ok(())
}

/// `intent-store clear <db> -s schema.toml`: Erase the namespace.
pub fn clear(db_path: &str, schema_path: &str, yes: bool) -> Result {
    let file = SchemaFile::load(schema_path)?;
    let mut store = IntentStore::from_schema(SqliteStore::open(db_path)?, &file)?;

    if !yes {
        let confirmed = inquire::Confirm::new(&format!(
            "Erase all saved fields in `{}`?",
            store.namespace()
        ))
        .with_default(false)
        .prompt()?;
        if !confirmed {
            println!("Aborted");
            return Ok(());
        }
    }

    store.clear()?;
    println!("Cleared `{}`", store.namespace());
    Ok(())
}

// ── Helpers ──────────────────────────────────────────────────────────

fn namespaces(
    store: &SqliteStore,
    filter: Option<&str>,
) -> std::result::Result<Vec<String>, Box<dyn std::error::Error>> {
    Ok(match filter {
        Some(ns) => vec![ns.to_string()],
        None => store.namespaces()?,
    })
}

fn split_assignment(s: &str) -> std::result::Result<(&str, &str), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key, value)),
        _ => Err(format!("expected KEY=VALUE, got `{s}`")),
    }
}

fn parse_field(kind: FieldKind, raw: &str) -> std::result::Result<Extra, String> {
    let invalid = |e: &dyn std::fmt::Display| format!("invalid {kind} value `{raw}`: {e}");
    Ok(match kind {
        FieldKind::Text => Extra::String(raw.to_string()),
        FieldKind::Long => Extra::Long(raw.parse().map_err(|e| invalid(&e))?),
        FieldKind::Int => Extra::Int(raw.parse().map_err(|e| invalid(&e))?),
        FieldKind::Boolean => Extra::Boolean(raw.parse().map_err(|e| invalid(&e))?),
        FieldKind::Blob => {
            Extra::PersistableBundle(xml::from_xml_str(raw).map_err(|e| invalid(&e))?)
        }
    })
}

fn pref_json(value: &PrefValue) -> Value {
    match value {
        PrefValue::String(s) => json!({ "kind": "string", "value": s }),
        PrefValue::Int(v) => json!({ "kind": "int", "value": v }),
        PrefValue::Long(v) => json!({ "kind": "long", "value": v }),
        PrefValue::Boolean(v) => json!({ "kind": "boolean", "value": v }),
    }
}

fn persistable_json(bundle: &PersistableBundle) -> Value {
    serde_json::to_value(bundle).unwrap_or(Value::Null)
}

fn format_timestamp(ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(ms)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| ms.to_string())
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

fn format_num(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, ch) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(ch);
    }
    result.chars().rev().collect()
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{head}...")
    }
}
