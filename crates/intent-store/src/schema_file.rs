//! TOML description of one store: where it lives and which fields it keeps.
//!
//! ```toml
//! [store]
//! name = "resume_prefs"
//! target = "com.example.provisioning/.ProvisioningActivity"
//!
//! [fields]
//! text = ["org", "ssid"]
//! long = ["deadline"]
//! int = ["retries"]
//! boolean = ["skip_encryption"]
//! blob = ["admin_extras"]
//! ```

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use intent_kit::ComponentName;
use serde::{Deserialize, Serialize};

use crate::schema::{FieldKind, FieldSchema, SchemaError, IS_SET_KEY};

/// Top-level schema file structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaFile {
    /// Where the fields are stored and who receives them on load.
    pub store: StoreSection,
    /// Field names per kind.
    #[serde(default)]
    pub fields: FieldLists,
}

/// The `[store]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSection {
    /// Namespace in the backing store.
    pub name: String,
    /// Flattened component name of the load target, e.g. `pkg/.Activity`.
    pub target: String,
}

/// The `[fields]` table. Missing kinds declare no fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldLists {
    #[serde(default)]
    pub text: Vec<String>,
    #[serde(default)]
    pub long: Vec<String>,
    #[serde(default)]
    pub int: Vec<String>,
    #[serde(default)]
    pub boolean: Vec<String>,
    #[serde(default)]
    pub blob: Vec<String>,
}

impl FieldLists {
    /// Names declared under `kind`.
    #[must_use]
    pub fn get(&self, kind: FieldKind) -> &[String] {
        match kind {
            FieldKind::Text => &self.text,
            FieldKind::Long => &self.long,
            FieldKind::Int => &self.int,
            FieldKind::Boolean => &self.boolean,
            FieldKind::Blob => &self.blob,
        }
    }
}

/// A single validation problem, with the field it concerns when there is one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub kind: Option<FieldKind>,
    pub field: Option<String>,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ctx = Vec::new();
        if let Some(kind) = self.kind {
            ctx.push(format!("fields.{kind}"));
        }
        if let Some(field) = &self.field {
            ctx.push(format!("field={field}"));
        }
        if ctx.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "[{}] {}", ctx.join(", "), self.message)
        }
    }
}

/// Error loading a schema file.
#[derive(Debug, thiserror::Error)]
pub enum SchemaFileError {
    /// Failed to read the file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Failed to parse the TOML.
    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// The file parsed but describes an unusable store.
    #[error("schema validation failed:{}", list(.0))]
    Validation(Vec<ValidationError>),
    /// The field lists were rejected while building a [`FieldSchema`].
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

fn list(errors: &[ValidationError]) -> String {
    errors.iter().map(|e| format!("\n  - {e}")).collect()
}

impl SchemaFile {
    /// Parse and validate a schema from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, SchemaFileError> {
        let file: SchemaFile = toml::from_str(text)?;
        validate_schema(&file).map_err(SchemaFileError::Validation)?;
        Ok(file)
    }

    /// Read, parse and validate a schema file from disk.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SchemaFileError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// The load target, if `store.target` parses.
    #[must_use]
    pub fn target(&self) -> Option<ComponentName> {
        ComponentName::unflatten_from_string(&self.store.target)
    }

    /// Build the field declarations in [`FieldKind::ALL`] order.
    pub fn field_schema(&self) -> Result<FieldSchema, SchemaError> {
        let mut schema = FieldSchema::new();
        for kind in FieldKind::ALL {
            schema.set_keys(kind, self.fields.get(kind).iter().cloned())?;
        }
        Ok(schema)
    }
}

/// Validate a parsed schema file. Returns `Ok(())` if valid, or every problem
/// found.
pub fn validate_schema(file: &SchemaFile) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if file.store.name.is_empty() {
        errors.push(ValidationError {
            kind: None,
            field: None,
            message: "store.name must not be empty".into(),
        });
    }

    if file.target().is_none() {
        errors.push(ValidationError {
            kind: None,
            field: None,
            message: format!(
                "store.target `{}` is not a component name (expected `package/class`)",
                file.store.target
            ),
        });
    }

    let mut seen: HashMap<&str, FieldKind> = HashMap::new();
    for kind in FieldKind::ALL {
        for name in file.fields.get(kind) {
            if name.is_empty() {
                errors.push(ValidationError {
                    kind: Some(kind),
                    field: None,
                    message: "field name must not be empty".into(),
                });
                continue;
            }
            if name == IS_SET_KEY {
                errors.push(ValidationError {
                    kind: Some(kind),
                    field: Some(name.clone()),
                    message: "field name is reserved for the saved-data marker".into(),
                });
                continue;
            }
            match seen.get(name.as_str()) {
                Some(&first) if first != kind => errors.push(ValidationError {
                    kind: Some(kind),
                    field: Some(name.clone()),
                    message: format!("field is already declared under fields.{first}"),
                }),
                Some(_) => {}
                None => {
                    seen.insert(name, kind);
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
