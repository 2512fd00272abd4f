//! # intent-store
//!
//! Persists a declared set of typed fields between [`intent_kit`] records and
//! a namespaced preference store, so an interrupted flow can resume.
//!
//! ## Quick Start
//!
//! ```
//! use intent_kit::{Bundle, ComponentName};
//! use intent_store::{IntentStore, MemoryStore};
//!
//! let target = ComponentName::new("com.example.setup", "com.example.setup.Resume");
//! let mut store = IntentStore::new(MemoryStore::new(), target, "resume")
//!     .with_long_keys(["deadline"]).unwrap();
//!
//! assert!(store.load().unwrap().is_none());
//!
//! let mut extras = Bundle::new();
//! extras.put_long("deadline", 1_700_000_000);
//! store.save(&extras).unwrap();
//!
//! let intent = store.load().unwrap().unwrap();
//! assert_eq!(intent.get_long_extra("deadline", 0), 1_700_000_000);
//! ```
//!
//! ## Backends
//!
//! | Backend | Feature flag | Use case |
//! |---------|-------------|----------|
//! | [`MemoryStore`] | *(always available)* | Testing, prototyping |
//! | `SqliteStore` | `sqlite` (default) | Desktop and device builds |
//! | `RedbStore` | `redb` | Pure-Rust builds without C deps |

mod codec;
mod edit;
mod memory;
#[cfg(feature = "redb")]
mod redb;
mod schema;
mod schema_file;
#[cfg(feature = "sqlite")]
mod sqlite;
mod store;
mod traits;

pub use codec::{decode_value, encode_value, CodecError, CODEC_VERSION, MAGIC_BYTE};
pub use edit::PrefEdit;
pub use memory::{MemoryError, MemoryStore};
#[cfg(feature = "redb")]
pub use crate::redb::{RedbError, RedbStore};
pub use schema::{FieldKind, FieldSchema, SchemaError, IS_SET_KEY};
pub use schema_file::{
    validate_schema, FieldLists, SchemaFile, SchemaFileError, StoreSection, ValidationError,
};
#[cfg(feature = "sqlite")]
pub use sqlite::{JournalMode, SqliteConfig, SqliteError, SqliteStore};
pub use store::IntentStore;
pub use traits::*;
