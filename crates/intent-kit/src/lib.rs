//! # intent-kit
//!
//! Record types for saving and resuming provisioning state.
//!
//! - [`Bundle`]: a transient map from key to typed value ([`Extra`]); the
//!   input handed to a store when persisting.
//! - [`Intent`]: a [`Bundle`] of extras addressed to a [`ComponentName`];
//!   what a store hands back when resuming.
//! - [`PersistableBundle`]: a nested map restricted to primitives, primitive
//!   arrays and further bundles, with a self-contained XML text form
//!   (see [`xml`]).
//!
//! ## Quick Start
//!
//! ```
//! use intent_kit::{PersistableBundle, xml};
//!
//! let mut admin = PersistableBundle::new();
//! admin.insert("org", "Example Corp");
//! admin.insert("retries", 3_i32);
//!
//! let text = xml::to_xml_string(&admin).unwrap();
//! let restored = xml::from_xml_str(&text).unwrap();
//! assert_eq!(restored, admin);
//! ```
//!
//! ## Features
//!
//! - `serde`: derive `Serialize`/`Deserialize` for every record type.

mod bundle;
mod component;
mod intent;
mod persistable;

pub mod xml;

pub use bundle::{Bundle, Extra};
pub use component::{ComponentName, ParseComponentError};
pub use intent::Intent;
pub use persistable::{PersistableBundle, PersistableValue};
pub use xml::{XmlError, TAG_PERSISTABLE_BUNDLE};
