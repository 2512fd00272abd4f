use crate::bundle::{Bundle, Extra};
use crate::component::ComponentName;
use crate::persistable::PersistableBundle;

/// A record addressed to a component, carrying typed extras.
///
/// # Example
///
/// ```
/// use intent_kit::{ComponentName, Intent};
///
/// let intent = Intent::new()
///     .with_component(ComponentName::new("com.example", "com.example.Setup"))
///     .with_extra("attempt", 2_i32);
///
/// assert_eq!(intent.get_int_extra("attempt", 0), 2);
/// assert_eq!(intent.component().unwrap().package_name(), "com.example");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Intent {
    component: Option<ComponentName>,
    extras: Bundle,
}

impl Intent {
    /// Create an intent with no target and no extras.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`set_component`](Self::set_component).
    #[must_use]
    pub fn with_component(mut self, component: ComponentName) -> Self {
        self.component = Some(component);
        self
    }

    /// Builder-style [`put_extra`](Self::put_extra).
    #[must_use]
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Extra>) -> Self {
        self.put_extra(key, value);
        self
    }

    pub fn set_component(&mut self, component: ComponentName) {
        self.component = Some(component);
    }

    /// The target component, if any.
    #[must_use]
    pub fn component(&self) -> Option<&ComponentName> {
        self.component.as_ref()
    }

    /// Add or replace an extra.
    pub fn put_extra(&mut self, key: impl Into<String>, value: impl Into<Extra>) {
        self.extras.insert(key, value);
    }

    #[must_use]
    pub fn has_extra(&self, key: &str) -> bool {
        self.extras.contains_key(key)
    }

    #[must_use]
    pub fn extras(&self) -> &Bundle {
        &self.extras
    }

    pub fn extras_mut(&mut self) -> &mut Bundle {
        &mut self.extras
    }

    /// Consume the intent, returning its extras.
    #[must_use]
    pub fn into_extras(self) -> Bundle {
        self.extras
    }

    pub fn get_string_extra(&self, key: &str) -> Option<&str> {
        self.extras.get_string(key)
    }

    pub fn get_long_extra(&self, key: &str, default: i64) -> i64 {
        self.extras.get_long_or(key, default)
    }

    pub fn get_int_extra(&self, key: &str, default: i32) -> i32 {
        self.extras.get_int_or(key, default)
    }

    pub fn get_boolean_extra(&self, key: &str, default: bool) -> bool {
        self.extras.get_boolean_or(key, default)
    }

    pub fn get_persistable_bundle_extra(&self, key: &str) -> Option<&PersistableBundle> {
        self.extras.get_persistable_bundle(key)
    }
}
