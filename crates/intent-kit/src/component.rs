use std::fmt;
use std::str::FromStr;

/// Identifies the component an [`Intent`](crate::Intent) is delivered to.
///
/// A component is a package name plus a fully qualified class name. The
/// flattened text form is `package/class`, where a class that lives inside
/// the package may be abbreviated to `.Class`.
///
/// # Example
///
/// ```
/// use intent_kit::ComponentName;
///
/// let target = ComponentName::unflatten_from_string("com.example/.Setup").unwrap();
/// assert_eq!(target.class_name(), "com.example.Setup");
/// assert_eq!(target.flatten_to_short_string(), "com.example/.Setup");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ComponentName {
    package: String,
    class: String,
}

impl ComponentName {
    /// Create a component from a package and a fully qualified class name.
    pub fn new(package: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            class: class.into(),
        }
    }

    /// The package this component belongs to.
    #[must_use]
    pub fn package_name(&self) -> &str {
        &self.package
    }

    /// The fully qualified class name.
    #[must_use]
    pub fn class_name(&self) -> &str {
        &self.class
    }

    /// `package/class`, with the class always fully qualified.
    #[must_use]
    pub fn flatten_to_string(&self) -> String {
        format!("{}/{}", self.package, self.class)
    }

    /// Like [`flatten_to_string`](Self::flatten_to_string), but a class
    /// inside the package is written as `.Class`.
    #[must_use]
    pub fn flatten_to_short_string(&self) -> String {
        match self.class.strip_prefix(self.package.as_str()) {
            Some(rest) if rest.starts_with('.') => format!("{}/{}", self.package, rest),
            _ => self.flatten_to_string(),
        }
    }

    /// Parse the flattened form.
    ///
    /// Returns `None` when there is no `/` or nothing follows it.
    pub fn unflatten_from_string(s: &str) -> Option<Self> {
        let sep = s.find('/')?;
        if sep + 1 >= s.len() {
            return None;
        }
        let package = &s[..sep];
        let class = &s[sep + 1..];
        let class = if class.starts_with('.') {
            format!("{package}{class}")
        } else {
            class.to_string()
        };
        Some(Self::new(package, class))
    }
}

impl fmt::Display for ComponentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.package, self.class)
    }
}

/// Error returned when a string is not a flattened component name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid component name: {0:?} (expected package/class)")]
pub struct ParseComponentError(String);

impl FromStr for ComponentName {
    type Err = ParseComponentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::unflatten_from_string(s).ok_or_else(|| ParseComponentError(s.to_string()))
    }
}
