//! Per-instance identifier strategies.

use std::fmt;

use crate::props::PropMap;

/// Placeholder identifier used until an instance has resolved its own.
pub const UNIDENTIFIED: &str = "<<unidentified>>";

/// How a wrapped instance derives the identifier that distinguishes it from
/// other instances of the same component.
///
/// Resolved once, against the props of the first render.
pub enum IdentifierStrategy {
    /// A fixed identifier shared by every instance
    Literal(String),
    /// Computed from the instance's initial props
    Derived(Box<dyn Fn(&PropMap) -> String>),
}

impl IdentifierStrategy {
    /// Use a fixed identifier.
    pub fn literal(identifier: impl Into<String>) -> Self {
        Self::Literal(identifier.into())
    }

    /// Derive the identifier from the initial props.
    pub fn derived<F>(derive: F) -> Self
    where
        F: Fn(&PropMap) -> String + 'static,
    {
        Self::Derived(Box::new(derive))
    }

    /// Derive the identifier from a single prop, stringified.
    ///
    /// Falls back to [`UNIDENTIFIED`] when the prop is missing.
    pub fn from_prop(key: impl Into<String>) -> Self {
        let key = key.into();
        Self::derived(move |props| match props.get(&key) {
            Some(serde_json::Value::String(value)) => value.clone(),
            Some(value) => value.to_string(),
            None => UNIDENTIFIED.to_string(),
        })
    }

    /// Resolve the identifier for an instance.
    pub fn resolve(&self, props: &PropMap) -> String {
        match self {
            Self::Literal(identifier) => identifier.clone(),
            Self::Derived(derive) => derive(props),
        }
    }
}

impl fmt::Debug for IdentifierStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(identifier) => f.debug_tuple("Literal").field(identifier).finish(),
            Self::Derived(_) => f.write_str("Derived(..)"),
        }
    }
}

impl From<&str> for IdentifierStrategy {
    fn from(identifier: &str) -> Self {
        Self::literal(identifier)
    }
}

impl From<String> for IdentifierStrategy {
    fn from(identifier: String) -> Self {
        Self::Literal(identifier)
    }
}
