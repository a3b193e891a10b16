//! Property snapshots and shallow change detection.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::error::ProfilerResult;

/// Key under which non-object props are stored in a [`PropMap`].
pub const VALUE_KEY: &str = "value";

/// An ordered snapshot of a component's props, keyed by property name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PropMap(BTreeMap<String, Value>);

impl PropMap {
    /// Create an empty prop map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot any serializable props.
    ///
    /// Structs and maps become one entry per field. Unit props produce an
    /// empty map, anything else is stored under [`VALUE_KEY`].
    pub fn from_props<P: Serialize + ?Sized>(props: &P) -> ProfilerResult<Self> {
        let map = match serde_json::to_value(props)? {
            Value::Object(fields) => fields.into_iter().collect(),
            Value::Null => BTreeMap::new(),
            other => BTreeMap::from([(VALUE_KEY.to_string(), other)]),
        };
        Ok(Self(map))
    }

    /// Builder method to add a property.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace a property.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Get a property value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Get a property as a string slice, if it is a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Whether a property is present and exactly `true`.
    pub fn flag(&self, key: &str) -> bool {
        matches!(self.get(key), Some(Value::Bool(true)))
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no properties.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate properties in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value))
    }
}

impl FromIterator<(String, Value)> for PropMap {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// One property that differs between two renders.
///
/// `None` means the property was absent on that side.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeDetail {
    /// Property name
    pub key: String,
    /// Value in the previous render
    pub previous: Option<Value>,
    /// Value in the current render
    pub current: Option<Value>,
}

impl fmt::Display for ChangeDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Changed prop {}: {} → {}",
            self.key,
            DisplayValue(self.previous.as_ref()),
            DisplayValue(self.current.as_ref())
        )
    }
}

struct DisplayValue<'a>(Option<&'a Value>);

impl fmt::Display for DisplayValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(value) => write!(f, "{value}"),
            None => f.write_str("undefined"),
        }
    }
}

/// Shallow-compare two prop snapshots key by key.
///
/// A key present on only one side counts as changed. Results are ordered by
/// key.
pub fn change_details(current: &PropMap, previous: &PropMap) -> Vec<ChangeDetail> {
    let keys: BTreeSet<&String> = current.0.keys().chain(previous.0.keys()).collect();

    keys.into_iter()
        .filter_map(|key| {
            let prev = previous.0.get(key);
            let curr = current.0.get(key);
            if prev == curr {
                return None;
            }
            Some(ChangeDetail {
                key: key.clone(),
                previous: prev.cloned(),
                current: curr.cloned(),
            })
        })
        .collect()
}

/// Whether any property differs between two snapshots.
pub fn has_changes(current: &PropMap, previous: &PropMap) -> bool {
    current != previous
}
