//! The property table: typed lookups over a pulled set of properties.
//!
//! Every accessor comes in two forms. `get_integer(key)` returns
//! `Ok(None)` when the key is absent; `get_integer_or(key, default)` returns
//! the default instead. When the key is present, both delegate to the
//! coercion rules in [`value`](crate::value) and propagate their errors, so a
//! value is never silently read as the wrong thing.
//!
//! ```ignore
//! let port: i32 = hub.properties().get_integer_or("db.port", 5432)?;
//! let hosts = hub.properties().get_list("cluster.hosts")?.unwrap_or_default();
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};

use serde_json::{Map, Value as JsonValue};

use crate::error::ConfigHubError;
use crate::value::{FromValue, Property, ValueKind};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties {
    data: HashMap<String, Property>,
}

impl Properties {
    /// Build a table from the `"properties"` object of a pull payload.
    ///
    /// The first malformed entry aborts the whole decode.
    pub fn decode(payload: &Map<String, JsonValue>) -> Result<Self, ConfigHubError> {
        let mut data = HashMap::with_capacity(payload.len());
        for (key, entry) in payload {
            if let Some(property) = Property::decode(key, entry)? {
                data.insert(key.clone(), property);
            }
        }
        Ok(Self { data })
    }

    /// Look up a property. Using a deprecated property logs a warning.
    pub fn property(&self, key: &str) -> Option<&Property> {
        let property = self.data.get(key)?;
        if property.is_deprecated() {
            tracing::warn!(key, "deprecated property used");
        }
        Some(property)
    }

    /// Read a property as any [`FromValue`] type.
    pub fn get_as<T: FromValue>(&self, key: &str) -> Result<Option<T>, ConfigHubError> {
        self.property(key)
            .map(|p| p.value().get::<T>())
            .transpose()
    }

    fn get_as_or<T: FromValue>(&self, key: &str, default: T) -> Result<T, ConfigHubError> {
        Ok(self.get_as(key)?.unwrap_or(default))
    }

    /// The value rendered as text. Every kind has a text form, so this
    /// cannot fail.
    pub fn get(&self, key: &str) -> Option<String> {
        self.property(key).map(|p| p.value().to_string())
    }

    pub fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    pub fn get_boolean(&self, key: &str) -> Result<Option<bool>, ConfigHubError> {
        self.get_as(key)
    }

    pub fn get_boolean_or(&self, key: &str, default: bool) -> Result<bool, ConfigHubError> {
        self.get_as_or(key, default)
    }

    pub fn get_integer(&self, key: &str) -> Result<Option<i32>, ConfigHubError> {
        self.get_as(key)
    }

    pub fn get_integer_or(&self, key: &str, default: i32) -> Result<i32, ConfigHubError> {
        self.get_as_or(key, default)
    }

    pub fn get_long(&self, key: &str) -> Result<Option<i64>, ConfigHubError> {
        self.get_as(key)
    }

    pub fn get_long_or(&self, key: &str, default: i64) -> Result<i64, ConfigHubError> {
        self.get_as_or(key, default)
    }

    pub fn get_double(&self, key: &str) -> Result<Option<f64>, ConfigHubError> {
        self.get_as(key)
    }

    pub fn get_double_or(&self, key: &str, default: f64) -> Result<f64, ConfigHubError> {
        self.get_as_or(key, default)
    }

    pub fn get_float(&self, key: &str) -> Result<Option<f32>, ConfigHubError> {
        self.get_as(key)
    }

    pub fn get_float_or(&self, key: &str, default: f32) -> Result<f32, ConfigHubError> {
        self.get_as_or(key, default)
    }

    pub fn get_list(&self, key: &str) -> Result<Option<Vec<String>>, ConfigHubError> {
        self.get_as(key)
    }

    pub fn get_list_or(
        &self,
        key: &str,
        default: Vec<String>,
    ) -> Result<Vec<String>, ConfigHubError> {
        self.get_as_or(key, default)
    }

    pub fn get_map(&self, key: &str) -> Result<Option<BTreeMap<String, String>>, ConfigHubError> {
        self.get_as(key)
    }

    pub fn get_map_or(
        &self,
        key: &str,
        default: BTreeMap<String, String>,
    ) -> Result<BTreeMap<String, String>, ConfigHubError> {
        self.get_as_or(key, default)
    }

    /// Security group of an encrypted property. Nothing is decrypted here.
    pub fn encryption_group(&self, key: &str) -> Option<&str> {
        self.property(key)?.encryption_group()
    }

    /// Whether the key is flagged deprecated. Unlike the getters this does
    /// not log, since callers use it to decide whether to read the key.
    pub fn is_deprecated(&self, key: &str) -> bool {
        self.data.get(key).is_some_and(Property::is_deprecated)
    }

    fn kind_is(&self, key: &str, kind: ValueKind) -> bool {
        self.property(key).is_some_and(|p| p.value().kind() == kind)
    }

    pub fn is_text(&self, key: &str) -> bool {
        self.kind_is(key, ValueKind::Text)
    }

    pub fn is_boolean(&self, key: &str) -> bool {
        self.kind_is(key, ValueKind::Boolean)
    }

    pub fn is_integer(&self, key: &str) -> bool {
        self.kind_is(key, ValueKind::Integer)
    }

    pub fn is_long(&self, key: &str) -> bool {
        self.kind_is(key, ValueKind::Long)
    }

    pub fn is_double(&self, key: &str) -> bool {
        self.kind_is(key, ValueKind::Double)
    }

    pub fn is_float(&self, key: &str) -> bool {
        self.kind_is(key, ValueKind::Float)
    }

    pub fn is_list(&self, key: &str) -> bool {
        self.kind_is(key, ValueKind::List)
    }

    pub fn is_map(&self, key: &str) -> bool {
        self.kind_is(key, ValueKind::Map)
    }

    pub fn keys(&self) -> HashSet<&str> {
        self.data.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Property)> {
        self.data.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
