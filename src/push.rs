//! Queue of pending key and value changes, encoded into the push wire format.
//!
//! Changes accumulate per key through [`PushQueue::key`] and are sent with
//! [`ConfigHub::flush`](crate::ConfigHub::flush), which always empties the
//! queue, even when the request fails.
//!
//! ```ignore
//! let queue = hub.push_queue();
//! queue.enable_key_creation();
//! queue
//!     .key("access.port")
//!     .enable_push()
//!     .set_value_data_type(ValueDataType::Integer)
//!     .set_value(&1002, "*;MyTestApp")?;
//! let response = hub.flush();
//! ```
//!
//! Key attributes that are never set are left out of the payload, which the
//! service reads as "leave unchanged". Sending `false` instead would
//! overwrite the stored attribute.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::error::ConfigHubError;
use crate::types::ValueDataType;
use crate::value::shape;

/// A value queued for a single context.
///
/// Scalars (text, numbers, booleans) travel as text; lists and maps keep
/// their structure.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PushValue {
    Text(String),
    List(Vec<String>),
    Map(BTreeMap<String, String>),
}

impl PushValue {
    /// Convert any serializable value. Accepts scalars, sequences of
    /// strings, and string-to-string maps.
    pub fn from_serialize<V: Serialize + ?Sized>(
        key: &str,
        value: &V,
    ) -> Result<Self, ConfigHubError> {
        let unsupported = |reason: String| ConfigHubError::UnsupportedValueType {
            key: key.to_string(),
            reason,
        };

        let json = serde_json::to_value(value).map_err(|e| unsupported(e.to_string()))?;
        match json {
            JsonValue::String(s) => Ok(PushValue::Text(s)),
            JsonValue::Number(n) => Ok(PushValue::Text(n.to_string())),
            JsonValue::Bool(b) => Ok(PushValue::Text(b.to_string())),
            JsonValue::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    JsonValue::String(s) => Ok(s),
                    other => Err(unsupported(format!(
                        "list items must be strings, found {}",
                        shape(&other)
                    ))),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(PushValue::List),
            JsonValue::Object(entries) => entries
                .into_iter()
                .map(|(k, v)| match v {
                    JsonValue::String(s) => Ok((k, s)),
                    other => Err(unsupported(format!(
                        "map values must be strings, found {} for '{k}'",
                        shape(&other)
                    ))),
                })
                .collect::<Result<BTreeMap<_, _>, _>>()
                .map(PushValue::Map),
            JsonValue::Null => Err(unsupported("null is not a value".into())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct PendingValue {
    value: PushValue,
    active: bool,
}

/// All pending changes for one property key.
#[derive(Debug, Clone, PartialEq)]
pub struct Key {
    name: String,
    readme: Option<String>,
    push: Option<bool>,
    value_data_type: Option<ValueDataType>,
    deprecated: Option<bool>,
    security_group: Option<(String, String)>,
    values: BTreeMap<String, PendingValue>,
}

impl Key {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            readme: None,
            push: None,
            value_data_type: None,
            deprecated: None,
            security_group: None,
            values: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Queue an active value for `context`, replacing any value already
    /// queued for the same context.
    pub fn set_value<V: Serialize + ?Sized>(
        &mut self,
        value: &V,
        context: &str,
    ) -> Result<&mut Self, ConfigHubError> {
        self.set_value_with(value, context, true)
    }

    /// Like [`set_value`](Self::set_value) with an explicit active flag.
    pub fn set_value_with<V: Serialize + ?Sized>(
        &mut self,
        value: &V,
        context: &str,
        active: bool,
    ) -> Result<&mut Self, ConfigHubError> {
        let value = PushValue::from_serialize(&self.name, value)?;
        self.values
            .insert(context.to_string(), PendingValue { value, active });
        Ok(self)
    }

    pub fn set_readme(&mut self, readme: &str) -> &mut Self {
        self.readme = Some(readme.to_string());
        self
    }

    /// Allow API pushes to this key.
    pub fn enable_push(&mut self) -> &mut Self {
        self.push = Some(true);
        self
    }

    pub fn disable_push(&mut self) -> &mut Self {
        self.push = Some(false);
        self
    }

    /// New keys default to [`ValueDataType::Text`] on the server.
    pub fn set_value_data_type(&mut self, vdt: ValueDataType) -> &mut Self {
        self.value_data_type = Some(vdt);
        self
    }

    pub fn deprecate(&mut self) -> &mut Self {
        self.deprecated = Some(true);
        self
    }

    pub fn not_deprecated(&mut self) -> &mut Self {
        self.deprecated = Some(false);
        self
    }

    /// Assign the key to a security group. Also required when modifying a
    /// key that already belongs to one.
    pub fn set_security_group(&mut self, group: &str, password: &str) -> &mut Self {
        self.security_group = Some((group.to_string(), password.to_string()));
        self
    }

    fn payload(&self) -> KeyPayload<'_> {
        KeyPayload {
            key: &self.name,
            readme: self.readme.as_deref(),
            push: self.push.map(|b| b.to_string()),
            vdt: self.value_data_type.map(ValueDataType::as_str),
            deprecated: self.deprecated.map(|b| b.to_string()),
            security_group: self.security_group.as_ref().map(|(g, _)| g.as_str()),
            password: self.security_group.as_ref().map(|(_, p)| p.as_str()),
            values: self
                .values
                .iter()
                .map(|(context, pending)| ValuePayload {
                    context,
                    active: pending.active,
                    value: &pending.value,
                })
                .collect(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PushPayload<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    change_comment: Option<&'a str>,
    #[serde(skip_serializing_if = "is_false")]
    enable_key_creation: bool,
    data: Vec<KeyPayload<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct KeyPayload<'a> {
    key: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    readme: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    push: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    vdt: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    deprecated: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    security_group: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    password: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    values: Vec<ValuePayload<'a>>,
}

#[derive(Serialize)]
struct ValuePayload<'a> {
    context: &'a str,
    active: bool,
    value: &'a PushValue,
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// Status and message of a push. A request that never reached the
/// service has status `0` and the failure as its message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushResponse {
    pub status: u16,
    pub message: Option<String>,
}

impl PushResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub(crate) fn failed(message: String) -> Self {
        Self {
            status: 0,
            message: Some(message),
        }
    }
}

/// Pending changes for the next push.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PushQueue {
    keys: BTreeMap<String, Key>,
    enable_key_creation: bool,
    change_comment: Option<String>,
}

impl PushQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the pending changes for `name`, creating an empty entry on first use.
    pub fn key(&mut self, name: &str) -> &mut Key {
        self.keys
            .entry(name.to_string())
            .or_insert_with(|| Key::new(name))
    }

    /// Let the push create keys that don't exist yet. Off by default, in
    /// which case the service rejects changes to unknown keys.
    pub fn enable_key_creation(&mut self) {
        self.enable_key_creation = true;
    }

    pub fn disable_key_creation(&mut self) {
        self.enable_key_creation = false;
    }

    /// Comment shown in the repository's revision history.
    pub fn set_change_comment(&mut self, comment: &str) {
        self.change_comment = Some(comment.to_string());
    }

    /// Drop all queued keys without sending them.
    pub fn clear(&mut self) {
        self.keys.clear();
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Build the push request body.
    pub fn encode(&self) -> Result<JsonValue, ConfigHubError> {
        let payload = PushPayload {
            change_comment: self.change_comment.as_deref(),
            enable_key_creation: self.enable_key_creation,
            data: self.keys.values().map(Key::payload).collect(),
        };
        serde_json::to_value(payload).map_err(ConfigHubError::InvalidPayload)
    }
}
