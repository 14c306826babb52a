//! Typed property values and their coercion rules.
//!
//! A pulled property arrives as a loosely typed JSON element plus a declared
//! type tag. [`Property::decode`] turns that into a [`Value`], a closed sum
//! type with one variant per ConfigHub value data type, and
//! [`FromValue`] defines how each Rust target type is read out of it.
//!
//! # Coercion
//!
//! | Stored \ Requested | text | bool | numbers | list | map |
//! |---|---|---|---|---|---|
//! | Text | as is | parsed | parsed | mismatch | mismatch |
//! | Boolean | rendered | as is | mismatch | mismatch | mismatch |
//! | Integer, Long, Double, Float | rendered | mismatch | `as` cast | mismatch | mismatch |
//! | List | debug dump | mismatch | mismatch | as is | mismatch |
//! | Map | debug dump | mismatch | mismatch | mismatch | as is |
//!
//! Parsing failures surface as [`ConfigHubError::Format`], impossible
//! conversions as [`ConfigHubError::TypeMismatch`]. Numeric casts between
//! kinds may lose precision (a Double read as Integer truncates) but never
//! fail.

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::error::ConfigHubError;
use crate::types::ValueDataType;

/// The native kind of a [`Value`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Text,
    Boolean,
    Integer,
    Long,
    Double,
    Float,
    List,
    Map,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Text => "Text",
            ValueKind::Boolean => "Boolean",
            ValueKind::Integer => "Integer",
            ValueKind::Long => "Long",
            ValueKind::Double => "Double",
            ValueKind::Float => "Float",
            ValueKind::List => "List",
            ValueKind::Map => "Map",
        };
        f.write_str(name)
    }
}

/// A decoded property value in its native representation.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Boolean(bool),
    Integer(i32),
    Long(i64),
    Double(f64),
    Float(f32),
    List(Vec<String>),
    Map(BTreeMap<String, String>),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Text(_) => ValueKind::Text,
            Value::Boolean(_) => ValueKind::Boolean,
            Value::Integer(_) => ValueKind::Integer,
            Value::Long(_) => ValueKind::Long,
            Value::Double(_) => ValueKind::Double,
            Value::Float(_) => ValueKind::Float,
            Value::List(_) => ValueKind::List,
            Value::Map(_) => ValueKind::Map,
        }
    }

    /// Read this value as `T`, applying the coercion rules.
    pub fn get<T: FromValue>(&self) -> Result<T, ConfigHubError> {
        T::from_value(self)
    }

    pub fn is_text(&self) -> bool {
        self.kind() == ValueKind::Text
    }

    pub fn is_boolean(&self) -> bool {
        self.kind() == ValueKind::Boolean
    }

    pub fn is_integer(&self) -> bool {
        self.kind() == ValueKind::Integer
    }

    pub fn is_long(&self) -> bool {
        self.kind() == ValueKind::Long
    }

    pub fn is_double(&self) -> bool {
        self.kind() == ValueKind::Double
    }

    pub fn is_float(&self) -> bool {
        self.kind() == ValueKind::Float
    }

    pub fn is_list(&self) -> bool {
        self.kind() == ValueKind::List
    }

    pub fn is_map(&self) -> bool {
        self.kind() == ValueKind::Map
    }
}

/// Text rendering used by [`Properties::get`](crate::Properties::get).
///
/// Whole doubles and floats keep their `.0`. Lists and maps are dumped in
/// debug form, which is readable but not guaranteed to be valid JSON.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.write_str(s),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Integer(n) => write!(f, "{n}"),
            Value::Long(n) => write!(f, "{n}"),
            Value::Double(n) => write!(f, "{n:?}"),
            Value::Float(n) => write!(f, "{n:?}"),
            Value::List(items) => write!(f, "{items:?}"),
            Value::Map(entries) => write!(f, "{entries:?}"),
        }
    }
}

/// A property as stored in the [`Properties`](crate::Properties) table:
/// its value plus the flags the service attached to the key.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    value: Value,
    deprecated: bool,
    encryption_group: Option<String>,
}

/// Shape of one entry under `"properties"` in a pull payload.
#[derive(Deserialize)]
struct RawEntry {
    #[serde(rename = "type")]
    kind: Option<String>,
    deprecated: Option<bool>,
    encryption: Option<String>,
    val: Option<JsonValue>,
}

impl Property {
    pub fn new(value: Value) -> Self {
        Self {
            value,
            deprecated: false,
            encryption_group: None,
        }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn is_deprecated(&self) -> bool {
        self.deprecated
    }

    /// Name of the security group the value is encrypted with, if any.
    /// The value itself stays ciphertext.
    pub fn encryption_group(&self) -> Option<&str> {
        self.encryption_group.as_deref()
    }

    /// Decode one wire entry (`{"type", "deprecated", "encryption", "val"}`).
    ///
    /// Returns `Ok(None)` for a type tag this client does not know, so that
    /// newer server-side types don't break older clients.
    pub fn decode(key: &str, entry: &JsonValue) -> Result<Option<Self>, ConfigHubError> {
        let decode_err = |reason: String| ConfigHubError::Decode {
            key: key.to_string(),
            reason,
        };

        let raw = RawEntry::deserialize(entry).map_err(|e| decode_err(e.to_string()))?;
        let val = match raw.val {
            Some(JsonValue::Null) | None => return Err(decode_err("missing 'val'".into())),
            Some(v) => v,
        };

        // Encrypted values are ciphertext; their declared type only applies
        // after server-side decryption.
        let data_type = if raw.encryption.is_some() {
            ValueDataType::Text
        } else {
            let tag = raw.kind.as_deref().unwrap_or("Text");
            match ValueDataType::from_tag(tag) {
                Some(t) => t,
                None => {
                    tracing::warn!(key, tag, "skipping property with unknown type");
                    return Ok(None);
                }
            }
        };

        let value = decode_value(data_type, &val).map_err(decode_err)?;
        Ok(Some(Self {
            value,
            deprecated: raw.deprecated.unwrap_or(false),
            encryption_group: raw.encryption,
        }))
    }
}

fn decode_value(data_type: ValueDataType, val: &JsonValue) -> Result<Value, String> {
    match data_type {
        ValueDataType::Text | ValueDataType::Code => scalar_text(val).map(Value::Text),
        ValueDataType::Boolean => match val {
            JsonValue::Bool(b) => Ok(Value::Boolean(*b)),
            JsonValue::String(s) => parse_bool(s)
                .map(Value::Boolean)
                .ok_or_else(|| format!("'{s}' is not a boolean")),
            other => Err(format!("expected boolean, found {}", shape(other))),
        },
        ValueDataType::Integer => match val {
            JsonValue::Number(n) => whole_number(n)
                .and_then(|v| i32::try_from(v).ok())
                .map(Value::Integer)
                .ok_or_else(|| format!("{n} is not a 32-bit integer")),
            JsonValue::String(s) => s.parse().map(Value::Integer).map_err(|e| format!("'{s}': {e}")),
            other => Err(format!("expected integer, found {}", shape(other))),
        },
        ValueDataType::Long => match val {
            JsonValue::Number(n) => whole_number(n)
                .map(Value::Long)
                .ok_or_else(|| format!("{n} is not a 64-bit integer")),
            JsonValue::String(s) => s.parse().map(Value::Long).map_err(|e| format!("'{s}': {e}")),
            other => Err(format!("expected long, found {}", shape(other))),
        },
        ValueDataType::Double => decode_float(val).map(Value::Double),
        ValueDataType::Float => decode_float(val).map(|f| Value::Float(f as f32)),
        ValueDataType::List => match val {
            JsonValue::Array(items) => items
                .iter()
                .map(scalar_text)
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            other => Err(format!("expected list, found {}", shape(other))),
        },
        ValueDataType::Map => match val {
            JsonValue::Object(entries) => entries
                .iter()
                .map(|(k, v)| scalar_text(v).map(|text| (k.clone(), text)))
                .collect::<Result<BTreeMap<_, _>, _>>()
                .map(Value::Map),
            other => Err(format!("expected map, found {}", shape(other))),
        },
    }
}

/// Integral value of a JSON number. Floats like `3306.0` or `1e3` count when
/// they have no fractional part and fit in an `i64`.
fn whole_number(n: &serde_json::Number) -> Option<i64> {
    n.as_i64().or_else(|| {
        n.as_f64()
            .filter(|f| f.is_finite() && f.fract() == 0.0)
            .filter(|f| *f >= i64::MIN as f64 && *f < i64::MAX as f64)
            .map(|f| f as i64)
    })
}

fn decode_float(val: &JsonValue) -> Result<f64, String> {
    match val {
        JsonValue::Number(n) => n
            .as_f64()
            .ok_or_else(|| format!("{n} is not representable as a float")),
        JsonValue::String(s) => s.parse().map_err(|e| format!("'{s}': {e}")),
        other => Err(format!("expected number, found {}", shape(other))),
    }
}

/// Render a JSON scalar as text; containers and null are rejected.
fn scalar_text(val: &JsonValue) -> Result<String, String> {
    match val {
        JsonValue::String(s) => Ok(s.clone()),
        JsonValue::Number(n) => Ok(n.to_string()),
        JsonValue::Bool(b) => Ok(b.to_string()),
        other => Err(format!("expected text, found {}", shape(other))),
    }
}

pub(crate) fn shape(val: &JsonValue) -> &'static str {
    match val {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    if s.eq_ignore_ascii_case("true") {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// A Rust type that can be read out of a [`Value`].
pub trait FromValue: Sized {
    /// The kind this type corresponds to, used in error messages.
    const KIND: ValueKind;

    fn from_value(value: &Value) -> Result<Self, ConfigHubError>;
}

fn mismatch(found: &Value, requested: ValueKind) -> ConfigHubError {
    ConfigHubError::TypeMismatch {
        found: found.kind(),
        requested,
    }
}

impl FromValue for String {
    const KIND: ValueKind = ValueKind::Text;

    fn from_value(value: &Value) -> Result<Self, ConfigHubError> {
        Ok(value.to_string())
    }
}

impl FromValue for bool {
    const KIND: ValueKind = ValueKind::Boolean;

    fn from_value(value: &Value) -> Result<Self, ConfigHubError> {
        match value {
            Value::Boolean(b) => Ok(*b),
            Value::Text(s) => parse_bool(s).ok_or_else(|| ConfigHubError::Format {
                value: s.clone(),
                requested: Self::KIND,
                reason: "expected 'true' or 'false'".into(),
            }),
            other => Err(mismatch(other, Self::KIND)),
        }
    }
}

macro_rules! numeric_from_value {
    ($target:ty, $kind:expr) => {
        impl FromValue for $target {
            const KIND: ValueKind = $kind;

            #[allow(clippy::unnecessary_cast, clippy::cast_possible_truncation)]
            fn from_value(value: &Value) -> Result<Self, ConfigHubError> {
                match value {
                    Value::Text(s) => s.parse::<$target>().map_err(|e| ConfigHubError::Format {
                        value: s.clone(),
                        requested: Self::KIND,
                        reason: e.to_string(),
                    }),
                    Value::Integer(n) => Ok(*n as $target),
                    Value::Long(n) => Ok(*n as $target),
                    Value::Double(n) => Ok(*n as $target),
                    Value::Float(n) => Ok(*n as $target),
                    other => Err(mismatch(other, Self::KIND)),
                }
            }
        }
    };
}

numeric_from_value!(i32, ValueKind::Integer);
numeric_from_value!(i64, ValueKind::Long);
numeric_from_value!(f64, ValueKind::Double);
numeric_from_value!(f32, ValueKind::Float);

impl FromValue for Vec<String> {
    const KIND: ValueKind = ValueKind::List;

    fn from_value(value: &Value) -> Result<Self, ConfigHubError> {
        match value {
            Value::List(items) => Ok(items.clone()),
            other => Err(mismatch(other, Self::KIND)),
        }
    }
}

impl FromValue for BTreeMap<String, String> {
    const KIND: ValueKind = ValueKind::Map;

    fn from_value(value: &Value) -> Result<Self, ConfigHubError> {
        match value {
            Value::Map(entries) => Ok(entries.clone()),
            other => Err(mismatch(other, Self::KIND)),
        }
    }
}
