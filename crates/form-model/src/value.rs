//! Live field values.
//!
//! [`Value`] mirrors the JSON data model with one addition: [`Value::Handle`]
//! wraps an in-process object (an upload in progress, an editor instance).
//! Handles are fine inside one process but can never be transmitted, so
//! [`Value::to_json`] refuses any value that contains one.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A live, in-process reference carried inside a value payload.
#[derive(Clone)]
pub struct LiveHandle {
    kind: Arc<str>,
    inner: Arc<dyn Any + Send + Sync>,
}

impl LiveHandle {
    pub fn new<T: Any + Send + Sync>(kind: &str, inner: T) -> Self {
        Self {
            kind: Arc::from(kind),
            inner: Arc::new(inner),
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    pub fn ptr_eq(&self, other: &LiveHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for LiveHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LiveHandle").field(&self.kind).finish()
    }
}

/// A field value.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    List(Vec<Value>),
    Object(BTreeMap<String, Value>),
    /// In-process reference; never transmissible.
    Handle(LiveHandle),
}

/// A value (or part of one) cannot cross the serialization boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotTransmissible {
    /// Location inside the value, e.g. `$.images[1].upload`.
    pub location: String,
    /// Kind of the live handle found there.
    pub handle_kind: String,
}

impl fmt::Display for NotTransmissible {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "live '{}' handle at {} cannot be serialized",
            self.handle_kind, self.location
        )
    }
}

impl std::error::Error for NotTransmissible {}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Handle(a), Value::Handle(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl Value {
    pub fn object() -> Self {
        Value::Object(BTreeMap::new())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Name of the variant, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Object(_) => "object",
            Value::Handle(_) => "handle",
        }
    }

    /// Null, blank string, empty list or empty object.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Null => true,
            Value::String(s) => s.trim().is_empty(),
            Value::List(items) => items.is_empty(),
            Value::Object(map) => map.is_empty(),
            Value::Bool(_) | Value::Number(_) | Value::Handle(_) => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Number(n) => n.as_u64(),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Look up a key of an object value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|map| map.get(key))
    }

    /// True if a live handle appears anywhere inside this value.
    pub fn contains_handle(&self) -> bool {
        match self {
            Value::Handle(_) => true,
            Value::List(items) => items.iter().any(Value::contains_handle),
            Value::Object(map) => map.values().any(Value::contains_handle),
            _ => false,
        }
    }

    /// Convert to the transmissible JSON data model.
    pub fn to_json(&self) -> Result<serde_json::Value, NotTransmissible> {
        self.to_json_at("$")
    }

    fn to_json_at(&self, location: &str) -> Result<serde_json::Value, NotTransmissible> {
        Ok(match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => serde_json::Value::Number(n.clone()),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::List(items) => serde_json::Value::Array(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| item.to_json_at(&format!("{location}[{i}]")))
                    .collect::<Result<_, _>>()?,
            ),
            Value::Object(map) => {
                let mut out = serde_json::Map::new();
                for (key, item) in map {
                    out.insert(key.clone(), item.to_json_at(&format!("{location}.{key}"))?);
                }
                serde_json::Value::Object(out)
            }
            Value::Handle(handle) => {
                return Err(NotTransmissible {
                    location: location.to_string(),
                    handle_kind: handle.kind().to_string(),
                });
            }
        })
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Object(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(value.into())
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::Number(value.into())
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        Value::Number((value as u64).into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        serde_json::Number::from_f64(value).map_or(Value::Null, Value::Number)
    }
}

impl From<LiveHandle> for Value {
    fn from(value: LiveHandle) -> Self {
        Value::Handle(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_json() {
            Ok(json) => write!(f, "{json}"),
            Err(_) => f.write_str("<live value>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_round_trip_preserves_data() {
        let raw = json!({"title": "Shirt", "sizes": ["S", "M"], "price": 12.5, "live": true});
        let value = Value::from(raw.clone());
        assert_eq!(value.to_json().unwrap(), raw);
    }

    #[test]
    fn nested_handle_is_reported_with_location() {
        let mut images = BTreeMap::new();
        images.insert("upload".to_string(), Value::Handle(LiveHandle::new("upload", 42u32)));
        let value = Value::List(vec![Value::Null, Value::Object(images)]);

        let err = value.to_json().unwrap_err();
        assert_eq!(err.location, "$[1].upload");
        assert_eq!(err.handle_kind, "upload");
        assert!(value.contains_handle());
    }

    #[test]
    fn handles_compare_by_identity() {
        let handle = LiveHandle::new("editor", String::from("state"));
        let a = Value::Handle(handle.clone());
        let b = Value::Handle(handle);
        let c = Value::Handle(LiveHandle::new("editor", String::from("state")));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn emptiness() {
        assert!(Value::Null.is_empty());
        assert!(Value::from("  ").is_empty());
        assert!(!Value::from("Jane").is_empty());
        assert!(!Value::from(false).is_empty());
        assert!(Value::List(vec![]).is_empty());
    }
}
