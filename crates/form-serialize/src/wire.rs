//! The cross-boundary wire format.
//!
//! A serialized form is a JSON object mapping path strings to field records,
//! in tree order:
//!
//! ```text
//! {
//!   "name":   {"value": "Jane", "initialValue": "", "validity": "valid",
//!              "passesCondition": true, "rowCount": null},
//!   "tags":   {"value": 1, ..., "rowCount": 1},
//!   "tags.0": {"value": "<row id hex>", ...},
//!   ...
//! }
//! ```
//!
//! Records carry data only. Validators, conditions and render hooks never
//! appear here; the receiving side looks them up in its own registry.

use std::collections::HashMap;
use std::fmt;

use form_model::{Path, Validity};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Data attributes of one field on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SerializedField {
    pub value: serde_json::Value,
    pub initial_value: serde_json::Value,
    pub validity: Validity,
    pub passes_condition: bool,
    /// `null` for everything but repeating groups.
    pub row_count: Option<usize>,
}

/// Ordered mapping from path to field record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SerializedState {
    entries: Vec<(Path, SerializedField)>,
    /// Position of each path in `entries`.
    index: HashMap<Path, usize>,
}

impl SerializedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record, or replace the record already stored at `path`
    /// in place. Returns the replaced record.
    pub fn push(&mut self, path: Path, field: SerializedField) -> Option<SerializedField> {
        if let Some(&position) = self.index.get(&path) {
            return Some(std::mem::replace(&mut self.entries[position].1, field));
        }
        self.index.insert(path.clone(), self.entries.len());
        self.entries.push((path, field));
        None
    }

    pub fn get(&self, path: &Path) -> Option<&SerializedField> {
        self.index.get(path).map(|&position| &self.entries[position].1)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.index.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Path, &SerializedField)> {
        self.entries.iter().map(|(path, field)| (path, field))
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.entries.iter().map(|(path, _)| path)
    }

    /// Pretty JSON text of this state.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

impl FromIterator<(Path, SerializedField)> for SerializedState {
    fn from_iter<I: IntoIterator<Item = (Path, SerializedField)>>(iter: I) -> Self {
        let mut state = Self::new();
        for (path, field) in iter {
            state.push(path, field);
        }
        state
    }
}

impl IntoIterator for SerializedState {
    type Item = (Path, SerializedField);
    type IntoIter = std::vec::IntoIter<(Path, SerializedField)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Serialize for SerializedState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (path, field) in &self.entries {
            map.serialize_entry(path.as_str(), field)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for SerializedState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct StateVisitor;

        impl<'de> Visitor<'de> for StateVisitor {
            type Value = SerializedState;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map from field path to field record")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let capacity = access.size_hint().unwrap_or(0);
                let mut state = SerializedState {
                    entries: Vec::with_capacity(capacity),
                    index: HashMap::with_capacity(capacity),
                };
                while let Some((path, field)) = access.next_entry::<Path, SerializedField>()? {
                    if state.contains(&path) {
                        return Err(serde::de::Error::custom(format!(
                            "path '{path}' appears twice"
                        )));
                    }
                    state.push(path, field);
                }
                Ok(state)
            }
        }

        deserializer.deserialize_map(StateVisitor)
    }
}
