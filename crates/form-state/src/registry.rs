//! Field capability registry keyed by structural shape.
//!
//! Paths are generated per row, so a registry keyed on literal paths would
//! miss rows created after it was built. Shapes replace every row index with
//! `*` (`variants.*.images.*.image`), which covers every row at once.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use form_model::path::ROW_WILDCARD;
use form_model::{FieldKind, FieldName, FormError, Path, Result};

use crate::capability::FieldCapabilities;
use crate::tree::ROW_ID_KEY;

/// Registry of field capabilities indexed by shape.
///
/// Read-only once built; share it between sessions behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct CapabilityRegistry {
    entries: HashMap<String, Arc<FieldCapabilities>>,
    order: Vec<String>,
    implicit: HashSet<String>,
}

impl CapabilityRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the capabilities of one shape.
    ///
    /// Parents must be declared before their children. Declaring an array
    /// also declares a plain row shape beneath it, which may be replaced once
    /// by an explicit row declaration (to attach a render hook, say).
    pub fn declare(&mut self, shape: &str, capabilities: FieldCapabilities) -> Result<()> {
        let shape = canonical_shape(shape)?;
        if capabilities.field_type().is_empty() {
            return Err(registry_error(&shape, "field type identity is empty"));
        }

        let is_row_shape = shape == ROW_WILDCARD || shape.ends_with(".*");
        if is_row_shape != (capabilities.kind() == FieldKind::Row) {
            return Err(registry_error(
                &shape,
                "row capabilities belong exactly to shapes ending in '*'",
            ));
        }

        if let Some((parent, name)) = shape.rsplit_once('.')
            && name == ROW_ID_KEY
            && parent.ends_with(ROW_WILDCARD)
        {
            return Err(registry_error(
                &shape,
                format!("'{ROW_ID_KEY}' is reserved for row identity"),
            ));
        }

        if self.entries.contains_key(&shape) && !self.implicit.contains(&shape) {
            return Err(registry_error(&shape, "shape is already declared"));
        }

        if let Some(parent) = parent_shape(&shape) {
            let Some(parent_caps) = self.entries.get(parent) else {
                return Err(registry_error(
                    &shape,
                    format!("parent shape '{parent}' is not declared"),
                ));
            };
            let parent_ok = if is_row_shape {
                parent_caps.kind() == FieldKind::Array
            } else {
                parent_caps.kind().is_container()
            };
            if !parent_ok {
                return Err(registry_error(
                    &shape,
                    format!(
                        "parent shape '{parent}' is a {} and cannot hold this field",
                        parent_caps.kind().label()
                    ),
                ));
            }
        }

        if capabilities.kind() == FieldKind::Array {
            let row_shape = format!("{shape}.{ROW_WILDCARD}");
            let row = FieldCapabilities::row(format!("{}-row", capabilities.field_type()));
            self.insert(row_shape.clone(), row);
            self.implicit.insert(row_shape);
        }

        self.implicit.remove(&shape);
        self.insert(shape, capabilities);
        Ok(())
    }

    /// Chaining form of [`CapabilityRegistry::declare`].
    pub fn with(mut self, shape: &str, capabilities: FieldCapabilities) -> Result<Self> {
        self.declare(shape, capabilities)?;
        Ok(self)
    }

    fn insert(&mut self, shape: String, capabilities: FieldCapabilities) {
        if self.entries.insert(shape.clone(), Arc::new(capabilities)).is_none() {
            self.order.push(shape);
        }
    }

    /// Capabilities for the shape of `path`.
    pub fn lookup(&self, path: &Path) -> Option<Arc<FieldCapabilities>> {
        self.entries.get(&path.shape()).cloned()
    }

    /// Capabilities for a shape string.
    pub fn get(&self, shape: &str) -> Option<Arc<FieldCapabilities>> {
        self.entries.get(shape).cloned()
    }

    /// Named fields declared directly beneath `parent` (`""` for the top
    /// level), in declaration order.
    pub fn children(&self, parent: &str) -> Vec<(String, Arc<FieldCapabilities>)> {
        self.order
            .iter()
            .filter(|shape| parent_shape(shape).unwrap_or("") == parent)
            .filter_map(|shape| {
                let name = shape.rsplit('.').next().unwrap_or(shape);
                if name == ROW_WILDCARD {
                    return None;
                }
                self.entries
                    .get(shape)
                    .map(|caps| (name.to_string(), Arc::clone(caps)))
            })
            .collect()
    }

    /// Number of declared shapes, implicit row shapes included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over shapes and capabilities in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<FieldCapabilities>)> {
        self.order
            .iter()
            .filter_map(|shape| self.entries.get(shape).map(|caps| (shape.as_str(), caps)))
    }
}

fn registry_error(shape: &str, message: impl Into<String>) -> FormError {
    FormError::Registry {
        shape: shape.to_string(),
        message: message.into(),
    }
}

fn parent_shape(shape: &str) -> Option<&str> {
    shape.rsplit_once('.').map(|(parent, _)| parent)
}

fn canonical_shape(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(registry_error(raw, "shape is empty"));
    }
    let mut segments: Vec<String> = Vec::new();
    for segment in trimmed.split('.') {
        if segment.trim() == ROW_WILDCARD {
            if segments.last().is_none_or(|previous| previous == ROW_WILDCARD) {
                return Err(registry_error(raw, "'*' must follow a named segment"));
            }
            segments.push(ROW_WILDCARD.to_string());
            continue;
        }
        let name = FieldName::new(segment).map_err(|err| registry_error(raw, err.to_string()))?;
        segments.push(name.as_str().to_string());
    }
    Ok(segments.join("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags_registry() -> CapabilityRegistry {
        CapabilityRegistry::new()
            .with("title", FieldCapabilities::leaf("text"))
            .unwrap()
            .with("tags", FieldCapabilities::array("tags"))
            .unwrap()
            .with("tags.*.value", FieldCapabilities::leaf("text"))
            .unwrap()
    }

    #[test]
    fn lookup_matches_every_row() {
        let registry = tags_registry();
        for raw in ["tags.0.value", "tags.17.value"] {
            let caps = registry.lookup(&Path::new(raw).unwrap()).unwrap();
            assert_eq!(caps.field_type().as_str(), "text");
        }
        let row = registry.lookup(&Path::new("tags.3").unwrap()).unwrap();
        assert_eq!(row.kind(), FieldKind::Row);
        assert!(registry.lookup(&Path::new("missing").unwrap()).is_none());
    }

    #[test]
    fn children_skip_row_shapes_and_keep_order() {
        let registry = tags_registry();
        let top: Vec<String> = registry.children("").into_iter().map(|(name, _)| name).collect();
        assert_eq!(top, ["title", "tags"]);
        assert!(registry.children("tags").is_empty());
        let row: Vec<String> = registry.children("tags.*").into_iter().map(|(name, _)| name).collect();
        assert_eq!(row, ["value"]);
    }

    #[test]
    fn declaration_conflicts_are_rejected() {
        let mut registry = tags_registry();
        assert!(matches!(
            registry.declare("title", FieldCapabilities::leaf("text")),
            Err(FormError::Registry { .. })
        ));
        assert!(registry.declare("title.sub", FieldCapabilities::leaf("text")).is_err());
        assert!(registry.declare("missing.x", FieldCapabilities::leaf("text")).is_err());
        assert!(registry.declare("title.*", FieldCapabilities::row("r")).is_err());
        assert!(registry.declare("other", FieldCapabilities::leaf("  ")).is_err());
        assert!(registry.declare("*", FieldCapabilities::row("r")).is_err());
    }

    #[test]
    fn row_fields_cannot_shadow_row_identity() {
        let mut registry = tags_registry();
        let err = registry
            .declare("tags.*.id", FieldCapabilities::leaf("text"))
            .unwrap_err();
        assert!(matches!(err, FormError::Registry { ref shape, .. } if shape == "tags.*.id"));
        assert!(registry.get("tags.*.id").is_none());

        registry.declare("id", FieldCapabilities::leaf("text")).unwrap();
        registry.declare("tags.*.sku", FieldCapabilities::group("sku")).unwrap();
        registry.declare("tags.*.sku.id", FieldCapabilities::leaf("text")).unwrap();
    }

    #[test]
    fn implicit_row_can_be_replaced_once() {
        let mut registry = tags_registry();
        registry.declare("tags.*", FieldCapabilities::row("tag-row")).unwrap();
        assert_eq!(registry.get("tags.*").unwrap().field_type().as_str(), "tag-row");
        assert!(registry.declare("tags.*", FieldCapabilities::row("again")).is_err());
    }
}
