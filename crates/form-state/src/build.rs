//! Constructing form state: from a persisted document, or record by record.

use std::sync::Arc;

use form_model::path::ROW_WILDCARD;
use form_model::{FieldKind, FieldName, FormError, Path, Result, RowId, Segment, Value};
use tracing::{debug, warn};

use crate::capability::FieldCapabilities;
use crate::field::{FieldRecord, FieldState};
use crate::registry::CapabilityRegistry;
use crate::tree::{FormState, NodeId, ROOT, ROW_ID_KEY, unique_row_seed};

/// Where the data for new nodes comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Origin {
    /// The persisted document; rows keep their stored identity.
    Loaded,
    /// An edit during the session; rows get fresh identities.
    Inserted,
}

impl FormState {
    /// Seed a form from a persisted document merged with schema defaults.
    ///
    /// Every shape declared in `registry` is instantiated. Document keys
    /// with no declaration are skipped; under a shape with no declarations
    /// at all, the structure is inferred from the data (objects become
    /// groups, lists become repeating groups).
    pub fn from_document(registry: Arc<CapabilityRegistry>, data: &Value) -> Result<Self> {
        Self::from_document_with_seed(registry, data, &unique_row_seed())
    }

    /// Like [`FormState::from_document`], minting row identities
    /// deterministically from `row_seed`.
    pub fn from_document_with_seed(
        registry: Arc<CapabilityRegistry>,
        data: &Value,
        row_seed: &str,
    ) -> Result<Self> {
        if !data.is_null() && data.as_object().is_none() {
            return Err(FormError::structural("a document must be an object of fields"));
        }
        let mut state = Self::new(registry).with_row_seed(row_seed);
        state.instantiate_children(ROOT, "", Some(data), Origin::Loaded)?;
        state.reindex();
        let fields = state.field_ids();
        state.evaluate_conditions(&fields);
        state.check_invariants()?;
        debug!(fields = state.len(), "Seeded form state from document");
        Ok(state)
    }

    pub(crate) fn instantiate_children(
        &mut self,
        parent: NodeId,
        parent_shape: &str,
        data: Option<&Value>,
        origin: Origin,
    ) -> Result<()> {
        let declared = self.registry().children(parent_shape);
        let in_row = self.node(parent).field.kind() == FieldKind::Row;
        let object = data.and_then(Value::as_object);

        if declared.is_empty() {
            for (key, value) in object.into_iter().flatten() {
                if in_row && key == ROW_ID_KEY {
                    continue;
                }
                self.instantiate_field(parent, parent_shape, key, None, Some(value), origin)?;
            }
            return Ok(());
        }

        for (name, capabilities) in &declared {
            let child_data = object.and_then(|map| map.get(name));
            self.instantiate_field(
                parent,
                parent_shape,
                name,
                Some(Arc::clone(capabilities)),
                child_data,
                origin,
            )?;
        }
        for key in object.into_iter().flat_map(|map| map.keys()) {
            let known = (in_row && key == ROW_ID_KEY) || declared.iter().any(|(name, _)| name == key);
            if !known {
                debug!(shape = parent_shape, key = %key, "Skipping undeclared document key");
            }
        }
        Ok(())
    }

    fn instantiate_field(
        &mut self,
        parent: NodeId,
        parent_shape: &str,
        name: &str,
        capabilities: Option<Arc<FieldCapabilities>>,
        data: Option<&Value>,
        origin: Origin,
    ) -> Result<NodeId> {
        let name = FieldName::new(name)?;
        let shape = if parent_shape.is_empty() {
            name.as_str().to_string()
        } else {
            format!("{parent_shape}.{name}")
        };
        let default = capabilities
            .as_deref()
            .map(|caps| caps.default_value().clone())
            .filter(|value| !value.is_null());
        let source = data.filter(|value| !value.is_null()).or(default.as_ref());
        let kind = capabilities
            .as_deref()
            .map_or_else(|| infer_kind(source), FieldCapabilities::kind);

        match kind {
            FieldKind::Leaf => {
                let value = source.cloned().unwrap_or_default();
                let field = FieldState::from_record(FieldRecord::leaf(value), capabilities);
                let id = self.alloc(Some(name), field);
                self.attach(parent, id, None);
                Ok(id)
            }
            FieldKind::Group => {
                if let Some(value) = source.filter(|value| value.as_object().is_none()) {
                    warn!(
                        shape = %shape,
                        found = value.type_name(),
                        "Dropping document data for a group that is not an object"
                    );
                }
                let id = self.alloc(Some(name), FieldState::group(capabilities));
                self.attach(parent, id, None);
                self.instantiate_children(id, &shape, source, origin)?;
                Ok(id)
            }
            FieldKind::Array => {
                if let Some(value) = source.filter(|value| value.as_list().is_none()) {
                    warn!(
                        shape = %shape,
                        found = value.type_name(),
                        "Dropping document data for a repeating group that is not a list"
                    );
                }
                let items = source.and_then(Value::as_list).unwrap_or_default().to_vec();
                let id = self.alloc(Some(name), FieldState::array(items.len(), capabilities));
                self.attach(parent, id, None);
                for item in &items {
                    self.instantiate_row(id, &shape, Some(item), origin, None)?;
                }
                Ok(id)
            }
            FieldKind::Row => Err(FormError::structural(format!(
                "'{shape}' is declared as a row outside a repeating group"
            ))),
        }
    }

    /// Create one row of `array` (whose shape is `array_shape`) and its
    /// fields. The array's row count is left for the caller to update.
    pub(crate) fn instantiate_row(
        &mut self,
        array: NodeId,
        array_shape: &str,
        data: Option<&Value>,
        origin: Origin,
        position: Option<usize>,
    ) -> Result<NodeId> {
        let row_shape = format!("{array_shape}.{ROW_WILDCARD}");
        let stored = match origin {
            Origin::Loaded => data
                .and_then(|value| value.get(ROW_ID_KEY))
                .and_then(Value::as_str)
                .and_then(RowId::from_hex),
            Origin::Inserted => None,
        };
        let row_id = self.claim_row_id(stored);
        if stored.is_some_and(|stored| stored != row_id) {
            warn!(shape = %row_shape, row_id = %row_id, "Duplicate row identity in document, minted a fresh one");
        }

        let capabilities = self.registry().get(&row_shape);
        let row = self.alloc(
            None,
            FieldState::row(row_id, origin == Origin::Loaded, capabilities),
        );
        self.attach(array, row, position);
        self.instantiate_children(row, &row_shape, data, origin)?;
        Ok(row)
    }
}

fn infer_kind(data: Option<&Value>) -> FieldKind {
    match data {
        Some(Value::Object(_)) => FieldKind::Group,
        Some(Value::List(_)) => FieldKind::Array,
        _ => FieldKind::Leaf,
    }
}

/// Builds a form state record by record, in order.
///
/// Used to reconstruct a state received across a context boundary: every
/// parent must be inserted before its children, and rows of a repeating
/// group must arrive in index order. Capabilities are looked up in the
/// registry by each path's shape.
#[derive(Debug)]
pub struct FormStateBuilder {
    state: FormState,
}

impl FormStateBuilder {
    pub fn new(registry: Arc<CapabilityRegistry>) -> Self {
        Self {
            state: FormState::new(registry),
        }
    }

    #[must_use]
    pub fn row_seed(mut self, seed: impl Into<String>) -> Self {
        self.state = self.state.with_row_seed(seed);
        self
    }

    pub fn insert(&mut self, path: &Path, record: FieldRecord) -> Result<()> {
        let Some(parent_path) = path.parent() else {
            return Err(FormError::structural("the root path cannot hold a field"));
        };
        if self.state.find(path).is_some() {
            return Err(FormError::structural(format!("'{path}' appears twice")));
        }
        let Some(parent) = self.state.find(&parent_path) else {
            return Err(FormError::structural(format!(
                "'{path}' arrived before its parent '{parent_path}'"
            )));
        };
        let parent_kind = self.state.node(parent).field.kind();
        let capabilities = self.state.registry().lookup(path);
        if let Some(caps) = &capabilities
            && caps.kind() != record.kind
        {
            warn!(
                path = %path,
                declared = caps.kind().label(),
                received = record.kind.label(),
                "Received field kind differs from its declaration"
            );
        }

        let id = match path.last_segment() {
            Some(Segment::Index(index)) => {
                if parent_kind != FieldKind::Array || record.kind != FieldKind::Row {
                    return Err(FormError::structural(format!(
                        "row '{path}' must be a row inside a repeating group"
                    )));
                }
                let expected = self.state.node(parent).children.len();
                if index != expected {
                    return Err(FormError::structural(format!(
                        "row '{path}' arrived out of order (expected index {expected})"
                    )));
                }
                let stored = record.value.as_str().and_then(RowId::from_hex);
                let row_id = self.state.claim_row_id(stored);
                if stored != Some(row_id) {
                    warn!(path = %path, row_id = %row_id, "Row arrived without a usable identity, minted a fresh one");
                }
                let mut field = FieldState::from_record(record, capabilities);
                field.row_id = Some(row_id);
                field.value = Value::from(row_id.to_hex());
                self.state.alloc(None, field)
            }
            Some(Segment::Name(name)) => {
                if !parent_kind.is_container() {
                    return Err(FormError::structural(format!(
                        "'{path}' sits below {} '{parent_path}'",
                        parent_kind.label()
                    )));
                }
                if record.kind == FieldKind::Row {
                    return Err(FormError::structural(format!(
                        "row '{path}' must be addressed by an index"
                    )));
                }
                if parent_kind == FieldKind::Row && name == ROW_ID_KEY {
                    return Err(FormError::structural(format!(
                        "'{path}' collides with the row's identity key"
                    )));
                }
                let name = FieldName::new(name)?;
                self.state
                    .alloc(Some(name), FieldState::from_record(record, capabilities))
            }
            None => return Err(FormError::structural("the root path cannot hold a field")),
        };

        self.state.attach(parent, id, None);
        self.state.reindex_insert(path.clone(), id);
        Ok(())
    }

    /// Finish building; fails if the result breaks a tree invariant (for
    /// example a row count that does not match the rows received).
    pub fn finish(mut self) -> Result<FormState> {
        self.state.reindex();
        self.state.check_invariants()?;
        Ok(self.state)
    }
}
