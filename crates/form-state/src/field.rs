//! Live state of one addressable node.

use std::sync::Arc;

use form_model::{FieldKind, FieldTypeId, Generation, RowId, Validity, Value};

use crate::capability::{FieldCapabilities, Validator};

/// The data attributes of a field: everything that may cross a context
/// boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRecord {
    pub kind: FieldKind,
    pub value: Value,
    pub initial_value: Value,
    pub validity: Validity,
    pub passes_condition: bool,
    /// Present for repeating groups only.
    pub row_count: Option<usize>,
}

impl FieldRecord {
    pub fn leaf(value: impl Into<Value>) -> Self {
        let value = value.into();
        Self {
            kind: FieldKind::Leaf,
            initial_value: value.clone(),
            value,
            validity: Validity::Unvalidated,
            passes_condition: true,
            row_count: None,
        }
    }
}

/// State of one node of the form tree.
///
/// Conventions per kind:
/// - `Leaf`: arbitrary value, starts `unvalidated`.
/// - `Group`: value is null, always `valid`.
/// - `Array`: value is the row count as a number, starts `unvalidated`.
/// - `Row`: value is the row identity in hex; `initial_value` is null for
///   rows created during the session.
#[derive(Debug, Clone)]
pub struct FieldState {
    pub(crate) kind: FieldKind,
    pub(crate) value: Value,
    pub(crate) initial_value: Value,
    pub(crate) validity: Validity,
    pub(crate) generation: Generation,
    pub(crate) passes_condition: bool,
    pub(crate) row_count: Option<usize>,
    pub(crate) row_id: Option<RowId>,
    pub(crate) capabilities: Option<Arc<FieldCapabilities>>,
}

impl FieldState {
    pub(crate) fn from_record(record: FieldRecord, capabilities: Option<Arc<FieldCapabilities>>) -> Self {
        Self {
            kind: record.kind,
            value: record.value,
            initial_value: record.initial_value,
            validity: record.validity,
            generation: Generation::default(),
            passes_condition: record.passes_condition,
            row_count: record.row_count,
            row_id: None,
            capabilities,
        }
    }

    pub(crate) fn group(capabilities: Option<Arc<FieldCapabilities>>) -> Self {
        Self::from_record(
            FieldRecord {
                kind: FieldKind::Group,
                value: Value::Null,
                initial_value: Value::Null,
                validity: Validity::Valid,
                passes_condition: true,
                row_count: None,
            },
            capabilities,
        )
    }

    pub(crate) fn array(row_count: usize, capabilities: Option<Arc<FieldCapabilities>>) -> Self {
        Self::from_record(
            FieldRecord {
                kind: FieldKind::Array,
                value: Value::from(row_count),
                initial_value: Value::from(row_count),
                validity: Validity::Unvalidated,
                passes_condition: true,
                row_count: Some(row_count),
            },
            capabilities,
        )
    }

    pub(crate) fn row(id: RowId, loaded: bool, capabilities: Option<Arc<FieldCapabilities>>) -> Self {
        let value = Value::from(id.to_hex());
        let mut field = Self::from_record(
            FieldRecord {
                kind: FieldKind::Row,
                initial_value: if loaded { value.clone() } else { Value::Null },
                value,
                validity: Validity::Valid,
                passes_condition: true,
                row_count: None,
            },
            capabilities,
        );
        field.row_id = Some(id);
        field
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn initial_value(&self) -> &Value {
        &self.initial_value
    }

    pub fn validity(&self) -> &Validity {
        &self.validity
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn passes_condition(&self) -> bool {
        self.passes_condition
    }

    pub fn row_count(&self) -> Option<usize> {
        self.row_count
    }

    /// Stable identity, for rows.
    pub fn row_id(&self) -> Option<RowId> {
        self.row_id
    }

    pub fn capabilities(&self) -> Option<&Arc<FieldCapabilities>> {
        self.capabilities.as_ref()
    }

    pub fn field_type(&self) -> Option<&FieldTypeId> {
        self.capabilities.as_deref().map(FieldCapabilities::field_type)
    }

    pub fn validator(&self) -> Option<&Validator> {
        self.capabilities.as_deref().and_then(FieldCapabilities::validator)
    }

    /// The current value differs from the value at load time.
    pub fn is_dirty(&self) -> bool {
        self.value != self.initial_value
    }

    /// Copy out the transmissible attributes.
    pub fn record(&self) -> FieldRecord {
        FieldRecord {
            kind: self.kind,
            value: self.value.clone(),
            initial_value: self.initial_value.clone(),
            validity: self.validity.clone(),
            passes_condition: self.passes_condition,
            row_count: self.row_count,
        }
    }

    pub(crate) fn needs_validation(&self) -> bool {
        self.kind.is_validated() && self.validity == Validity::Unvalidated
    }

    pub(crate) fn set_row_count(&mut self, count: usize) {
        self.row_count = Some(count);
        self.value = Value::from(count);
    }
}

impl PartialEq for FieldState {
    fn eq(&self, other: &Self) -> bool {
        let same_capabilities = match (&self.capabilities, &other.capabilities) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        self.kind == other.kind
            && self.value == other.value
            && self.initial_value == other.initial_value
            && self.validity == other.validity
            && self.generation == other.generation
            && self.passes_condition == other.passes_condition
            && self.row_count == other.row_count
            && self.row_id == other.row_id
            && same_capabilities
    }
}
