//! Crossing the serialization boundary.
//!
//! [`serialize`] copies the data attributes of every field and leaves all
//! capabilities behind. [`deserialize`] rebuilds a live state and
//! reattaches capabilities from the receiving side's registry by shape, so
//! rows created after the registry was built are covered too.

use std::collections::HashSet;
use std::sync::Arc;

use form_model::{FieldKind, FormError, Path, Result, Value};
use form_state::{
    CapabilityRegistry, FieldCapabilities, FieldRecord, FieldState, FormState,
    FormStateBuilder, unique_row_seed,
};
use tracing::{debug, warn};

use crate::wire::{SerializedField, SerializedState};

/// Serialize `state`, dropping fields whose values cannot be transmitted.
pub fn serialize(state: &FormState) -> SerializedState {
    serialize_with_diagnostics(state).0
}

/// Serialize `state` and report every field that had to be stripped.
///
/// Each diagnostic is a [`FormError::Serialization`] naming the field and
/// the location of the live handle inside its value.
pub fn serialize_with_diagnostics(state: &FormState) -> (SerializedState, Vec<FormError>) {
    let mut serialized = SerializedState::new();
    let mut diagnostics = Vec::new();

    for (path, field) in state.iter() {
        match serialize_field(&path, field) {
            Ok(record) => {
                serialized.push(path, record);
            }
            Err(err) => {
                warn!(path = %path, "Stripped non-transmissible field: {}", err);
                diagnostics.push(err);
            }
        }
    }

    debug!(
        fields = serialized.len(),
        stripped = diagnostics.len(),
        "Serialized form state"
    );
    (serialized, diagnostics)
}

fn serialize_field(path: &Path, field: &FieldState) -> Result<SerializedField> {
    let not_transmissible = |err: form_model::NotTransmissible| FormError::Serialization {
        path: path.to_string(),
        reason: err.to_string(),
    };
    Ok(SerializedField {
        value: field.value().to_json().map_err(not_transmissible)?,
        initial_value: field.initial_value().to_json().map_err(not_transmissible)?,
        validity: field.validity().clone(),
        passes_condition: field.passes_condition(),
        row_count: field.row_count(),
    })
}

/// Rebuild a live state, taking capabilities from `registry`.
pub fn deserialize(serialized: &SerializedState, registry: Arc<CapabilityRegistry>) -> Result<FormState> {
    deserialize_with_seed(serialized, registry, &unique_row_seed())
}

/// Like [`deserialize`], minting any missing row identities from `seed`.
pub fn deserialize_with_seed(
    serialized: &SerializedState,
    registry: Arc<CapabilityRegistry>,
    seed: &str,
) -> Result<FormState> {
    let parents: HashSet<Path> = serialized.paths().filter_map(Path::parent).collect();

    // Parents before children; siblings keep their wire order.
    let mut entries: Vec<(&Path, &SerializedField)> = serialized.iter().collect();
    entries.sort_by_key(|(path, _)| path.depth());

    let mut builder = FormStateBuilder::new(Arc::clone(&registry)).row_seed(seed);
    for (path, field) in entries {
        let capabilities = registry.lookup(path);
        if capabilities.is_none() && !registry.is_empty() {
            warn!(path = %path, shape = %path.shape(), "No capabilities registered for shape");
        }
        let kind = infer_kind(path, field, capabilities.as_deref(), parents.contains(path));
        builder.insert(
            path,
            FieldRecord {
                kind,
                value: Value::from(field.value.clone()),
                initial_value: Value::from(field.initial_value.clone()),
                validity: field.validity.clone(),
                passes_condition: field.passes_condition,
                row_count: field.row_count,
            },
        )?;
    }

    let state = builder.finish()?;
    debug!(fields = state.len(), "Rehydrated form state");
    Ok(state)
}

fn infer_kind(
    path: &Path,
    field: &SerializedField,
    capabilities: Option<&FieldCapabilities>,
    has_children: bool,
) -> FieldKind {
    if path.row_index().is_some() {
        FieldKind::Row
    } else if field.row_count.is_some() {
        FieldKind::Array
    } else if has_children || capabilities.is_some_and(|caps| caps.kind() == FieldKind::Group) {
        FieldKind::Group
    } else {
        FieldKind::Leaf
    }
}
