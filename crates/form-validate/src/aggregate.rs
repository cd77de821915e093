//! Form-level validity.
//!
//! Only visible fields count: a field hidden by its own condition, or by a
//! hidden ancestor, never blocks the form. Its validity is left as it was.

use form_model::Path;
use form_state::{FieldState, FormState};

fn blocking(state: &FormState) -> impl Iterator<Item = (Path, &FieldState)> + '_ {
    state.iter().filter(|(path, field)| {
        field.kind().is_validated()
            && !field.validity().is_valid()
            && matches!(state.is_visible(path), Ok(true))
    })
}

/// Every visible field, rows of visible groups included, is `valid`.
pub fn form_is_valid(state: &FormState) -> bool {
    blocking(state).next().is_none()
}

/// Paths of the visible fields that are not `valid` yet.
pub fn invalid_fields(state: &FormState) -> Vec<Path> {
    blocking(state).map(|(path, _)| path).collect()
}

/// Failure reasons of visible invalid fields.
pub fn field_errors(state: &FormState) -> Vec<(Path, String)> {
    blocking(state)
        .filter_map(|(path, field)| field.validity().reason().map(|reason| (path, reason.to_string())))
        .collect()
}
