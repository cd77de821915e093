//! The form state store: sole mutator of one form's state.

use form_model::{FormError, Generation, Path, Result, Validity, Value};
use tracing::{debug, trace};

use crate::action::FormAction;
use crate::field::FieldState;
use crate::request::Dispatched;
use crate::tree::FormState;

/// Owns one form's state and applies actions to it, one at a time.
///
/// Each dispatch either commits completely or, on error, leaves the state
/// exactly as it was.
#[derive(Debug, Clone)]
pub struct FormStore {
    state: FormState,
    structural_changes: usize,
}

impl FormStore {
    pub fn new(state: FormState) -> Self {
        Self {
            state,
            structural_changes: 0,
        }
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn into_state(self) -> FormState {
        self.state
    }

    pub fn get_value(&self, path: &Path) -> Result<&Value> {
        self.state.get_value(path)
    }

    pub fn get_field(&self, path: &Path) -> Result<&FieldState> {
        self.state.get_field(path)
    }

    /// A field is dirty, or rows were added, removed or moved since load.
    pub fn is_modified(&self) -> bool {
        self.structural_changes > 0 || self.state.is_dirty()
    }

    /// Apply one action atomically.
    pub fn dispatch(&mut self, action: FormAction) -> Result<Dispatched> {
        trace!(action = action.name(), "Dispatching form action");
        match action {
            FormAction::SetValue { path, value } => self.set_value(&path, value),
            FormAction::ReplaceState(state) => self.replace_state(*state),
            FormAction::SetCondition { path, passes } => self.set_condition(&path, passes),
            FormAction::SetValidity {
                path,
                generation,
                validity,
            } => Ok(self.set_validity(&path, generation, validity)),
            FormAction::AddServerErrors(errors) => self.add_server_errors(errors),
            FormAction::InsertRow {
                group,
                index,
                initial,
            } => self.commit(|state| state.insert_row(&group, index, &initial)),
            FormAction::RemoveRow { group, index } => {
                self.commit(|state| state.remove_row(&group, index))
            }
            FormAction::MoveRow { group, from, to } => {
                self.commit(|state| state.move_row(&group, from, to))
            }
            FormAction::DuplicateRow { group, index } => {
                self.commit(|state| state.duplicate_row(&group, index))
            }
            FormAction::SetRowCount { group, count } => {
                self.commit(|state| state.set_row_count(&group, count))
            }
        }
    }

    /// Apply a structural change to a copy and swap it in only if the
    /// result still satisfies every tree invariant.
    fn commit<F>(&mut self, apply: F) -> Result<Dispatched>
    where
        F: FnOnce(&mut FormState) -> Result<Dispatched>,
    {
        let mut next = self.state.clone();
        let outcome = apply(&mut next)?;
        next.check_invariants()?;
        self.state = next;
        if outcome.is_structural() {
            self.structural_changes += 1;
        }
        Ok(outcome)
    }

    fn set_value(&mut self, path: &Path, value: Value) -> Result<Dispatched> {
        let id = self.state.find_field(path)?;
        let kind = self.state.node(id).field.kind();
        if !kind.accepts_value() {
            return Err(FormError::structural(format!(
                "SET_VALUE cannot target {} '{path}'",
                kind.label()
            )));
        }

        let generation = self.state.tick();
        let field = &mut self.state.node_mut(id).field;
        field.value = value;
        field.validity = Validity::Unvalidated;
        field.generation = generation;

        let flipped = self.state.refresh_dependents(id);
        Ok(Dispatched {
            validations: self.state.validation_requests(&[id]),
            visibility_changed: flipped.into_iter().map(|id| self.state.path_of(id)).collect(),
            ..Dispatched::default()
        })
    }

    fn replace_state(&mut self, mut next: FormState) -> Result<Dispatched> {
        next.check_invariants()?;
        next.clock = next.clock.max(self.state.clock);
        next.inherit_row_minting(&self.state);
        next.restamp_all();
        let validations = next.pending_validations();
        debug!(fields = next.len(), pending = validations.len(), "Replaced form state");
        self.state = next;
        self.structural_changes = 0;
        Ok(Dispatched {
            validations,
            ..Dispatched::default()
        })
    }

    fn set_condition(&mut self, path: &Path, passes: bool) -> Result<Dispatched> {
        let id = self.state.find_field(path)?;
        let field = &mut self.state.node_mut(id).field;
        let flipped = field.passes_condition != passes;
        field.passes_condition = passes;
        Ok(Dispatched {
            visibility_changed: if flipped { vec![path.clone()] } else { Vec::new() },
            ..Dispatched::default()
        })
    }

    fn set_validity(&mut self, path: &Path, generation: Generation, validity: Validity) -> Dispatched {
        let Ok(id) = self.state.find_field(path) else {
            debug!(path = %path, "Discarding validation result for a field that no longer exists");
            return Dispatched::discarded();
        };
        let field = &mut self.state.node_mut(id).field;
        if field.generation != generation {
            debug!(
                path = %path,
                captured = %generation,
                current = %field.generation,
                "Discarding stale validation result"
            );
            return Dispatched::discarded();
        }
        field.validity = validity;
        Dispatched::default()
    }

    fn add_server_errors(&mut self, errors: Vec<(Path, String)>) -> Result<Dispatched> {
        let ids = errors
            .iter()
            .map(|(path, _)| self.state.find_field(path))
            .collect::<Result<Vec<_>>>()?;
        for (id, (_, message)) in ids.into_iter().zip(errors) {
            self.state.node_mut(id).field.validity = Validity::Invalid(message);
        }
        Ok(Dispatched::default())
    }
}
