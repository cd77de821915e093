//! What a dispatch hands back to its caller.

use std::sync::Arc;

use form_model::{Generation, Path, Validity, Value};

use crate::action::FormAction;
use crate::capability::{ValidationContext, Validator};
use crate::tree::{FormState, NodeId};

/// A field that needs validating, captured at dispatch time.
///
/// The result must come back as `SET_VALIDITY` carrying `generation`; the
/// store drops it if the field has changed since.
#[derive(Debug, Clone)]
pub struct ValidationRequest {
    pub path: Path,
    pub generation: Generation,
    pub value: Value,
    /// `None` for fields without a validator; those are valid as soon as
    /// the request is resolved.
    pub validator: Option<Validator>,
    pub context: ValidationContext,
}

impl ValidationRequest {
    /// Resolve without waiting. `None` if the validator is asynchronous.
    pub fn run_sync(&self) -> Option<Validity> {
        match &self.validator {
            None => Some(Validity::Valid),
            Some(Validator::Sync(validate)) => {
                Some(Validity::from_outcome(validate(&self.value, &self.context)))
            }
            Some(Validator::Async(_)) => None,
        }
    }

    /// The `SET_VALIDITY` action reporting `validity` for this request.
    pub fn resolve(&self, validity: Validity) -> FormAction {
        FormAction::SetValidity {
            path: self.path.clone(),
            generation: self.generation,
            validity,
        }
    }
}

/// One node whose path changed in a structural action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathRewrite {
    pub from: Path,
    pub to: Path,
}

/// Outcome of one dispatched action.
#[derive(Debug, Default)]
pub struct Dispatched {
    /// Validations to run for fields stamped by this action.
    pub validations: Vec<ValidationRequest>,
    /// Old and new paths of every surviving node that moved.
    pub rewrites: Vec<PathRewrite>,
    /// Rows destroyed by this action, at their paths before it.
    pub removed: Vec<Path>,
    /// Rows created by this action, at their paths after it.
    pub inserted: Vec<Path>,
    /// Fields whose visibility flipped.
    pub visibility_changed: Vec<Path>,
    /// A validation result arrived for a field that has since changed.
    pub discarded: bool,
}

impl Dispatched {
    pub(crate) fn discarded() -> Self {
        Self {
            discarded: true,
            ..Self::default()
        }
    }

    /// The rows of some repeating group changed.
    pub fn is_structural(&self) -> bool {
        !self.rewrites.is_empty() || !self.removed.is_empty() || !self.inserted.is_empty()
    }

    /// Where a path held before this action lives now. `None` if it was
    /// destroyed.
    pub fn rewrite_path(&self, path: &Path) -> Option<Path> {
        if self.removed.iter().any(|row| path.is_within(row)) {
            return None;
        }
        let moved = self
            .rewrites
            .iter()
            .find(|rewrite| rewrite.from == *path)
            .map(|rewrite| rewrite.to.clone());
        Some(moved.unwrap_or_else(|| path.clone()))
    }
}

impl FormState {
    /// Requests for the nodes of `ids` that are still `unvalidated`.
    pub(crate) fn validation_requests(&self, ids: &[NodeId]) -> Vec<ValidationRequest> {
        let wanted: Vec<NodeId> = ids
            .iter()
            .copied()
            .filter(|id| self.node(*id).field.needs_validation())
            .collect();
        self.requests_for(&wanted)
    }

    fn requests_for(&self, ids: &[NodeId]) -> Vec<ValidationRequest> {
        if ids.is_empty() {
            return Vec::new();
        }
        let data = Arc::new(self.to_values());
        ids.iter()
            .map(|id| {
                let field = &self.node(*id).field;
                let path = self.path_of(*id);
                ValidationRequest {
                    generation: field.generation(),
                    value: field.value().clone(),
                    validator: field.validator().cloned(),
                    context: ValidationContext {
                        path: path.clone(),
                        field_type: field.field_type().cloned(),
                        siblings: self.siblings_of(*id),
                        data: Arc::clone(&data),
                    },
                    path,
                }
            })
            .collect()
    }

    /// Requests for every field still waiting for a result.
    pub fn pending_validations(&self) -> Vec<ValidationRequest> {
        self.validation_requests(&self.field_ids())
    }

    /// Requests for every validated field, whatever its current validity.
    pub fn all_validations(&self) -> Vec<ValidationRequest> {
        let ids: Vec<NodeId> = self
            .field_ids()
            .into_iter()
            .filter(|id| self.node(*id).field.kind().is_validated())
            .collect();
        self.requests_for(&ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(raw: &str) -> Path {
        Path::new(raw).unwrap()
    }

    #[test]
    fn rewrite_path_follows_moves_and_drops_removed_rows() {
        let dispatched = Dispatched {
            rewrites: vec![PathRewrite {
                from: path("tags.2.value"),
                to: path("tags.1.value"),
            }],
            removed: vec![path("tags.1")],
            ..Dispatched::default()
        };
        assert_eq!(dispatched.rewrite_path(&path("tags.2.value")), Some(path("tags.1.value")));
        assert_eq!(dispatched.rewrite_path(&path("tags.1.value")), None);
        assert_eq!(dispatched.rewrite_path(&path("title")), Some(path("title")));
        assert!(dispatched.is_structural());
    }
}
