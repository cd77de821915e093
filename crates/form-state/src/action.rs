//! Mutation actions accepted by the store.

use form_model::{Generation, Path, Validity, Value};

use crate::tree::FormState;

/// One mutation of a form. Replaying an action against the same prior
/// state yields the same resulting state.
#[derive(Debug, Clone)]
pub enum FormAction {
    /// Change a leaf's value.
    SetValue { path: Path, value: Value },
    /// Swap in a whole new state (initial load or full external override).
    ReplaceState(Box<FormState>),
    /// Create a row at `index`; past the end appends.
    InsertRow {
        group: Path,
        index: usize,
        initial: Value,
    },
    RemoveRow { group: Path, index: usize },
    /// Reposition a row; `to` past the end moves it last.
    MoveRow { group: Path, from: usize, to: usize },
    /// Copy a row, with a fresh identity, directly after the source.
    DuplicateRow { group: Path, index: usize },
    /// Append default rows or drop trailing rows until `count` remain.
    SetRowCount { group: Path, count: usize },
    SetCondition { path: Path, passes: bool },
    /// A validation result, applied only if `generation` is still current.
    SetValidity {
        path: Path,
        generation: Generation,
        validity: Validity,
    },
    /// Errors returned by the storage layer, applied at the fields'
    /// current generations.
    AddServerErrors(Vec<(Path, String)>),
}

impl FormAction {
    pub fn set_value(path: Path, value: impl Into<Value>) -> Self {
        Self::SetValue {
            path,
            value: value.into(),
        }
    }

    pub fn replace_state(state: FormState) -> Self {
        Self::ReplaceState(Box::new(state))
    }

    pub fn insert_row(group: Path, index: usize, initial: impl Into<Value>) -> Self {
        Self::InsertRow {
            group,
            index,
            initial: initial.into(),
        }
    }

    pub fn remove_row(group: Path, index: usize) -> Self {
        Self::RemoveRow { group, index }
    }

    pub fn move_row(group: Path, from: usize, to: usize) -> Self {
        Self::MoveRow { group, from, to }
    }

    pub fn duplicate_row(group: Path, index: usize) -> Self {
        Self::DuplicateRow { group, index }
    }

    /// Wire name of the action kind.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SetValue { .. } => "SET_VALUE",
            Self::ReplaceState(_) => "REPLACE_STATE",
            Self::InsertRow { .. } => "INSERT_ROW",
            Self::RemoveRow { .. } => "REMOVE_ROW",
            Self::MoveRow { .. } => "MOVE_ROW",
            Self::DuplicateRow { .. } => "DUPLICATE_ROW",
            Self::SetRowCount { .. } => "SET_ROW_COUNT",
            Self::SetCondition { .. } => "SET_CONDITION",
            Self::SetValidity { .. } => "SET_VALIDITY",
            Self::AddServerErrors(_) => "ADD_SERVER_ERRORS",
        }
    }

    /// Actions that add, remove or reorder rows.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::InsertRow { .. }
                | Self::RemoveRow { .. }
                | Self::MoveRow { .. }
                | Self::DuplicateRow { .. }
                | Self::SetRowCount { .. }
        )
    }
}
