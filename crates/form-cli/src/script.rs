//! Action scripts: a JSON array of form actions replayed in order.
//!
//! ```json
//! [
//!   {"action": "setValue", "path": "name", "value": "Jane"},
//!   {"action": "insertRow", "group": "tags", "index": 0, "initial": {"value": "x"}},
//!   {"action": "moveRow", "group": "tags", "from": 0, "to": 2},
//!   {"action": "removeRow", "group": "tags", "index": 1},
//!   {"action": "duplicateRow", "group": "tags", "index": 0},
//!   {"action": "setRowCount", "group": "tags", "count": 3},
//!   {"action": "addServerErrors", "errors": [{"path": "name", "message": "Taken."}]}
//! ]
//! ```

use std::path::Path as FsPath;

use anyhow::{Context, Result};
use form_model::{Path, Value};
use form_state::FormAction;
use serde::Deserialize;

/// One scripted action.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase", deny_unknown_fields)]
pub enum ScriptStep {
    SetValue {
        path: Path,
        value: serde_json::Value,
    },
    InsertRow {
        group: Path,
        index: usize,
        #[serde(default)]
        initial: serde_json::Value,
    },
    RemoveRow {
        group: Path,
        index: usize,
    },
    MoveRow {
        group: Path,
        from: usize,
        to: usize,
    },
    DuplicateRow {
        group: Path,
        index: usize,
    },
    SetRowCount {
        group: Path,
        count: usize,
    },
    SetCondition {
        path: Path,
        passes: bool,
    },
    AddServerErrors {
        errors: Vec<ServerError>,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerError {
    pub path: Path,
    pub message: String,
}

impl ScriptStep {
    pub fn into_action(self) -> FormAction {
        match self {
            Self::SetValue { path, value } => FormAction::set_value(path, Value::from(value)),
            Self::InsertRow {
                group,
                index,
                initial,
            } => FormAction::insert_row(group, index, Value::from(initial)),
            Self::RemoveRow { group, index } => FormAction::remove_row(group, index),
            Self::MoveRow { group, from, to } => FormAction::move_row(group, from, to),
            Self::DuplicateRow { group, index } => FormAction::duplicate_row(group, index),
            Self::SetRowCount { group, count } => FormAction::SetRowCount { group, count },
            Self::SetCondition { path, passes } => FormAction::SetCondition { path, passes },
            Self::AddServerErrors { errors } => FormAction::AddServerErrors(
                errors
                    .into_iter()
                    .map(|error| (error.path, error.message))
                    .collect(),
            ),
        }
    }
}

pub fn load_script(path: &FsPath) -> Result<Vec<ScriptStep>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read script {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parse script {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> Vec<ScriptStep> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn steps_map_to_actions() {
        let steps = parse(json!([
            {"action": "setValue", "path": "tags[0].value", "value": "x"},
            {"action": "insertRow", "group": "tags", "index": 1},
            {"action": "setRowCount", "group": "tags", "count": 3},
            {"action": "addServerErrors", "errors": [{"path": "name", "message": "Taken."}]}
        ]));
        let actions: Vec<FormAction> = steps.into_iter().map(ScriptStep::into_action).collect();

        assert_eq!(
            actions.iter().map(FormAction::name).collect::<Vec<_>>(),
            vec!["SET_VALUE", "INSERT_ROW", "SET_ROW_COUNT", "ADD_SERVER_ERRORS"]
        );
        match &actions[0] {
            FormAction::SetValue { path, value } => {
                assert_eq!(path.as_str(), "tags.0.value");
                assert_eq!(value, &Value::from("x"));
            }
            other => panic!("unexpected action {other:?}"),
        }
        match &actions[1] {
            FormAction::InsertRow { initial, .. } => assert!(initial.is_null()),
            other => panic!("unexpected action {other:?}"),
        }
    }

    #[test]
    fn malformed_steps_are_rejected() {
        let unknown: Result<Vec<ScriptStep>, _> =
            serde_json::from_value(json!([{"action": "explode", "path": "name"}]));
        assert!(unknown.is_err());

        let bad_path: Result<Vec<ScriptStep>, _> =
            serde_json::from_value(json!([{"action": "setValue", "path": "0.name", "value": 1}]));
        assert!(bad_path.is_err());
    }
}
