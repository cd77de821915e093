//! Property tests: after any sequence of row operations and edits, a state
//! rebuilt from its wire form carries the same records, rows and data.

use std::sync::Arc;

use form_model::{Path, Value};
use form_serialize::{SerializedState, deserialize, serialize};
use form_state::{CapabilityRegistry, Condition, FieldCapabilities, FormAction, FormState, FormStore, Validator};
use proptest::prelude::*;
use serde_json::json;

#[derive(Debug, Clone)]
enum Op {
    Insert(usize),
    Remove(usize),
    Move(usize, usize),
    Duplicate(usize),
    Resize(usize),
    InsertImage(usize, usize),
    SetTag(usize, String),
    SetName(String),
    ToggleKind(bool),
    Hide(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..6).prop_map(Op::Insert),
        (0usize..6).prop_map(Op::Remove),
        (0usize..6, 0usize..6).prop_map(|(from, to)| Op::Move(from, to)),
        (0usize..6).prop_map(Op::Duplicate),
        (0usize..5).prop_map(Op::Resize),
        (0usize..6, 0usize..3).prop_map(|(row, index)| Op::InsertImage(row, index)),
        (0usize..6, "[a-z]{0,3}").prop_map(|(row, value)| Op::SetTag(row, value)),
        "[a-z]{0,3}".prop_map(Op::SetName),
        any::<bool>().prop_map(Op::ToggleKind),
        (0usize..6).prop_map(Op::Hide),
    ]
}

fn path(raw: &str) -> Path {
    Path::new(raw).unwrap()
}

fn required() -> Validator {
    Validator::sync(|value, _ctx| {
        if value.is_empty() {
            Err("This field is required.".to_string())
        } else {
            Ok(())
        }
    })
}

fn make_registry() -> Arc<CapabilityRegistry> {
    Arc::new(
        CapabilityRegistry::new()
            .with("name", FieldCapabilities::leaf("text").with_validator(required()))
            .unwrap()
            .with("kind", FieldCapabilities::leaf("select").with_default("page"))
            .unwrap()
            .with(
                "url",
                FieldCapabilities::leaf("text")
                    .with_validator(required())
                    .with_condition(Condition::sibling_equals("kind", Value::from("link"))),
            )
            .unwrap()
            .with("tags", FieldCapabilities::array("tags"))
            .unwrap()
            .with("tags.*.value", FieldCapabilities::leaf("text").with_validator(required()))
            .unwrap()
            .with("tags.*.images", FieldCapabilities::array("images"))
            .unwrap()
            .with("tags.*.images.*.src", FieldCapabilities::leaf("upload").with_default("none"))
            .unwrap(),
    )
}

fn make_store() -> FormStore {
    let data = json!({"name": "Jane", "tags": [{"value": "a"}, {"value": "b", "images": [{"src": "x.png"}]}]});
    FormStore::new(FormState::from_document(make_registry(), &Value::from(data)).unwrap())
}

fn apply(store: &mut FormStore, op: Op) {
    let tags = path("tags");
    let action = match op {
        Op::Insert(index) => FormAction::insert_row(tags, index, Value::Null),
        Op::Remove(index) => FormAction::remove_row(tags, index),
        Op::Move(from, to) => FormAction::move_row(tags, from, to),
        Op::Duplicate(index) => FormAction::duplicate_row(tags, index),
        Op::Resize(count) => FormAction::SetRowCount { group: tags, count },
        Op::InsertImage(row, index) => {
            FormAction::insert_row(path(&format!("tags.{row}.images")), index, Value::Null)
        }
        Op::SetTag(row, value) => FormAction::set_value(path(&format!("tags.{row}.value")), value),
        Op::SetName(value) => FormAction::set_value(path("name"), value),
        Op::ToggleKind(link) => FormAction::set_value(path("kind"), if link { "link" } else { "page" }),
        Op::Hide(row) => FormAction::SetCondition {
            path: path(&format!("tags.{row}")),
            passes: false,
        },
    };
    // Out-of-range rows are rejected and leave the state untouched.
    let Ok(outcome) = store.dispatch(action) else {
        return;
    };
    for request in outcome.validations {
        if let Some(validity) = request.run_sync() {
            store.dispatch(request.resolve(validity)).unwrap();
        }
    }
}

proptest! {
    #[test]
    fn rebuilt_state_matches_every_record(ops in prop::collection::vec(op_strategy(), 0..30)) {
        let mut store = make_store();
        for op in ops {
            apply(&mut store, op);
        }
        let state = store.state();

        let serialized = serialize(state);
        let rebuilt = deserialize(&serialized, make_registry()).unwrap();
        prop_assert_eq!(&serialize(&rebuilt), &serialized);
        prop_assert_eq!(rebuilt.paths(), state.paths());
        prop_assert_eq!(rebuilt.rows(&path("tags")).unwrap(), state.rows(&path("tags")).unwrap());
        prop_assert_eq!(rebuilt.to_values(), state.to_values());
        rebuilt.check_invariants().unwrap();

        let text = serialized.to_json().unwrap();
        prop_assert_eq!(&SerializedState::from_json(&text).unwrap(), &serialized);
    }
}
