//! Property tests: arbitrary row operation sequences keep rows contiguous
//! and never change the identity of a row they did not create or destroy.

use std::collections::HashSet;
use std::sync::Arc;

use form_model::{Path, RowId, Value};
use form_state::{CapabilityRegistry, FieldCapabilities, FormAction, FormState, FormStore};
use proptest::prelude::*;
use serde_json::json;

#[derive(Debug, Clone, Copy)]
enum Op {
    Insert(usize),
    Remove(usize),
    Move(usize, usize),
    Duplicate(usize),
    Resize(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..8).prop_map(Op::Insert),
        (0usize..8).prop_map(Op::Remove),
        (0usize..8, 0usize..8).prop_map(|(from, to)| Op::Move(from, to)),
        (0usize..8).prop_map(Op::Duplicate),
        (0usize..6).prop_map(Op::Resize),
    ]
}

fn tags() -> Path {
    Path::new("tags").unwrap()
}

fn make_store() -> FormStore {
    let registry = Arc::new(
        CapabilityRegistry::new()
            .with("tags", FieldCapabilities::array("tags"))
            .unwrap()
            .with("tags.*.value", FieldCapabilities::leaf("text"))
            .unwrap(),
    );
    let data = Value::from(json!({"tags": [{"value": "a"}, {"value": "b"}, {"value": "c"}]}));
    FormStore::new(FormState::from_document(registry, &data).unwrap())
}

proptest! {
    #[test]
    fn row_operations_keep_indices_and_identities(ops in prop::collection::vec(op_strategy(), 1..25)) {
        let mut store = make_store();
        let mut model: Vec<RowId> = store.state().rows(&tags()).unwrap();
        let mut seen: HashSet<RowId> = model.iter().copied().collect();

        for op in ops {
            let len = model.len();
            let action = match op {
                Op::Insert(index) => FormAction::insert_row(tags(), index, Value::Null),
                Op::Remove(index) => FormAction::remove_row(tags(), index),
                Op::Move(from, to) => FormAction::move_row(tags(), from, to),
                Op::Duplicate(index) => FormAction::duplicate_row(tags(), index),
                Op::Resize(count) => FormAction::SetRowCount { group: tags(), count },
            };
            let result = store.dispatch(action);
            let actual = store.state().rows(&tags()).unwrap();

            // Mirror the operation on the model; new rows are read back
            // from the store and must be unseen identities.
            match op {
                Op::Insert(index) => {
                    let at = index.min(len);
                    prop_assert!(seen.insert(actual[at]));
                    model.insert(at, actual[at]);
                }
                Op::Remove(index) if index >= len => prop_assert!(result.is_err()),
                Op::Remove(index) => {
                    model.remove(index);
                }
                Op::Move(from, _) if from >= len => prop_assert!(result.is_err()),
                Op::Move(from, to) => {
                    let row = model.remove(from);
                    model.insert(to.min(len - 1), row);
                }
                Op::Duplicate(index) if index >= len => prop_assert!(result.is_err()),
                Op::Duplicate(index) => {
                    prop_assert!(seen.insert(actual[index + 1]));
                    model.insert(index + 1, actual[index + 1]);
                }
                Op::Resize(count) if count <= len => model.truncate(count),
                Op::Resize(count) => {
                    for id in &actual[len..count] {
                        prop_assert!(seen.insert(*id));
                        model.push(*id);
                    }
                }
            }

            prop_assert_eq!(&actual, &model);
            store.state().check_invariants().unwrap();
            let count = store.get_field(&tags()).unwrap().row_count().unwrap();
            prop_assert_eq!(count, model.len());
            for index in 0..count {
                let row = tags().row(index);
                prop_assert!(store.state().contains(&row.child("value").unwrap()));
            }
            prop_assert!(!store.state().contains(&tags().row(count)));
        }
    }
}
