//! Serialization boundary: wire shape, round trips and rehydrated behavior.

use std::sync::Arc;

use form_model::{Path, Validity, Value};
use form_serialize::{SerializedState, deserialize, serialize};
use form_state::{
    CapabilityRegistry, Condition, FieldCapabilities, FormAction, FormState, FormStore, Validator,
};
use serde_json::json;

const FIRST_ROW: &str = "00000000000000000000000000000001";

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
            .unwrap(),
    )
}

fn make_store() -> FormStore {
    let document = json!({"name": "", "tags": [{"id": FIRST_ROW, "value": "a"}]});
    let state = FormState::from_document(make_registry(), &Value::from(document)).unwrap();
    FormStore::new(state)
}

fn dispatch_and_settle(store: &mut FormStore, action: FormAction) {
    let outcome = store.dispatch(action).unwrap();
    for request in outcome.validations {
        let validity = request.run_sync().unwrap();
        store.dispatch(request.resolve(validity)).unwrap();
    }
}

#[test]
fn wire_format_of_a_small_form() {
    let mut store = make_store();
    dispatch_and_settle(&mut store, FormAction::set_value(path("name"), "Jane"));

    let serialized = serialize(store.state());
    insta::assert_json_snapshot!("wire_format", serialized);
}

#[test]
fn records_carry_exactly_the_data_attributes() {
    let serialized = serialize(make_store().state());
    let text = serialized.to_json().unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();

    for (key, record) in parsed.as_object().unwrap() {
        let mut members: Vec<&str> = record.as_object().unwrap().keys().map(String::as_str).collect();
        members.sort_unstable();
        assert_eq!(
            members,
            vec!["initialValue", "passesCondition", "rowCount", "validity", "value"],
            "record for {key}"
        );
    }
}

#[test]
fn round_trip_preserves_every_record() {
    let mut store = make_store();
    dispatch_and_settle(&mut store, FormAction::insert_row(path("tags"), 0, json!({"value": "b"})));
    dispatch_and_settle(&mut store, FormAction::duplicate_row(path("tags"), 1));
    dispatch_and_settle(&mut store, FormAction::move_row(path("tags"), 2, 0));
    dispatch_and_settle(&mut store, FormAction::set_value(path("url"), ""));
    dispatch_and_settle(&mut store, FormAction::set_value(path("tags.1.value"), ""));

    let serialized = serialize(store.state());
    let rebuilt = deserialize(&serialized, make_registry()).unwrap();

    assert_eq!(serialize(&rebuilt), serialized);
    assert_eq!(
        rebuilt.rows(&path("tags")).unwrap(),
        store.state().rows(&path("tags")).unwrap()
    );
    assert_eq!(rebuilt.to_values(), store.state().to_values());
    assert!(rebuilt.check_invariants().is_ok());
}

#[test]
fn round_trip_through_json_text() {
    let serialized = serialize(make_store().state());
    let text = serialized.to_json().unwrap();
    let parsed = SerializedState::from_json(&text).unwrap();
    assert_eq!(parsed, serialized);

    let rebuilt = deserialize(&parsed, make_registry()).unwrap();
    let row = rebuilt.get_field(&path("tags.0")).unwrap();
    assert_eq!(row.row_id().map(|id| id.to_hex()), Some(FIRST_ROW.to_string()));
}

#[test]
fn rehydrated_fields_validate_like_the_original() {
    let mut original = make_store();
    let serialized = serialize(original.state());

    // A fresh registry on the receiving side, built from the same declarations.
    let rebuilt = deserialize(&serialized, make_registry()).unwrap();
    let mut rehydrated = FormStore::new(rebuilt);

    for value in ["", "Jane"] {
        let before = original.dispatch(FormAction::set_value(path("name"), value)).unwrap();
        let after = rehydrated.dispatch(FormAction::set_value(path("name"), value)).unwrap();
        assert_eq!(before.validations.len(), 1);
        assert_eq!(after.validations.len(), 1);
        assert_eq!(before.validations[0].run_sync(), after.validations[0].run_sync());
    }

    let condition_flip = rehydrated
        .dispatch(FormAction::set_value(path("kind"), "link"))
        .unwrap();
    assert!(condition_flip.visibility_changed.contains(&path("url")));
    assert!(rehydrated.state().is_visible(&path("url")).unwrap());
}

#[test]
fn validity_and_visibility_survive_the_boundary() {
    let mut store = make_store();
    dispatch_and_settle(&mut store, FormAction::set_value(path("name"), ""));
    let serialized = serialize(store.state());

    let name = serialized.get(&path("name")).unwrap();
    assert_eq!(name.validity, Validity::invalid("This field is required."));
    assert!(!serialized.get(&path("url")).unwrap().passes_condition);

    let rebuilt = deserialize(&serialized, make_registry()).unwrap();
    assert_eq!(
        rebuilt.get_field(&path("name")).unwrap().validity(),
        &Validity::invalid("This field is required.")
    );
    assert!(!rebuilt.is_visible(&path("url")).unwrap());
}
