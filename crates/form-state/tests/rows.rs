//! Row operations through the store: insert, remove, move, duplicate and
//! row count changes on a repeating group.

use std::sync::Arc;

use form_model::{FormError, Path, RowId, Validity, Value};
use form_state::{CapabilityRegistry, FieldCapabilities, FormAction, FormState, FormStore, RenderHook};
use serde_json::json;

fn path(raw: &str) -> Path {
    Path::new(raw).unwrap()
}

fn make_registry() -> Arc<CapabilityRegistry> {
    let label = RenderHook::new(|ctx| {
        let value = ctx.data.get("value").and_then(Value::as_str).unwrap_or("");
        format!("Tag {}: {value}", ctx.row_index.unwrap_or_default() + 1)
    });
    Arc::new(
        CapabilityRegistry::new()
            .with("title", FieldCapabilities::leaf("text"))
            .unwrap()
            .with("tags", FieldCapabilities::array("tags"))
            .unwrap()
            .with("tags.*", FieldCapabilities::row("tag").with_render_hook(label))
            .unwrap()
            .with("tags.*.value", FieldCapabilities::leaf("text").with_default("new"))
            .unwrap(),
    )
}

/// A store whose `tags` group holds rows `a` and `b`.
fn make_store() -> FormStore {
    let data = Value::from(json!({"title": "Shirt", "tags": [{"value": "a"}, {"value": "b"}]}));
    FormStore::new(FormState::from_document(make_registry(), &data).unwrap())
}

fn tag_values(store: &FormStore) -> Vec<String> {
    let count = store.get_field(&path("tags")).unwrap().row_count().unwrap();
    (0..count)
        .map(|i| {
            let value = store.get_value(&path(&format!("tags.{i}.value"))).unwrap();
            value.as_str().unwrap().to_string()
        })
        .collect()
}

fn row_ids(store: &FormStore) -> Vec<RowId> {
    store.state().rows(&path("tags")).unwrap()
}

#[test]
fn insert_at_front_shifts_existing_rows() {
    let mut store = make_store();
    let original = row_ids(&store);

    let outcome = store
        .dispatch(FormAction::insert_row(path("tags"), 0, Value::from(json!({"value": "x"}))))
        .unwrap();

    assert_eq!(tag_values(&store), ["x", "a", "b"]);
    let ids = row_ids(&store);
    assert_eq!(&ids[1..], &original[..]);
    assert!(!original.contains(&ids[0]));
    assert_eq!(store.get_field(&path("tags")).unwrap().row_count(), Some(3));
    assert_eq!(outcome.inserted, vec![path("tags.0")]);
    assert_eq!(outcome.rewrite_path(&path("tags.1.value")), Some(path("tags.2.value")));
    assert_eq!(outcome.rewrite_path(&path("tags.0")), Some(path("tags.1")));
    store.state().check_invariants().unwrap();
}

#[test]
fn remove_after_insert_keeps_rows_contiguous() {
    let mut store = make_store();
    store
        .dispatch(FormAction::insert_row(path("tags"), 0, Value::from(json!({"value": "x"}))))
        .unwrap();
    let before = row_ids(&store);

    let outcome = store.dispatch(FormAction::remove_row(path("tags"), 1)).unwrap();

    assert_eq!(tag_values(&store), ["x", "b"]);
    assert_eq!(row_ids(&store), vec![before[0], before[2]]);
    assert_eq!(outcome.removed, vec![path("tags.1")]);
    assert_eq!(outcome.rewrite_path(&path("tags.1.value")), None);
    assert_eq!(outcome.rewrite_path(&path("tags.2.value")), Some(path("tags.1.value")));
    assert!(!store.state().contains(&path("tags.2")));
}

#[test]
fn insert_past_the_end_appends_with_defaults() {
    let mut store = make_store();
    store
        .dispatch(FormAction::insert_row(path("tags"), 99, Value::Null))
        .unwrap();
    assert_eq!(tag_values(&store), ["a", "b", "new"]);
}

#[test]
fn removing_a_missing_row_is_an_unknown_path() {
    let mut store = make_store();
    let err = store.dispatch(FormAction::remove_row(path("tags"), 2)).unwrap_err();
    assert_eq!(err, FormError::UnknownPath { path: path("tags.2") });
    assert_eq!(tag_values(&store), ["a", "b"]);
}

#[test]
fn row_actions_on_a_leaf_are_structural_errors() {
    let mut store = make_store();
    let err = store
        .dispatch(FormAction::insert_row(path("title"), 0, Value::Null))
        .unwrap_err();
    assert!(err.is_defect());
}

#[test]
fn move_preserves_identity_and_values() {
    let mut store = make_store();
    store
        .dispatch(FormAction::insert_row(path("tags"), 2, Value::from(json!({"value": "c"}))))
        .unwrap();
    let before = row_ids(&store);

    let outcome = store.dispatch(FormAction::move_row(path("tags"), 0, 2)).unwrap();

    assert_eq!(tag_values(&store), ["b", "c", "a"]);
    assert_eq!(row_ids(&store), vec![before[1], before[2], before[0]]);
    assert_eq!(outcome.rewrite_path(&path("tags.0.value")), Some(path("tags.2.value")));
    assert_eq!(outcome.rewrite_path(&path("tags.2")), Some(path("tags.1")));
    assert_eq!(store.state().row_path(before[0]), Some(path("tags.2")));
}

#[test]
fn move_clamps_target_and_same_position_is_a_no_op() {
    let mut store = make_store();
    let outcome = store.dispatch(FormAction::move_row(path("tags"), 1, 1)).unwrap();
    assert!(!outcome.is_structural());
    assert!(!store.is_modified());

    store.dispatch(FormAction::move_row(path("tags"), 0, 50)).unwrap();
    assert_eq!(tag_values(&store), ["b", "a"]);
    assert!(store.is_modified());
}

#[test]
fn moved_fields_are_restamped() {
    let mut store = make_store();
    let old = store.get_field(&path("tags.0.value")).unwrap().generation();
    store.dispatch(FormAction::move_row(path("tags"), 0, 1)).unwrap();
    let moved = store.get_field(&path("tags.1.value")).unwrap().generation();
    assert!(moved > old);

    // A result captured for the old path now hits a different field.
    let outcome = store
        .dispatch(FormAction::SetValidity {
            path: path("tags.0.value"),
            generation: old,
            validity: Validity::invalid("stale"),
        })
        .unwrap();
    assert!(outcome.discarded);
}

#[test]
fn duplicate_copies_values_with_a_fresh_identity() {
    let mut store = make_store();
    let before = row_ids(&store);

    let outcome = store.dispatch(FormAction::duplicate_row(path("tags"), 0)).unwrap();

    assert_eq!(tag_values(&store), ["a", "a", "b"]);
    let ids = row_ids(&store);
    assert_eq!(ids[0], before[0]);
    assert_eq!(ids[2], before[1]);
    assert!(!before.contains(&ids[1]));
    assert_eq!(outcome.inserted, vec![path("tags.1")]);
    assert_eq!(
        store.get_field(&path("tags.1.value")).unwrap().validity(),
        &Validity::Unvalidated
    );
    assert!(
        outcome
            .validations
            .iter()
            .any(|request| request.path == path("tags.1.value"))
    );
}

#[test]
fn set_row_count_grows_and_shrinks() {
    let mut store = make_store();
    store
        .dispatch(FormAction::SetRowCount {
            group: path("tags"),
            count: 4,
        })
        .unwrap();
    assert_eq!(tag_values(&store), ["a", "b", "new", "new"]);

    let outcome = store
        .dispatch(FormAction::SetRowCount {
            group: path("tags"),
            count: 1,
        })
        .unwrap();
    assert_eq!(tag_values(&store), ["a"]);
    assert_eq!(outcome.removed, vec![path("tags.1"), path("tags.2"), path("tags.3")]);
}

#[test]
fn row_count_change_revalidates_the_group() {
    let mut store = make_store();
    let outcome = store.dispatch(FormAction::remove_row(path("tags"), 0)).unwrap();
    let group = store.get_field(&path("tags")).unwrap();
    assert_eq!(group.value().as_u64(), Some(1));
    assert!(outcome.validations.iter().any(|request| request.path == path("tags")));
}

#[test]
fn render_hook_labels_follow_row_position() {
    let mut store = make_store();
    assert_eq!(
        store.state().render_label(&path("tags.1")).unwrap().as_deref(),
        Some("Tag 2: b")
    );
    store.dispatch(FormAction::move_row(path("tags"), 1, 0)).unwrap();
    assert_eq!(
        store.state().render_label(&path("tags.0")).unwrap().as_deref(),
        Some("Tag 1: b")
    );
    assert_eq!(store.state().render_label(&path("title")).unwrap(), None);
}

#[test]
fn nested_groups_rewrite_only_their_own_index() {
    let registry = Arc::new(
        CapabilityRegistry::new()
            .with("variants", FieldCapabilities::array("variants"))
            .unwrap()
            .with("variants.*.images", FieldCapabilities::array("images"))
            .unwrap()
            .with("variants.*.images.*.image", FieldCapabilities::leaf("upload"))
            .unwrap(),
    );
    let data = Value::from(json!({"variants": [
        {"images": [{"image": "v0i0"}]},
        {"images": [{"image": "v1i0"}, {"image": "v1i1"}]}
    ]}));
    let mut store = FormStore::new(FormState::from_document(registry, &data).unwrap());

    let outcome = store
        .dispatch(FormAction::move_row(path("variants.1.images"), 1, 0))
        .unwrap();
    assert_eq!(
        store.get_value(&path("variants.1.images.0.image")).unwrap(),
        &Value::from("v1i1")
    );
    assert_eq!(
        outcome.rewrite_path(&path("variants.1.images.1.image")),
        Some(path("variants.1.images.0.image"))
    );
    assert_eq!(
        store.get_value(&path("variants.0.images.0.image")).unwrap(),
        &Value::from("v0i0")
    );

    store.dispatch(FormAction::remove_row(path("variants"), 0)).unwrap();
    assert_eq!(
        store.get_value(&path("variants.0.images.1.image")).unwrap(),
        &Value::from("v1i0")
    );
}

#[test]
fn unseeded_documents_mint_distinct_row_ids() {
    let first = make_store();
    let second = make_store();
    assert_ne!(row_ids(&first), row_ids(&second));
}

#[test]
fn replaced_state_never_reuses_a_minted_row_id() {
    let data = Value::from(json!({"tags": [{"value": "a"}, {"value": "b"}]}));
    let seeded = || FormState::from_document_with_seed(make_registry(), &data, "fixed").unwrap();
    let mut store = FormStore::new(seeded());

    store
        .dispatch(FormAction::insert_row(path("tags"), 2, Value::Null))
        .unwrap();
    let removed = row_ids(&store)[2];
    store.dispatch(FormAction::remove_row(path("tags"), 2)).unwrap();

    store.dispatch(FormAction::replace_state(seeded())).unwrap();
    store
        .dispatch(FormAction::insert_row(path("tags"), 2, Value::Null))
        .unwrap();
    assert_ne!(row_ids(&store)[2], removed);
}
