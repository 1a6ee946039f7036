use super::*;
use mlld_value::Value;

#[test]
fn child_inherits_parent_bindings() {
    let mut arena = EnvArena::new();
    let root = arena.root();
    arena.set(root, "x", Value::number(1.0)).unwrap();
    let child = arena.child(root, EnvKind::Child);
    assert_eq!(arena.get(child, "x"), Some(Value::number(1.0)));
}

#[test]
fn rebinding_locally_is_immutable_rebinding() {
    let mut arena = EnvArena::new();
    let root = arena.root();
    arena.set(root, "x", Value::number(1.0)).unwrap();
    let err = arena.set(root, "x", Value::number(2.0)).unwrap_err();
    assert!(matches!(err, VariableError::ImmutableRebinding { .. }));
}

#[test]
fn shadowing_in_child_does_not_rebind_parent() {
    let mut arena = EnvArena::new();
    let root = arena.root();
    arena.set(root, "x", Value::number(1.0)).unwrap();
    let child = arena.child(root, EnvKind::Child);
    arena.set(child, "x", Value::number(2.0)).unwrap();
    assert_eq!(arena.get(child, "x"), Some(Value::number(2.0)));
    assert_eq!(arena.get(root, "x"), Some(Value::number(1.0)));
}

#[test]
fn reserved_name_cannot_be_bound() {
    let mut arena = EnvArena::new();
    let root = arena.root();
    let err = arena.set(root, "now", Value::string("nope")).unwrap_err();
    assert!(matches!(err, VariableError::ReservedName { .. }));
}

#[test]
fn reserved_slot_resolves_dynamically_each_read() {
    use std::cell::Cell;
    use std::rc::Rc;

    let mut arena = EnvArena::new();
    let root = arena.root();
    let counter = Rc::new(Cell::new(0));
    let counter2 = Rc::clone(&counter);
    arena.install_reserved(
        root,
        "now",
        ReservedValue::Dynamic(Rc::new(move || {
            counter2.set(counter2.get() + 1);
            Value::number(counter2.get() as f64)
        })),
    );
    assert_eq!(arena.get(root, "now"), Some(Value::number(1.0)));
    assert_eq!(arena.get(root, "now"), Some(Value::number(2.0)));
}

#[test]
fn undefined_variable_returns_none() {
    let mut arena = EnvArena::new();
    let root = arena.root();
    assert_eq!(arena.get(root, "missing"), None);
}

#[test]
fn capture_flattens_chain_outer_first_inner_overrides() {
    let mut arena = EnvArena::new();
    let root = arena.root();
    arena.set(root, "a", Value::number(1.0)).unwrap();
    let child = arena.child(root, EnvKind::Child);
    arena.set(child, "b", Value::number(2.0)).unwrap();
    let snapshot = arena.capture(child);
    assert_eq!(snapshot.get("a"), Some(&Value::number(1.0)));
    assert_eq!(snapshot.get("b"), Some(&Value::number(2.0)));
}

#[test]
fn merge_copies_new_bindings_and_reports_collisions() {
    let mut arena = EnvArena::new();
    let root = arena.root();
    arena.set(root, "existing", Value::number(1.0)).unwrap();
    let imported = arena.child(root, EnvKind::Child);
    arena.set(imported, "existing", Value::number(9.0)).unwrap();
    arena.set(imported, "fresh", Value::number(2.0)).unwrap();
    let collisions = arena.merge(root, imported);
    assert_eq!(collisions, vec!["existing".to_string()]);
    assert_eq!(arena.get(root, "fresh"), Some(Value::number(2.0)));
    assert_eq!(arena.get(root, "existing"), Some(Value::number(1.0)));
}

#[test]
fn export_manifest_defaults_to_all_non_underscore_names() {
    let mut arena = EnvArena::new();
    let root = arena.root();
    arena.set(root, "pub_name", Value::number(1.0)).unwrap();
    arena.set(root, "_private", Value::number(2.0)).unwrap();
    let mut exported = arena.exported_names(root);
    exported.sort();
    assert_eq!(exported, vec!["pub_name".to_string()]);
}

#[test]
fn explicit_export_manifest_overrides_legacy_default() {
    let mut arena = EnvArena::new();
    let root = arena.root();
    arena.set(root, "a", Value::number(1.0)).unwrap();
    arena.set(root, "b", Value::number(2.0)).unwrap();
    arena.add_exports(root, vec!["a".to_string()]);
    assert_eq!(arena.exported_names(root), vec!["a".to_string()]);
}
