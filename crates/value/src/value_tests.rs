use super::*;

#[test]
fn empty_string_is_falsy() {
    assert!(!Value::string("").is_truthy());
}

#[test]
fn legacy_false_and_zero_strings_are_falsy() {
    assert!(!Value::string("false").is_truthy());
    assert!(!Value::string("0").is_truthy());
}

#[test]
fn other_strings_are_truthy() {
    assert!(Value::string("no").is_truthy());
    assert!(Value::string(" ").is_truthy());
}

#[test]
fn zero_number_is_falsy_nonzero_is_truthy() {
    assert!(!Value::number(0.0).is_truthy());
    assert!(Value::number(-1.0).is_truthy());
}

#[test]
fn empty_containers_are_falsy() {
    assert!(!Value::array(vec![]).is_truthy());
    assert!(!Value::object(IndexMap::new()).is_truthy());
    assert!(Value::array(vec![Value::null()]).is_truthy());
}

#[test]
fn null_is_falsy() {
    assert!(!Value::null().is_truthy());
}

#[test]
fn coerce_load_content_yields_content_field() {
    let lc = LoadContent::from_file("body".into(), "f.md".into(), "/f.md".into());
    let v = Value::literal(ValueKind::LoadContent(Rc::new(lc)), 0);
    assert_eq!(v.coerce_to_string(), "body");
}

#[test]
fn number_formats_without_trailing_zero() {
    assert_eq!(Value::number(2.0).coerce_to_string(), "2");
    assert_eq!(Value::number(2.5).coerce_to_string(), "2.5");
}

#[test]
fn field_access_on_object_returns_clone() {
    let mut fields = IndexMap::new();
    fields.insert("id".to_string(), Value::number(1.0));
    let obj = Value::object(fields);
    assert_eq!(obj.get_field("id"), Some(Value::number(1.0)));
    assert_eq!(obj.get_field("missing"), None);
}

#[test]
fn index_access_on_array() {
    let arr = Value::array(vec![Value::string("a"), Value::string("b")]);
    assert_eq!(arr.get_index(1), Some(Value::string("b")));
    assert_eq!(arr.get_index(5), None);
}

#[test]
fn json_round_trip_preserves_shape() {
    let mut fields = IndexMap::new();
    fields.insert("count".to_string(), Value::number(2.0));
    let original = Value::object(fields);
    let json = original.to_json();
    let round_tripped = Value::from_json(json);
    assert_eq!(original, round_tripped);
}

#[test]
fn absorb_labels_unions_across_inputs() {
    let mut out = Value::string("result");
    let a = Value::new(ValueKind::Str("a".into()), ValueMeta::literal(0).with_label("x"));
    let b = Value::new(ValueKind::Str("b".into()), ValueMeta::literal(0).with_label("y"));
    out.absorb_labels_from([&a, &b]);
    assert!(out.meta.labels.contains("x"));
    assert!(out.meta.labels.contains("y"));
}

#[test]
fn duplicate_object_keys_overwrite_in_insertion_order() {
    let mut fields = IndexMap::new();
    fields.insert("a".to_string(), Value::number(1.0));
    fields.insert("b".to_string(), Value::number(2.0));
    fields.insert("a".to_string(), Value::number(3.0));
    let obj = Value::object(fields);
    assert_eq!(obj.get_field("a"), Some(Value::number(3.0)));
    match obj.kind {
        ValueKind::Object(m) => assert_eq!(m.keys().collect::<Vec<_>>(), vec!["a", "b"]),
        _ => unreachable!(),
    }
}
