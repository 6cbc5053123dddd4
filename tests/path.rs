#[path = "support/mod.rs"]
mod support;

use protoreflect_dyn::path::{self, Builder};
use protoreflect_dyn::{DynamicMessage, MapKey, PathError, Value};

#[test]
fn get_set_has_clear_scalar() {
    let (_pool, person) = support::person_pool();
    let mut message = DynamicMessage::new(person);

    assert!(!path::has(&message, "name").unwrap());
    path::set(&mut message, "name", Value::String("Alice".to_string())).unwrap();
    assert!(path::has(&message, "name").unwrap());
    assert_eq!(
        path::get(&message, "name").unwrap(),
        Some(Value::String("Alice".to_string()))
    );

    path::clear(&mut message, "name").unwrap();
    assert!(!path::has(&message, "name").unwrap());
}

#[test]
fn leading_dollar_sign_is_ignored() {
    let (_pool, person) = support::person_pool();
    let mut message = DynamicMessage::new(person);
    path::set(&mut message, "$age", Value::I32(5)).unwrap();
    assert_eq!(path::get(&message, "age").unwrap(), Some(Value::I32(5)));
}

#[test]
fn nested_message_path_creates_intermediate_container() {
    let (_pool, person2) = support::nested_pool();
    let mut message = DynamicMessage::new(person2);

    path::set(&mut message, "address.city", Value::String("Springfield".to_string())).unwrap();
    assert_eq!(
        path::get(&message, "address.city").unwrap(),
        Some(Value::String("Springfield".to_string()))
    );
    assert!(path::has(&message, "address").unwrap());
}

#[test]
fn repeated_index_append_and_bounds() {
    let (_pool, person2) = support::nested_pool();
    let mut message = DynamicMessage::new(person2);

    path::set(&mut message, "nicknames[0]", Value::String("Al".to_string())).unwrap();
    path::set(&mut message, "nicknames[1]", Value::String("Ali".to_string())).unwrap();
    assert_eq!(
        path::get(&message, "nicknames[0]").unwrap(),
        Some(Value::String("Al".to_string()))
    );

    let err = path::set(&mut message, "nicknames[5]", Value::String("x".to_string())).unwrap_err();
    assert!(matches!(err, PathError::IndexOutOfBounds { index: 5, len: 2 }));

    path::set(&mut message, "nicknames[0]", Value::String("Alfred".to_string())).unwrap();
    assert_eq!(
        path::get(&message, "nicknames[0]").unwrap(),
        Some(Value::String("Alfred".to_string()))
    );
}

#[test]
fn map_key_lookup() {
    let (_pool, counts) = support::counts_pool();
    let mut message = DynamicMessage::new(counts);

    path::set(&mut message, "counts['a']", Value::I32(1)).unwrap();
    path::set(&mut message, r#"counts["b"]"#, Value::I32(2)).unwrap();
    assert_eq!(path::get(&message, "counts['a']").unwrap(), Some(Value::I32(1)));
    assert_eq!(path::get(&message, "counts['b']").unwrap(), Some(Value::I32(2)));
    assert_eq!(path::get(&message, "counts['missing']").unwrap(), None);

    let value = message.get("counts").unwrap().unwrap();
    let map = value.as_map().unwrap();
    assert_eq!(map.get(&MapKey::String("a".to_string())), Some(&Value::I32(1)));
}

#[test]
fn field_not_found_for_unknown_component() {
    let (_pool, person) = support::person_pool();
    let message = DynamicMessage::new(person);
    let err = path::get(&message, "nickname").unwrap_err();
    assert!(matches!(err, PathError::FieldNotFound { .. }));
}

#[test]
fn builder_chains_set_calls() {
    let (_pool, person) = support::person_pool();
    let message = Builder::new(DynamicMessage::new(person))
        .set("name", Value::String("Carol".to_string()))
        .unwrap()
        .set("age", Value::I32(41))
        .unwrap()
        .build();

    assert_eq!(message.get("name").unwrap().unwrap().as_str(), Some("Carol"));
    assert_eq!(message.get("age").unwrap().unwrap().as_i32(), Some(41));
}
