//! Boundary behaviors and property-style invariants for the wire codec.

#[path = "support/mod.rs"]
mod support;

use proptest::prelude::*;
use protoreflect_dyn::{decode, encode, DynamicMessage, MapKey, MessageError, Value};

proptest! {
    #[test]
    fn int32_round_trips_for_any_value(n in any::<i32>()) {
        let (_pool, person) = support::person_pool();
        let mut message = DynamicMessage::new(person.clone());
        message.set("age", Value::I32(n)).unwrap();
        let bytes = encode(&message);
        let decoded = decode(person, bytes.as_slice()).unwrap();
        prop_assert_eq!(decoded.get("age").unwrap().unwrap().as_i32(), Some(n));
    }

    #[test]
    fn uint64_round_trips_for_any_value(n in any::<u64>()) {
        let (_pool, scalars) = support::scalars_pool();
        let mut message = DynamicMessage::new(scalars.clone());
        message.set("u", Value::U64(n)).unwrap();
        let bytes = encode(&message);
        let decoded = decode(scalars, bytes.as_slice()).unwrap();
        prop_assert_eq!(decoded.get("u").unwrap().unwrap().as_u64(), Some(n));
    }

    #[test]
    fn string_field_round_trips(s in ".*") {
        let (_pool, person) = support::person_pool();
        let mut message = DynamicMessage::new(person.clone());
        message.set("name", Value::String(s.clone())).unwrap();
        let bytes = encode(&message);
        let decoded = decode(person, bytes.as_slice()).unwrap();
        prop_assert_eq!(decoded.get("name").unwrap().unwrap().as_str(), Some(s.as_str()));
    }
}

#[test]
fn int32_extremes_round_trip() {
    let (_pool, person) = support::person_pool();
    for n in [i32::MAX, i32::MIN] {
        let mut message = DynamicMessage::new(person.clone());
        message.set("age", Value::I32(n)).unwrap();
        let bytes = encode(&message);
        let decoded = decode(person.clone(), bytes.as_slice()).unwrap();
        assert_eq!(decoded.get("age").unwrap().unwrap().as_i32(), Some(n));
    }
}

#[test]
fn value_outside_i32_range_is_rejected() {
    let (_pool, person) = support::person_pool();
    let mut message = DynamicMessage::new(person);
    let err = message.set("age", Value::I64(i64::from(i32::MAX) + 1)).unwrap_err();
    assert!(matches!(err, MessageError::TypeMismatch { .. }));
}

#[test]
fn uint64_max_round_trips_as_ten_byte_varint() {
    let (_pool, scalars) = support::scalars_pool();
    let mut message = DynamicMessage::new(scalars.clone());
    message.set("u", Value::U64(u64::MAX)).unwrap();
    let bytes = encode(&message);
    // tag byte + 10-byte varint for the maximal 64-bit value.
    assert_eq!(bytes.len(), 1 + 10);
    let decoded = decode(scalars, bytes.as_slice()).unwrap();
    assert_eq!(decoded.get("u").unwrap().unwrap().as_u64(), Some(u64::MAX));
}

#[test]
fn empty_string_and_bytes_round_trip_as_present() {
    let (_pool, scalars) = support::scalars_pool();
    let mut message = DynamicMessage::new(scalars.clone());
    message.set("s", Value::String(String::new())).unwrap();
    message.set("b", Value::Bytes(Vec::new())).unwrap();

    assert!(message.has("s").unwrap());
    assert!(message.has("b").unwrap());

    let bytes = encode(&message);
    let decoded = decode(scalars, bytes.as_slice()).unwrap();
    assert!(decoded.has("s").unwrap());
    assert!(decoded.has("b").unwrap());
    assert_eq!(decoded.get("s").unwrap().unwrap().as_str(), Some(""));
}

#[test]
fn map_with_zero_key_and_empty_string_key_round_trips() {
    let (_pool, counts) = support::counts_pool();
    let mut message = DynamicMessage::new(counts.clone());
    message
        .set_map_entry("counts", MapKey::String(String::new()), Value::I32(0))
        .unwrap();

    let bytes = encode(&message);
    let decoded = decode(counts, bytes.as_slice()).unwrap();
    let map = decoded.get("counts").unwrap().unwrap();
    assert_eq!(
        map.as_map().unwrap().get(&MapKey::String(String::new())),
        Some(&Value::I32(0))
    );
}

#[test]
fn zero_element_packed_repeated_round_trips_to_absent() {
    let (_pool, tags) = support::tags_pool();
    let message = DynamicMessage::new(tags.clone());
    assert!(!message.has("tags").unwrap());

    let bytes = encode(&message);
    assert!(bytes.is_empty());

    let decoded = decode(tags, bytes.as_slice()).unwrap();
    assert!(!decoded.has("tags").unwrap());
}

#[test]
fn presence_distinguishes_unset_from_set_to_default() {
    let (_pool, person) = support::person_pool();
    let mut unset = DynamicMessage::new(person.clone());
    let mut set_to_default = DynamicMessage::new(person.clone());
    set_to_default.set("age", Value::I32(0)).unwrap();
    unset.set("name", Value::String("x".to_string())).unwrap();
    set_to_default.set("name", Value::String("x".to_string())).unwrap();

    assert!(!unset.has("age").unwrap());
    assert!(set_to_default.has("age").unwrap());

    let decoded = decode(person, encode(&set_to_default).as_slice()).unwrap();
    assert!(decoded.has("age").unwrap());
    assert_eq!(decoded.get("age").unwrap().unwrap().as_i32(), Some(0));
}
