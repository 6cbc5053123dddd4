//! The literal end-to-end scenarios a wire-compatible reflection layer must
//! get right.

#[path = "support/mod.rs"]
mod support;

use protoreflect_dyn::{encode, Value};

#[test]
fn simple_round_trip() {
    let (_pool, person) = support::person_pool();
    let mut message = protoreflect_dyn::DynamicMessage::new(person.clone());
    message.set("name", Value::String("Alice".to_string())).unwrap();
    message.set("age", Value::I32(30)).unwrap();

    let bytes = encode(&message);
    assert_eq!(
        bytes,
        vec![0x0A, 0x05, 0x41, 0x6C, 0x69, 0x63, 0x65, 0x10, 0x1E]
    );

    let decoded = protoreflect_dyn::decode(person, bytes.as_slice()).unwrap();
    assert_eq!(decoded, message);
}

#[test]
fn repeated_packed() {
    let (_pool, tags) = support::tags_pool();
    let mut message = protoreflect_dyn::DynamicMessage::new(tags);
    for v in [1, 150, 300] {
        message.add_repeated("tags", Value::I32(v)).unwrap();
    }

    let bytes = encode(&message);
    assert_eq!(bytes, vec![0x0A, 0x05, 0x01, 0x96, 0x01, 0xAC, 0x02]);

    let (_pool2, tags2) = support::tags_pool();
    let decoded = protoreflect_dyn::decode(tags2, bytes.as_slice()).unwrap();
    assert_eq!(
        decoded.get("tags").unwrap().unwrap().as_list().unwrap(),
        &[Value::I32(1), Value::I32(150), Value::I32(300)]
    );
}

#[test]
fn map_encoding() {
    let (_pool, counts) = support::counts_pool();
    let mut message = protoreflect_dyn::DynamicMessage::new(counts.clone());
    message
        .set_map_entry("counts", protoreflect_dyn::MapKey::String("a".to_string()), Value::I32(1))
        .unwrap();
    message
        .set_map_entry("counts", protoreflect_dyn::MapKey::String("b".to_string()), Value::I32(2))
        .unwrap();

    let bytes = encode(&message);
    let decoded = protoreflect_dyn::decode(counts, bytes.as_slice()).unwrap();
    let map = decoded.get("counts").unwrap().unwrap();
    assert_eq!(map.as_map().unwrap().len(), 2);
}

#[test]
fn oneof_exclusivity() {
    let (_pool, contact) = support::contact_pool();
    let mut message = protoreflect_dyn::DynamicMessage::new(contact);
    message.set("email", Value::String("x".to_string())).unwrap();
    message.set("phone", Value::String("y".to_string())).unwrap();

    assert!(!message.has("email").unwrap());
    assert!(message.has("phone").unwrap());
    assert!(message.get("email").unwrap().is_none());
    assert_eq!(
        message.get("phone").unwrap().unwrap().as_str(),
        Some("y")
    );
}

#[test]
fn unknown_field_preservation() {
    let (_narrow_pool, narrow) = support::narrow_pool();
    let bytes = [0x08u8, 0x2A, 0x7A, 0x03, 0x66, 0x6F, 0x6F];

    let decoded = protoreflect_dyn::decode(narrow, bytes.as_slice()).unwrap();
    assert!(decoded.has(1u32).unwrap());
    assert_eq!(decoded.get(1u32).unwrap().unwrap().as_i32(), Some(42));

    let re_encoded = encode(&decoded);
    assert_eq!(re_encoded, bytes);

    let (_wide_pool, wide) = support::wide_pool();
    let redecoded = protoreflect_dyn::decode(wide, re_encoded.as_slice()).unwrap();
    assert_eq!(
        redecoded.get("extra").unwrap().unwrap().as_str(),
        Some("foo")
    );
}

#[test]
fn registry_atomicity() {
    use protoreflect_dyn::{proto::field_descriptor_proto::{Label, Type}, DescriptorPool, RegistryError};

    let pool = DescriptorPool::new();
    pool.add_file(protoreflect_dyn::proto::FileDescriptorProto {
        name: Some("f1.proto".to_string()),
        package: Some("pkg".to_string()),
        syntax: Some("proto3".to_string()),
        message_type: vec![protoreflect_dyn::proto::DescriptorProto {
            name: Some("T".to_string()),
            field: vec![support::scalar_field("x", 1, Type::Int32, Label::Optional)],
            ..Default::default()
        }],
        ..Default::default()
    })
    .unwrap();

    let err = pool
        .add_file(protoreflect_dyn::proto::FileDescriptorProto {
            name: Some("f2.proto".to_string()),
            package: Some("pkg".to_string()),
            syntax: Some("proto3".to_string()),
            message_type: vec![protoreflect_dyn::proto::DescriptorProto {
                name: Some("T".to_string()),
                field: vec![support::scalar_field("x", 1, Type::Int32, Label::Optional)],
                ..Default::default()
            }],
            ..Default::default()
        })
        .unwrap_err();
    assert!(matches!(err, RegistryError::DuplicateSymbol { .. }));
    assert!(pool.get_file_by_name("f2.proto").is_none());
    assert_eq!(pool.get_message_by_name("pkg.T").unwrap().fields().count(), 1);
}
