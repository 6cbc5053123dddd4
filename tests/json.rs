#[path = "support/mod.rs"]
mod support;

use protoreflect_dyn::json;
use protoreflect_dyn::{DescriptorPool, DynamicMessage, Value};

#[test]
fn message_round_trips_through_json() {
    let (_pool, nested) = support::nested_pool();
    let mut message = DynamicMessage::new(nested.clone());
    message.set("name", Value::String("Alice".to_string())).unwrap();
    message
        .set(
            "address",
            Value::Message({
                let address = nested
                    .pool()
                    .get_message_by_name("test.Address")
                    .unwrap();
                let mut addr = DynamicMessage::new(address);
                addr.set("city", Value::String("Springfield".to_string())).unwrap();
                addr
            }),
        )
        .unwrap();
    message.add_repeated("nicknames", Value::String("Al".to_string())).unwrap();
    message.add_repeated("nicknames", Value::String("Ali".to_string())).unwrap();

    let text = json::marshal(&message).unwrap();
    let decoded = json::unmarshal(&nested, &text).unwrap();
    assert_eq!(decoded, message);
}

#[test]
fn unknown_key_is_ignored_unless_strict() {
    let (_pool, person) = support::person_pool();
    let text = r#"{"name":"Bob","age":20,"bogus":true}"#;

    let decoded = json::unmarshal(&person, text).unwrap();
    assert_eq!(decoded.get("name").unwrap().unwrap().as_str(), Some("Bob"));

    let err = json::unmarshal_strict(&person, text).unwrap_err();
    assert!(matches!(err, json::JsonError::UnknownField { .. }));
}

#[test]
fn timestamp_marshals_as_rfc3339() {
    let pool = DescriptorPool::global();
    let desc = pool.get_message_by_name("google.protobuf.Timestamp").unwrap();
    let mut message = DynamicMessage::new(desc.clone());
    message.set(1u32, Value::I64(1_600_000_000)).unwrap();
    message.set(2u32, Value::I32(0)).unwrap();

    let text = json::marshal(&message).unwrap();
    assert_eq!(text, "\"2020-09-13T12:26:40Z\"");

    let decoded = json::unmarshal(&desc, &text).unwrap();
    assert_eq!(decoded, message);
}

#[test]
fn duration_marshals_with_seconds_suffix() {
    let pool = DescriptorPool::global();
    let desc = pool.get_message_by_name("google.protobuf.Duration").unwrap();
    let mut message = DynamicMessage::new(desc.clone());
    message.set(1u32, Value::I64(5)).unwrap();
    message.set(2u32, Value::I32(250_000_000)).unwrap();

    let text = json::marshal(&message).unwrap();
    assert_eq!(text, "\"5.250000000s\"");

    let decoded = json::unmarshal(&desc, &text).unwrap();
    assert_eq!(decoded, message);
}

#[test]
fn wrapper_marshals_as_bare_value() {
    let pool = DescriptorPool::global();
    let desc = pool.get_message_by_name("google.protobuf.Int32Value").unwrap();
    let mut message = DynamicMessage::new(desc.clone());
    message.set(1u32, Value::I32(7)).unwrap();

    assert_eq!(json::marshal(&message).unwrap(), "7");

    let decoded = json::unmarshal(&desc, "7").unwrap();
    assert_eq!(decoded, message);
}

#[test]
fn empty_marshals_as_empty_object() {
    let pool = DescriptorPool::global();
    let desc = pool.get_message_by_name("google.protobuf.Empty").unwrap();
    let message = DynamicMessage::new(desc.clone());
    assert_eq!(json::marshal(&message).unwrap(), "{}");
}

#[test]
fn any_round_trips_with_embedded_message() {
    let pool = DescriptorPool::global();
    pool.add_file(protoreflect_dyn::proto::FileDescriptorProto {
        name: Some("any_payload.proto".to_string()),
        package: Some("test".to_string()),
        syntax: Some("proto3".to_string()),
        message_type: vec![protoreflect_dyn::proto::DescriptorProto {
            name: Some("Payload".to_string()),
            field: vec![support::scalar_field(
                "text",
                1,
                protoreflect_dyn::proto::field_descriptor_proto::Type::String,
                protoreflect_dyn::proto::field_descriptor_proto::Label::Optional,
            )],
            ..Default::default()
        }],
        ..Default::default()
    })
    .unwrap();

    let payload_desc = pool.get_message_by_name("test.Payload").unwrap();
    let mut payload = DynamicMessage::new(payload_desc);
    payload.set("text", Value::String("hi".to_string())).unwrap();
    let payload_bytes = protoreflect_dyn::encode(&payload);

    let any_desc = pool.get_message_by_name("google.protobuf.Any").unwrap();
    let mut any = DynamicMessage::new(any_desc.clone());
    any.set(
        1u32,
        Value::String("type.googleapis.com/test.Payload".to_string()),
    )
    .unwrap();
    any.set(2u32, Value::Bytes(payload_bytes)).unwrap();

    let text = json::marshal(&any).unwrap();
    assert!(text.contains("\"@type\":\"type.googleapis.com/test.Payload\""));
    assert!(text.contains("\"text\":\"hi\""));

    let decoded = json::unmarshal(&any_desc, &text).unwrap();
    assert_eq!(decoded, any);
}

#[test]
fn any_with_unregistered_type_fails() {
    let any_desc = DescriptorPool::global()
        .get_message_by_name("google.protobuf.Any")
        .unwrap();
    let text = r#"{"@type":"type.googleapis.com/nonexistent.Thing"}"#;
    let err = json::unmarshal(&any_desc, text).unwrap_err();
    assert!(matches!(err, json::JsonError::UnknownType { .. }));
}
