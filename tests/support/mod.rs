//! Hand-built `FileDescriptorProto` fixtures shared across the integration
//! test binaries. There's no `protoc` invocation anywhere in this crate, so
//! every fixture here is a literal struct rather than something compiled
//! from a `.proto` file.

use protoreflect_dyn::proto::field_descriptor_proto::{Label, Type};
use protoreflect_dyn::proto::{DescriptorProto, FieldDescriptorProto, FileDescriptorProto, OneofDescriptorProto};
use protoreflect_dyn::DescriptorPool;

pub fn scalar_field(name: &str, number: i32, ty: Type, label: Label) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_string()),
        number: Some(number),
        label: Some(label as i32),
        r#type: Some(ty as i32),
        ..Default::default()
    }
}

pub fn message_field(name: &str, number: i32, type_name: &str, label: Label) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_string()),
        number: Some(number),
        label: Some(label as i32),
        r#type: Some(Type::Message as i32),
        type_name: Some(type_name.to_string()),
        ..Default::default()
    }
}

/// `message Person { string name = 1; int32 age = 2; }`
pub fn person_pool() -> (DescriptorPool, protoreflect_dyn::MessageDescriptor) {
    let pool = DescriptorPool::new();
    pool.add_file(FileDescriptorProto {
        name: Some("person.proto".to_string()),
        package: Some("test".to_string()),
        syntax: Some("proto3".to_string()),
        message_type: vec![DescriptorProto {
            name: Some("Person".to_string()),
            field: vec![
                scalar_field("name", 1, Type::String, Label::Optional),
                scalar_field("age", 2, Type::Int32, Label::Optional),
            ],
            ..Default::default()
        }],
        ..Default::default()
    })
    .unwrap();
    let desc = pool.get_message_by_name("test.Person").unwrap();
    (pool, desc)
}

/// `message Tags { repeated int32 tags = 1; }`
pub fn tags_pool() -> (DescriptorPool, protoreflect_dyn::MessageDescriptor) {
    let pool = DescriptorPool::new();
    pool.add_file(FileDescriptorProto {
        name: Some("tags.proto".to_string()),
        package: Some("test".to_string()),
        syntax: Some("proto3".to_string()),
        message_type: vec![DescriptorProto {
            name: Some("Tags".to_string()),
            field: vec![scalar_field("tags", 1, Type::Int32, Label::Repeated)],
            ..Default::default()
        }],
        ..Default::default()
    })
    .unwrap();
    let desc = pool.get_message_by_name("test.Tags").unwrap();
    (pool, desc)
}

/// `message Counts { map<string, int32> counts = 1; }`
pub fn counts_pool() -> (DescriptorPool, protoreflect_dyn::MessageDescriptor) {
    let pool = DescriptorPool::new();
    pool.add_file(FileDescriptorProto {
        name: Some("counts.proto".to_string()),
        package: Some("test".to_string()),
        syntax: Some("proto3".to_string()),
        message_type: vec![DescriptorProto {
            name: Some("Counts".to_string()),
            field: vec![message_field(
                "counts",
                1,
                "test.Counts.CountsEntry",
                Label::Repeated,
            )],
            nested_type: vec![DescriptorProto {
                name: Some("CountsEntry".to_string()),
                field: vec![
                    scalar_field("key", 1, Type::String, Label::Optional),
                    scalar_field("value", 2, Type::Int32, Label::Optional),
                ],
                options: Some(protoreflect_dyn::proto::MessageOptions {
                    map_entry: Some(true),
                    ..Default::default()
                }),
                ..Default::default()
            }],
            ..Default::default()
        }],
        ..Default::default()
    })
    .unwrap();
    let desc = pool.get_message_by_name("test.Counts").unwrap();
    (pool, desc)
}

/// `message Contact { oneof contact { string email = 1; string phone = 2; } }`
pub fn contact_pool() -> (DescriptorPool, protoreflect_dyn::MessageDescriptor) {
    let pool = DescriptorPool::new();
    pool.add_file(FileDescriptorProto {
        name: Some("contact.proto".to_string()),
        package: Some("test".to_string()),
        syntax: Some("proto3".to_string()),
        message_type: vec![DescriptorProto {
            name: Some("Contact".to_string()),
            field: vec![
                FieldDescriptorProto {
                    oneof_index: Some(0),
                    ..scalar_field("email", 1, Type::String, Label::Optional)
                },
                FieldDescriptorProto {
                    oneof_index: Some(0),
                    ..scalar_field("phone", 2, Type::String, Label::Optional)
                },
            ],
            oneof_decl: vec![OneofDescriptorProto {
                name: Some("contact".to_string()),
                ..Default::default()
            }],
            ..Default::default()
        }],
        ..Default::default()
    })
    .unwrap();
    let desc = pool.get_message_by_name("test.Contact").unwrap();
    (pool, desc)
}

/// A descriptor that knows only field 1 (`int32 a = 1;`), to exercise
/// unknown-field preservation against a fuller descriptor of the same
/// message name registered in a separate pool.
pub fn narrow_pool() -> (DescriptorPool, protoreflect_dyn::MessageDescriptor) {
    let pool = DescriptorPool::new();
    pool.add_file(FileDescriptorProto {
        name: Some("narrow.proto".to_string()),
        package: Some("test".to_string()),
        syntax: Some("proto3".to_string()),
        message_type: vec![DescriptorProto {
            name: Some("Wide".to_string()),
            field: vec![scalar_field("a", 1, Type::Int32, Label::Optional)],
            ..Default::default()
        }],
        ..Default::default()
    })
    .unwrap();
    let desc = pool.get_message_by_name("test.Wide").unwrap();
    (pool, desc)
}

/// The same message name as [`narrow_pool`], but with field 15 declared too.
pub fn wide_pool() -> (DescriptorPool, protoreflect_dyn::MessageDescriptor) {
    let pool = DescriptorPool::new();
    pool.add_file(FileDescriptorProto {
        name: Some("narrow.proto".to_string()),
        package: Some("test".to_string()),
        syntax: Some("proto3".to_string()),
        message_type: vec![DescriptorProto {
            name: Some("Wide".to_string()),
            field: vec![
                scalar_field("a", 1, Type::Int32, Label::Optional),
                scalar_field("extra", 15, Type::String, Label::Optional),
            ],
            ..Default::default()
        }],
        ..Default::default()
    })
    .unwrap();
    let desc = pool.get_message_by_name("test.Wide").unwrap();
    (pool, desc)
}

/// `message Scalars { uint64 u = 1; int32 n = 2; string s = 3; bytes b = 4; }`
pub fn scalars_pool() -> (DescriptorPool, protoreflect_dyn::MessageDescriptor) {
    let pool = DescriptorPool::new();
    pool.add_file(FileDescriptorProto {
        name: Some("scalars.proto".to_string()),
        package: Some("test".to_string()),
        syntax: Some("proto3".to_string()),
        message_type: vec![DescriptorProto {
            name: Some("Scalars".to_string()),
            field: vec![
                scalar_field("u", 1, Type::Uint64, Label::Optional),
                scalar_field("n", 2, Type::Int32, Label::Optional),
                scalar_field("s", 3, Type::String, Label::Optional),
                scalar_field("b", 4, Type::Bytes, Label::Optional),
            ],
            ..Default::default()
        }],
        ..Default::default()
    })
    .unwrap();
    let desc = pool.get_message_by_name("test.Scalars").unwrap();
    (pool, desc)
}

/// `message Address { string city = 1; } message Person2 { string name = 1; Address address = 2; repeated string nicknames = 3; }`
pub fn nested_pool() -> (DescriptorPool, protoreflect_dyn::MessageDescriptor) {
    let pool = DescriptorPool::new();
    pool.add_file(FileDescriptorProto {
        name: Some("nested.proto".to_string()),
        package: Some("test".to_string()),
        syntax: Some("proto3".to_string()),
        message_type: vec![
            DescriptorProto {
                name: Some("Address".to_string()),
                field: vec![scalar_field("city", 1, Type::String, Label::Optional)],
                ..Default::default()
            },
            DescriptorProto {
                name: Some("Person2".to_string()),
                field: vec![
                    scalar_field("name", 1, Type::String, Label::Optional),
                    message_field("address", 2, "test.Address", Label::Optional),
                    scalar_field("nicknames", 3, Type::String, Label::Repeated),
                ],
                ..Default::default()
            },
        ],
        ..Default::default()
    })
    .unwrap();
    let desc = pool.get_message_by_name("test.Person2").unwrap();
    (pool, desc)
}
