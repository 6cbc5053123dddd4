//! Hand-assembled descriptors for the well-known types, since there's no
//! `protoc` invocation in this crate to generate them from
//! `google/protobuf/*.proto`. [`DescriptorPool::global`][crate::DescriptorPool::global]
//! preloads exactly these.

use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::{
    DescriptorProto, EnumDescriptorProto, EnumValueDescriptorProto, FieldDescriptorProto,
    FileDescriptorProto, FileDescriptorSet, MessageOptions, OneofDescriptorProto,
};

use crate::descriptor::{DescriptorPool, RegistryError};

fn scalar_field(name: &str, number: i32, ty: Type) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_string()),
        number: Some(number),
        label: Some(Label::Optional as i32),
        r#type: Some(ty as i32),
        ..Default::default()
    }
}

fn message_field(name: &str, number: i32, type_name: &str, label: Label) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_string()),
        number: Some(number),
        label: Some(label as i32),
        r#type: Some(Type::Message as i32),
        type_name: Some(type_name.to_string()),
        ..Default::default()
    }
}

fn oneof_member(
    name: &str,
    number: i32,
    ty: Type,
    type_name: Option<&str>,
    oneof_index: i32,
) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_string()),
        number: Some(number),
        label: Some(Label::Optional as i32),
        r#type: Some(ty as i32),
        type_name: type_name.map(str::to_string),
        oneof_index: Some(oneof_index),
        ..Default::default()
    }
}

fn wrapper_message(name: &str, ty: Type) -> DescriptorProto {
    DescriptorProto {
        name: Some(name.to_string()),
        field: vec![scalar_field("value", 1, ty)],
        ..Default::default()
    }
}

fn wrappers_file() -> FileDescriptorProto {
    FileDescriptorProto {
        name: Some("google/protobuf/wrappers.proto".to_string()),
        package: Some("google.protobuf".to_string()),
        syntax: Some("proto3".to_string()),
        message_type: vec![
            wrapper_message("DoubleValue", Type::Double),
            wrapper_message("FloatValue", Type::Float),
            wrapper_message("Int64Value", Type::Int64),
            wrapper_message("UInt64Value", Type::Uint64),
            wrapper_message("Int32Value", Type::Int32),
            wrapper_message("UInt32Value", Type::Uint32),
            wrapper_message("BoolValue", Type::Bool),
            wrapper_message("StringValue", Type::String),
            wrapper_message("BytesValue", Type::Bytes),
        ],
        ..Default::default()
    }
}

fn timestamp_file() -> FileDescriptorProto {
    FileDescriptorProto {
        name: Some("google/protobuf/timestamp.proto".to_string()),
        package: Some("google.protobuf".to_string()),
        syntax: Some("proto3".to_string()),
        message_type: vec![DescriptorProto {
            name: Some("Timestamp".to_string()),
            field: vec![
                scalar_field("seconds", 1, Type::Int64),
                scalar_field("nanos", 2, Type::Int32),
            ],
            ..Default::default()
        }],
        ..Default::default()
    }
}

fn duration_file() -> FileDescriptorProto {
    FileDescriptorProto {
        name: Some("google/protobuf/duration.proto".to_string()),
        package: Some("google.protobuf".to_string()),
        syntax: Some("proto3".to_string()),
        message_type: vec![DescriptorProto {
            name: Some("Duration".to_string()),
            field: vec![
                scalar_field("seconds", 1, Type::Int64),
                scalar_field("nanos", 2, Type::Int32),
            ],
            ..Default::default()
        }],
        ..Default::default()
    }
}

fn any_file() -> FileDescriptorProto {
    FileDescriptorProto {
        name: Some("google/protobuf/any.proto".to_string()),
        package: Some("google.protobuf".to_string()),
        syntax: Some("proto3".to_string()),
        message_type: vec![DescriptorProto {
            name: Some("Any".to_string()),
            field: vec![
                scalar_field("type_url", 1, Type::String),
                scalar_field("value", 2, Type::Bytes),
            ],
            ..Default::default()
        }],
        ..Default::default()
    }
}

fn empty_file() -> FileDescriptorProto {
    FileDescriptorProto {
        name: Some("google/protobuf/empty.proto".to_string()),
        package: Some("google.protobuf".to_string()),
        syntax: Some("proto3".to_string()),
        message_type: vec![DescriptorProto {
            name: Some("Empty".to_string()),
            ..Default::default()
        }],
        ..Default::default()
    }
}

fn struct_file() -> FileDescriptorProto {
    let null_value = EnumDescriptorProto {
        name: Some("NullValue".to_string()),
        value: vec![EnumValueDescriptorProto {
            name: Some("NULL_VALUE".to_string()),
            number: Some(0),
            ..Default::default()
        }],
        ..Default::default()
    };

    let fields_entry = DescriptorProto {
        name: Some("FieldsEntry".to_string()),
        field: vec![
            scalar_field("key", 1, Type::String),
            message_field("value", 2, "google.protobuf.Value", Label::Optional),
        ],
        options: Some(MessageOptions {
            map_entry: Some(true),
            ..Default::default()
        }),
        ..Default::default()
    };

    let struct_message = DescriptorProto {
        name: Some("Struct".to_string()),
        field: vec![message_field(
            "fields",
            1,
            "google.protobuf.Struct.FieldsEntry",
            Label::Repeated,
        )],
        nested_type: vec![fields_entry],
        ..Default::default()
    };

    let value_message = DescriptorProto {
        name: Some("Value".to_string()),
        field: vec![
            oneof_member("null_value", 1, Type::Enum, Some("google.protobuf.NullValue"), 0),
            oneof_member("number_value", 2, Type::Double, None, 0),
            oneof_member("string_value", 3, Type::String, None, 0),
            oneof_member("bool_value", 4, Type::Bool, None, 0),
            oneof_member("struct_value", 5, Type::Message, Some("google.protobuf.Struct"), 0),
            oneof_member(
                "list_value",
                6,
                Type::Message,
                Some("google.protobuf.ListValue"),
                0,
            ),
        ],
        oneof_decl: vec![OneofDescriptorProto {
            name: Some("kind".to_string()),
            ..Default::default()
        }],
        ..Default::default()
    };

    let list_value_message = DescriptorProto {
        name: Some("ListValue".to_string()),
        field: vec![message_field("values", 1, "google.protobuf.Value", Label::Repeated)],
        ..Default::default()
    };

    FileDescriptorProto {
        name: Some("google/protobuf/struct.proto".to_string()),
        package: Some("google.protobuf".to_string()),
        syntax: Some("proto3".to_string()),
        message_type: vec![struct_message, value_message, list_value_message],
        enum_type: vec![null_value],
        ..Default::default()
    }
}

/// Registers `google/protobuf/{wrappers,timestamp,duration,any,empty,struct}.proto`
/// as a single batch.
pub(crate) fn register_well_known_types(pool: &DescriptorPool) -> Result<(), RegistryError> {
    pool.add_file_set(FileDescriptorSet {
        file: vec![
            wrappers_file(),
            timestamp_file(),
            duration_file(),
            any_file(),
            empty_file(),
            struct_file(),
        ],
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_register_without_error() {
        let pool = DescriptorPool::new();
        register_well_known_types(&pool).unwrap();
        assert!(pool.get_message_by_name("google.protobuf.Timestamp").is_some());
        assert!(pool.get_message_by_name("google.protobuf.Any").is_some());
        assert!(pool.get_message_by_name("google.protobuf.DoubleValue").is_some());
        assert!(pool.get_message_by_name("google.protobuf.Struct").is_some());
        assert!(pool.get_message_by_name("google.protobuf.Value").is_some());
        assert!(pool.get_message_by_name("google.protobuf.ListValue").is_some());
        assert!(pool.get_enum_by_name("google.protobuf.NullValue").is_some());
    }

    #[test]
    fn global_pool_has_builtins() {
        let pool = DescriptorPool::global();
        assert!(pool.get_message_by_name("google.protobuf.Duration").is_some());
    }
}
