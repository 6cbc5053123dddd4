//! Converts `prost_types::FileDescriptorProto` into the pool's internal,
//! validated representation. Nothing here touches the pool's symbol table —
//! [`pool`][super::pool] owns resolving cross-file type references and
//! detecting duplicates, so that a whole batch of files can be validated and
//! installed atomically.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::{DescriptorProto, EnumDescriptorProto, FieldDescriptorProto, FileDescriptorProto};

use super::error::DescriptorError;
use super::{
    Cardinality, EnumData, FieldData, FileData, MethodData, OneofData, ServiceData, Syntax,
    TypeRef, RESERVED_FIELD_NUMBERS, VALID_FIELD_NUMBERS,
};

pub(super) struct BuiltFile {
    pub file: Arc<FileData>,
    pub messages: Vec<Arc<super::MessageData>>,
    pub enums: Vec<Arc<EnumData>>,
    pub services: Vec<Arc<ServiceData>>,
}

pub(super) fn build_file(proto: &FileDescriptorProto) -> Result<BuiltFile, DescriptorError> {
    let name = proto.name.clone().unwrap_or_default();
    let package = proto.package.clone().unwrap_or_default();
    let syntax = match proto.syntax.as_deref() {
        None | Some("proto2") | Some("") => Syntax::Proto2,
        Some("proto3") => Syntax::Proto3,
        Some(other) => return Err(DescriptorError::unknown_syntax(other)),
    };

    let mut messages = Vec::new();
    let mut enums = Vec::new();
    let mut services = Vec::new();

    let mut top_level_messages = Vec::new();
    for message in &proto.message_type {
        let built = build_message(message, &package, &name, syntax, &mut messages, &mut enums)?;
        top_level_messages.push(built);
    }

    let mut top_level_enums = Vec::new();
    for en in &proto.enum_type {
        let built = build_enum(en, &package, &name, syntax)?;
        enums.push(built.clone());
        top_level_enums.push(built);
    }

    for service in &proto.service {
        let built = build_service(service, &package, &name)?;
        services.push(built);
    }

    let file = Arc::new(FileData {
        name,
        package,
        syntax,
        dependencies: proto.dependency.clone(),
        top_level_messages,
        top_level_enums,
        services: services.clone(),
    });

    Ok(BuiltFile {
        file,
        messages,
        enums,
        services,
    })
}

fn qualify(package: &str, name: &str) -> String {
    if package.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", package, name)
    }
}

fn build_message(
    proto: &DescriptorProto,
    package: &str,
    file_name: &str,
    syntax: Syntax,
    all_messages: &mut Vec<Arc<super::MessageData>>,
    all_enums: &mut Vec<Arc<EnumData>>,
) -> Result<Arc<super::MessageData>, DescriptorError> {
    let name = proto.name.clone().unwrap_or_default();
    let full_name = qualify(package, &name);

    let mut nested_messages = Vec::new();
    for nested in &proto.nested_type {
        let built = build_message(nested, &full_name, file_name, syntax, all_messages, all_enums)?;
        nested_messages.push(built);
    }

    let mut nested_enums = Vec::new();
    for nested in &proto.enum_type {
        let built = build_enum(nested, &full_name, file_name, syntax)?;
        all_enums.push(built.clone());
        nested_enums.push(built);
    }

    let oneofs: Vec<Arc<OneofData>> = proto
        .oneof_decl
        .iter()
        .map(|o| {
            Arc::new(OneofData {
                name: o.name.clone().unwrap_or_default(),
                fields: Vec::new(),
            })
        })
        .collect();
    let mut oneof_fields: Vec<Vec<u32>> = vec![Vec::new(); oneofs.len()];

    let is_map_entry = proto
        .options
        .as_ref()
        .and_then(|o| o.map_entry)
        .unwrap_or(false);

    let mut fields = Vec::with_capacity(proto.field.len());
    let mut field_by_number = BTreeMap::new();
    let mut field_by_name = HashMap::new();
    let mut field_by_json_name = HashMap::new();
    let mut seen_numbers = std::collections::HashSet::new();
    let mut seen_names = std::collections::HashSet::new();

    for field in &proto.field {
        let field_name = field.name.clone().unwrap_or_default();
        let number = field.number.unwrap_or(0);

        if !VALID_FIELD_NUMBERS.contains(&number) {
            return Err(DescriptorError::invalid_field_number(
                &full_name,
                &field_name,
                number,
            ));
        }
        if RESERVED_FIELD_NUMBERS.contains(&number) {
            return Err(DescriptorError::reserved_field_number(
                &full_name,
                &field_name,
                number,
            ));
        }
        if !seen_numbers.insert(number) {
            return Err(DescriptorError::duplicate_field_number(&full_name, number));
        }
        if !seen_names.insert(field_name.clone()) {
            return Err(DescriptorError::duplicate_field_name(&full_name, &field_name));
        }

        let ty = field_type_ref(field).ok_or_else(|| {
            DescriptorError::missing_field_type(&full_name, &field_name)
        })?;

        let cardinality = match field.label() {
            Label::Optional => Cardinality::Optional,
            Label::Required => Cardinality::Required,
            Label::Repeated => Cardinality::Repeated,
        };

        let oneof_index = match field.oneof_index {
            Some(idx) => {
                let idx = usize::try_from(idx).map_err(|_| {
                    DescriptorError::invalid_oneof_index(&full_name, &field_name)
                })?;
                if idx >= oneofs.len() {
                    return Err(DescriptorError::invalid_oneof_index(&full_name, &field_name));
                }
                oneof_fields[idx].push(number);
                Some(idx)
            }
            None => None,
        };

        let proto3_optional = field.proto3_optional.unwrap_or(false);
        let has_explicit_presence = match cardinality {
            Cardinality::Repeated => false,
            _ => match ty {
                TypeRef::Message(_) => true,
                _ => {
                    oneof_index.is_some()
                        || matches!(syntax, Syntax::Proto2)
                        || proto3_optional
                }
            },
        };

        let json_name = field
            .json_name
            .clone()
            .unwrap_or_else(|| to_lower_camel_case(&field_name));

        let index = fields.len();
        field_by_number.insert(number, index);
        field_by_name.insert(field_name.clone(), index);
        field_by_json_name.insert(json_name.clone(), index);
        field_by_json_name.entry(field_name.clone()).or_insert(index);

        fields.push(Arc::new(FieldData {
            name: field_name,
            json_name,
            number,
            ty,
            cardinality,
            has_explicit_presence,
            oneof_index,
        }));
    }

    let oneofs: Vec<Arc<OneofData>> = oneofs
        .into_iter()
        .zip(oneof_fields)
        .map(|(o, fields)| {
            Arc::new(OneofData {
                name: o.name.clone(),
                fields,
            })
        })
        .collect();

    if is_map_entry {
        let key = field_by_number.get(&super::MAP_ENTRY_KEY_NUMBER);
        let value = field_by_number.get(&super::MAP_ENTRY_VALUE_NUMBER);
        match (key, value) {
            (Some(_), Some(_)) if fields.len() == 2 => {}
            _ => return Err(DescriptorError::invalid_map_entry(&full_name)),
        }
    }

    let data = Arc::new(super::MessageData {
        full_name,
        name,
        file: file_name.to_string(),
        is_map_entry,
        fields,
        field_by_number,
        field_by_name,
        field_by_json_name,
        oneofs,
        nested_messages,
        nested_enums,
    });
    all_messages.push(data.clone());
    Ok(data)
}

fn build_enum(
    proto: &EnumDescriptorProto,
    package: &str,
    file_name: &str,
    syntax: Syntax,
) -> Result<Arc<EnumData>, DescriptorError> {
    let name = proto.name.clone().unwrap_or_default();
    let full_name = qualify(package, &name);

    if proto.value.is_empty() {
        return Err(DescriptorError::empty_enum(&full_name));
    }
    if matches!(syntax, Syntax::Proto3) && proto.value[0].number != Some(0) {
        return Err(DescriptorError::missing_enum_zero_value(&full_name));
    }

    let mut values = Vec::with_capacity(proto.value.len());
    let mut value_by_name = HashMap::new();
    let mut value_by_number = BTreeMap::new();
    for v in &proto.value {
        let vname = v.name.clone().unwrap_or_default();
        let number = v.number.unwrap_or(0);
        let index = values.len();
        value_by_name.insert(vname.clone(), index);
        value_by_number.entry(number).or_insert(index);
        values.push((vname, number));
    }

    Ok(Arc::new(EnumData {
        full_name,
        name,
        file: file_name.to_string(),
        values,
        value_by_name,
        value_by_number,
    }))
}

fn build_service(
    proto: &prost_types::ServiceDescriptorProto,
    package: &str,
    file_name: &str,
) -> Result<Arc<ServiceData>, DescriptorError> {
    let name = proto.name.clone().unwrap_or_default();
    let full_name = qualify(package, &name);
    let methods = proto
        .method
        .iter()
        .map(|m| {
            Arc::new(MethodData {
                name: m.name.clone().unwrap_or_default(),
                input_type: m.input_type.clone().unwrap_or_default(),
                output_type: m.output_type.clone().unwrap_or_default(),
                client_streaming: m.client_streaming.unwrap_or(false),
                server_streaming: m.server_streaming.unwrap_or(false),
            })
        })
        .collect();
    Ok(Arc::new(ServiceData {
        full_name,
        name,
        file: file_name.to_string(),
        methods,
    }))
}

fn field_type_ref(field: &FieldDescriptorProto) -> Option<TypeRef> {
    let type_name = || field.type_name.clone().unwrap_or_default().trim_start_matches('.').to_string();
    Some(match field.r#type() {
        Type::Double => TypeRef::Double,
        Type::Float => TypeRef::Float,
        Type::Int64 => TypeRef::Int64,
        Type::Uint64 => TypeRef::Uint64,
        Type::Int32 => TypeRef::Int32,
        Type::Fixed64 => TypeRef::Fixed64,
        Type::Fixed32 => TypeRef::Fixed32,
        Type::Bool => TypeRef::Bool,
        Type::String => TypeRef::String,
        Type::Bytes => TypeRef::Bytes,
        Type::Uint32 => TypeRef::Uint32,
        Type::Sfixed32 => TypeRef::Sfixed32,
        Type::Sfixed64 => TypeRef::Sfixed64,
        Type::Sint32 => TypeRef::Sint32,
        Type::Sint64 => TypeRef::Sint64,
        Type::Group => {
            if field.type_name.is_none() {
                return None;
            }
            TypeRef::Group(type_name())
        }
        Type::Message => {
            if field.type_name.is_none() {
                return None;
            }
            TypeRef::Message(type_name())
        }
        Type::Enum => {
            if field.type_name.is_none() {
                return None;
            }
            TypeRef::Enum(type_name())
        }
    })
}

/// `field_one_two` -> `fieldOneTwo`, the default protobuf->JSON field name
/// transform applied when a descriptor omits an explicit `json_name`.
pub(crate) fn to_lower_camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut capitalize_next = false;
    for c in name.chars() {
        if c == '_' {
            capitalize_next = true;
        } else if capitalize_next {
            out.extend(c.to_uppercase());
            capitalize_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camel_case_conversion() {
        assert_eq!(to_lower_camel_case("foo_bar"), "fooBar");
        assert_eq!(to_lower_camel_case("foo"), "foo");
        assert_eq!(to_lower_camel_case("foo_bar_baz"), "fooBarBaz");
    }
}
