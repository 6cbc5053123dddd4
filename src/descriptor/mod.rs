//! The descriptor pool: a registry of message, enum and service descriptors built
//! from `FileDescriptorProto` input, with late-bound cross-file type references.

mod build;
mod enum_ty;
mod error;
mod file;
mod message;
mod pool;
mod service;

pub use self::enum_ty::{EnumDescriptor, EnumValueDescriptor};
pub use self::error::{DescriptorError, RegistryError};
pub use self::file::FileDescriptor;
pub use self::message::{FieldDescriptor, MessageDescriptor, OneofDescriptor};
pub use self::pool::DescriptorPool;
pub use self::service::{MethodDescriptor, ServiceDescriptor};

use std::sync::Arc;

/// Field numbers reserved by the wire format for the key and value of a
/// synthetic map-entry message.
pub(crate) const MAP_ENTRY_KEY_NUMBER: u32 = 1;
pub(crate) const MAP_ENTRY_VALUE_NUMBER: u32 = 2;

/// Field numbers `19000..20000` are reserved for internal protobuf use and may
/// never be assigned by a message definition.
pub(crate) const RESERVED_FIELD_NUMBERS: std::ops::Range<i32> = 19_000..20_000;

/// The full legal range for a field number, end-exclusive.
pub(crate) const VALID_FIELD_NUMBERS: std::ops::Range<i32> = 1..536_870_912;

/// The syntax a `.proto` file was written against. Affects default field
/// presence and enum value-zero requirements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Syntax {
    Proto2,
    Proto3,
}

/// Whether a field may appear zero-or-one, exactly-one, or many times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
    Optional,
    Required,
    Repeated,
}

/// The resolved type of a field, enum value, or map key/value slot.
///
/// `Message` and `Enum` carry a fully resolved descriptor handle rather than a
/// bare name: by the time a [`FieldDescriptor`] is reachable through the public
/// API, the pool has already verified that its type reference resolves to a
/// registered symbol, so resolution here cannot fail.
#[derive(Debug, Clone)]
pub enum Kind {
    Double,
    Float,
    Int32,
    Int64,
    Uint32,
    Uint64,
    Sint32,
    Sint64,
    Fixed32,
    Fixed64,
    Sfixed32,
    Sfixed64,
    Bool,
    String,
    Bytes,
    Message(MessageDescriptor),
    Enum(EnumDescriptor),
}

impl PartialEq for Kind {
    fn eq(&self, other: &Self) -> bool {
        use Kind::*;
        match (self, other) {
            (Double, Double)
            | (Float, Float)
            | (Int32, Int32)
            | (Int64, Int64)
            | (Uint32, Uint32)
            | (Uint64, Uint64)
            | (Sint32, Sint32)
            | (Sint64, Sint64)
            | (Fixed32, Fixed32)
            | (Fixed64, Fixed64)
            | (Sfixed32, Sfixed32)
            | (Sfixed64, Sfixed64)
            | (Bool, Bool)
            | (String, String)
            | (Bytes, Bytes) => true,
            (Message(a), Message(b)) => a == b,
            (Enum(a), Enum(b)) => a == b,
            _ => false,
        }
    }
}

impl Kind {
    pub fn is_message(&self) -> bool {
        matches!(self, Kind::Message(_))
    }

    pub fn is_enum(&self) -> bool {
        matches!(self, Kind::Enum(_))
    }

    pub fn as_message(&self) -> Option<&MessageDescriptor> {
        match self {
            Kind::Message(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumDescriptor> {
        match self {
            Kind::Enum(e) => Some(e),
            _ => None,
        }
    }
}

/// The non-resolving twin of [`Kind`], stored in [`FieldData`] so that building
/// a message's field table never itself requires the referenced type to exist
/// yet (only that it exists by the time the file finishes registering).
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TypeRef {
    Double,
    Float,
    Int32,
    Int64,
    Uint32,
    Uint64,
    Sint32,
    Sint64,
    Fixed32,
    Fixed64,
    Sfixed32,
    Sfixed64,
    Bool,
    String,
    Bytes,
    Message(String),
    Enum(String),
    Group(String),
}

impl TypeRef {
    pub(crate) fn type_name(&self) -> Option<&str> {
        match self {
            TypeRef::Message(name) | TypeRef::Enum(name) | TypeRef::Group(name) => Some(name),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub(crate) struct FileData {
    pub name: String,
    pub package: String,
    pub syntax: Syntax,
    pub dependencies: Vec<String>,
    pub top_level_messages: Vec<Arc<MessageData>>,
    pub top_level_enums: Vec<Arc<EnumData>>,
    pub services: Vec<Arc<ServiceData>>,
}

#[derive(Debug)]
pub(crate) struct MessageData {
    pub full_name: String,
    pub name: String,
    pub file: String,
    pub is_map_entry: bool,
    pub fields: Vec<Arc<FieldData>>,
    pub field_by_number: std::collections::BTreeMap<u32, usize>,
    pub field_by_name: std::collections::HashMap<String, usize>,
    pub field_by_json_name: std::collections::HashMap<String, usize>,
    pub oneofs: Vec<Arc<OneofData>>,
    pub nested_messages: Vec<Arc<MessageData>>,
    pub nested_enums: Vec<Arc<EnumData>>,
}

#[derive(Debug)]
pub(crate) struct FieldData {
    pub name: String,
    pub json_name: String,
    pub number: u32,
    pub ty: TypeRef,
    pub cardinality: Cardinality,
    pub has_explicit_presence: bool,
    pub oneof_index: Option<usize>,
}

#[derive(Debug)]
pub(crate) struct OneofData {
    pub name: String,
    pub fields: Vec<u32>,
}

#[derive(Debug)]
pub(crate) struct EnumData {
    pub full_name: String,
    pub name: String,
    pub file: String,
    pub values: Vec<(String, i32)>,
    pub value_by_name: std::collections::HashMap<String, usize>,
    pub value_by_number: std::collections::BTreeMap<i32, usize>,
}

#[derive(Debug)]
pub(crate) struct ServiceData {
    pub full_name: String,
    pub name: String,
    pub file: String,
    pub methods: Vec<Arc<MethodData>>,
}

#[derive(Debug)]
pub(crate) struct MethodData {
    pub name: String,
    pub input_type: String,
    pub output_type: String,
    pub client_streaming: bool,
    pub server_streaming: bool,
}
