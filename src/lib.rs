//! Runtime protobuf reflection: a descriptor pool, dynamic messages, and wire/JSON
//! codecs, all driven by `FileDescriptorProto` input instead of generated code.
//!
//! ```no_run
//! use protoreflect_dyn::{DescriptorPool, Value};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = DescriptorPool::new();
//! let message = pool.create_message("my.package.Person").unwrap();
//! # Ok(())
//! # }
//! ```

mod descriptor;
mod dynamic;
pub mod path;
mod wkt;

pub use crate::descriptor::{
    Cardinality, DescriptorError, EnumDescriptor, EnumValueDescriptor, FieldDescriptor,
    FileDescriptor, Kind, MessageDescriptor, MethodDescriptor, OneofDescriptor, RegistryError,
    ServiceDescriptor, Syntax,
};
pub use crate::dynamic::wire::{decode, encode, merge, DecodeError};
pub use crate::dynamic::{DynamicMessage, FieldKey, MapKey, MessageError, Value};
pub use crate::path::{Builder, PathError};

/// The canonical protobuf JSON mapping, as plain functions over message
/// text rather than a `serde` trait implementation.
pub mod json {
    pub use crate::dynamic::json::{marshal, unmarshal, unmarshal_strict, JsonError};
}

pub use crate::descriptor::DescriptorPool;

/// Re-exports of the wire-format types used to bootstrap a [`DescriptorPool`] from
/// the protobuf self-description format.
pub mod proto {
    pub use prost_types::field_descriptor_proto;
    pub use prost_types::{
        DescriptorProto, EnumDescriptorProto, EnumValueDescriptorProto, FieldDescriptorProto,
        FileDescriptorProto, FileDescriptorSet, MessageOptions, OneofDescriptorProto,
    };
}
