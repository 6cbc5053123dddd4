//! Dynamic, reflection-driven protobuf messages: values addressed by field
//! descriptor, number, or name, with no compile-time generated type.

pub(crate) mod fields;
pub mod json;
mod text;
mod unknown;
pub mod wire;

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

use crate::descriptor::{FieldDescriptor, MessageDescriptor};

use self::fields::FieldStore;
use self::unknown::UnknownField;

/// A typed value held by a [`DynamicMessage`] field, repeated-field element,
/// or map entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    I32(i32),
    I64(i64),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    String(String),
    Bytes(Vec<u8>),
    EnumNumber(i32),
    Message(DynamicMessage),
    List(Vec<Value>),
    Map(HashMap<MapKey, Value>),
}

impl Value {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::I32(v) => Some(*v),
            _ => None,
        }
    }
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I64(v) => Some(*v),
            _ => None,
        }
    }
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Value::U32(v) => Some(*v),
            _ => None,
        }
    }
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::U64(v) => Some(*v),
            _ => None,
        }
    }
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Value::F32(v) => Some(*v),
            _ => None,
        }
    }
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::F64(v) => Some(*v),
            _ => None,
        }
    }
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(v) => Some(v),
            _ => None,
        }
    }
    pub fn as_enum_number(&self) -> Option<i32> {
        match self {
            Value::EnumNumber(v) => Some(*v),
            _ => None,
        }
    }
    pub fn as_message(&self) -> Option<&DynamicMessage> {
        match self {
            Value::Message(v) => Some(v),
            _ => None,
        }
    }
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(v) => Some(v),
            _ => None,
        }
    }
    pub fn as_map(&self) -> Option<&HashMap<MapKey, Value>> {
        match self {
            Value::Map(v) => Some(v),
            _ => None,
        }
    }
}

/// A map key. Protobuf restricts map keys to a subset of the scalar types
/// that are well-ordered and hashable: booleans, integers, and strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MapKey {
    Bool(bool),
    I32(i32),
    I64(i64),
    U32(u32),
    U64(u64),
    String(String),
}

/// An operation on a [`DynamicMessage`] failed because of a field-shape or
/// type mismatch.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageError {
    FieldNotFound { name: String },
    FieldNotFoundByNumber { number: u32 },
    TypeMismatch { field: FieldDescriptor, value: Value },
    NotRepeated { field: FieldDescriptor },
    NotMap { field: FieldDescriptor },
    MapKeyTypeInvalid { field: FieldDescriptor, key: MapKey },
}

impl fmt::Display for MessageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageError::FieldNotFound { name } => write!(f, "no field named '{}'", name),
            MessageError::FieldNotFoundByNumber { number } => {
                write!(f, "no field numbered {}", number)
            }
            MessageError::TypeMismatch { field, .. } => write!(
                f,
                "value is not valid for field '{}'",
                field.name()
            ),
            MessageError::NotRepeated { field } => {
                write!(f, "field '{}' is not repeated", field.name())
            }
            MessageError::NotMap { field } => write!(f, "field '{}' is not a map", field.name()),
            MessageError::MapKeyTypeInvalid { field, .. } => write!(
                f,
                "key is not valid for map field '{}'",
                field.name()
            ),
        }
    }
}

impl std::error::Error for MessageError {}

/// Selects a field by number or by declared name. Implements `From<u32>` and
/// `From<&str>` so callers write `message.get(1)` or `message.get("name")`
/// interchangeably against the same generic accessor.
pub enum FieldKey<'a> {
    Number(u32),
    Name(&'a str),
}

impl From<u32> for FieldKey<'static> {
    fn from(number: u32) -> Self {
        FieldKey::Number(number)
    }
}

impl<'a> From<&'a str> for FieldKey<'a> {
    fn from(name: &'a str) -> Self {
        FieldKey::Name(name)
    }
}

/// A protobuf message whose shape is determined entirely by a
/// [`MessageDescriptor`] rather than by a compile-time generated type.
#[derive(Clone)]
pub struct DynamicMessage {
    desc: MessageDescriptor,
    store: FieldStore,
}

impl PartialEq for DynamicMessage {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl fmt::Debug for DynamicMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicMessage")
            .field("type", &self.desc.full_name())
            .field("fields", &self.store)
            .finish()
    }
}

impl DynamicMessage {
    /// An empty message of the given type: no field is set.
    pub fn new(desc: MessageDescriptor) -> Self {
        DynamicMessage {
            desc,
            store: FieldStore::default(),
        }
    }

    pub fn descriptor(&self) -> MessageDescriptor {
        self.desc.clone()
    }

    fn resolve<'a>(&self, field: impl Into<FieldKey<'a>>) -> Result<FieldDescriptor, MessageError> {
        match field.into() {
            FieldKey::Number(number) => self
                .desc
                .get_field(number)
                .ok_or(MessageError::FieldNotFoundByNumber { number }),
            FieldKey::Name(name) => self
                .desc
                .get_field_by_name(name)
                .ok_or_else(|| MessageError::FieldNotFound {
                    name: name.to_string(),
                }),
        }
    }

    /// Returns the field's current value, or its declared default if unset:
    /// the scalar zero value for scalars and enums, or `None` for an unset
    /// message, repeated, or map field (protobuf has no "empty" default for
    /// those — they are simply absent).
    pub fn get<'a>(
        &self,
        field: impl Into<FieldKey<'a>>,
    ) -> Result<Option<Cow<'_, Value>>, MessageError> {
        let field = self.resolve(field)?;
        Ok(self.store.get(&field))
    }

    pub fn has<'a>(&self, field: impl Into<FieldKey<'a>>) -> Result<bool, MessageError> {
        let field = self.resolve(field)?;
        Ok(self.store.has(&field))
    }

    /// Sets a singular scalar, message, or oneof-member field. Also accepts a
    /// whole `Value::List`/`Value::Map` to overwrite a repeated or map field
    /// in one call; an empty list or map clears the field (protobuf has no
    /// way to distinguish a present-but-empty repeated field from an absent
    /// one).
    pub fn set<'a>(&mut self, field: impl Into<FieldKey<'a>>, value: Value) -> Result<(), MessageError> {
        let field = self.resolve(field)?;
        self.store.set(&field, value)
    }

    pub fn clear<'a>(&mut self, field: impl Into<FieldKey<'a>>) -> Result<(), MessageError> {
        let field = self.resolve(field)?;
        self.store.clear(&field);
        Ok(())
    }

    pub fn add_repeated<'a>(
        &mut self,
        field: impl Into<FieldKey<'a>>,
        value: Value,
    ) -> Result<(), MessageError> {
        let field = self.resolve(field)?;
        self.store.add_repeated(&field, value)
    }

    pub fn set_map_entry<'a>(
        &mut self,
        field: impl Into<FieldKey<'a>>,
        key: MapKey,
        value: Value,
    ) -> Result<(), MessageError> {
        let field = self.resolve(field)?;
        self.store.set_map_entry(&field, key, value)
    }

    pub fn remove_map_entry<'a>(
        &mut self,
        field: impl Into<FieldKey<'a>>,
        key: &MapKey,
    ) -> Result<bool, MessageError> {
        let field = self.resolve(field)?;
        self.store.remove_map_entry(&field, key)
    }

    /// Which member of `oneof` is currently active, if any.
    pub fn which_oneof(&self, oneof: &crate::descriptor::OneofDescriptor) -> Option<FieldDescriptor> {
        let number = self.store.which_oneof(oneof)?;
        self.desc.get_field(number)
    }

    /// All fields that are currently set, in ascending field-number order.
    pub fn fields(&self) -> impl Iterator<Item = (FieldDescriptor, Cow<'_, Value>)> + '_ {
        self.store.iter_set_fields(&self.desc)
    }

    /// Raw bytes this message couldn't interpret against its descriptor
    /// (fields absent from the schema, or present under an unexpected wire
    /// type), preserved for round-tripping.
    pub fn unknown_field_numbers(&self) -> impl Iterator<Item = u32> + '_ {
        self.store.unknown.numbers()
    }

    /// Compares two messages field-by-field (not including unknown fields,
    /// which are wire-level residue rather than part of the logical value).
    pub fn equals(&self, other: &Self) -> bool {
        if self.desc != other.desc {
            return false;
        }
        for field in self.desc.fields() {
            let (has_self, has_other) = (self.store.has(&field), other.store.has(&field));
            if has_self != has_other {
                return false;
            }
            if has_self && self.store.get(&field) != other.store.get(&field) {
                return false;
            }
        }
        true
    }
}
