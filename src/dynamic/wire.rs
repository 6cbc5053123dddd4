//! The binary wire codec: a descriptor-driven dispatch over `prost`'s
//! low-level varint, fixed-width, and length-delimited primitives. No
//! independent wire-format implementation exists here — `prost::encoding` is
//! the only place tag/varint/zigzag arithmetic is performed.

use std::fmt;

use prost::bytes::{Buf, BufMut};
use prost::encoding::{DecodeContext, WireType};

use crate::descriptor::{Kind, MessageDescriptor};

use super::fields::default_value_for_kind;
use super::unknown::UnknownField;
use super::{DynamicMessage, MapKey, Value};

/// A failure to interpret a byte sequence as a message of a given type.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// The input ended before a tag, varint, or length-delimited payload
    /// could be fully read.
    Truncated,
    /// A tag's wire-type nibble was not one of the five defined wire types.
    InvalidTag,
    /// A varint did not terminate within 10 bytes.
    InvalidVarint,
    /// A length-delimited payload's declared length does not fit `usize` or
    /// exceeds the remaining input.
    LengthOverflow,
    /// A `string` field's bytes were not valid UTF-8.
    Utf8Invalid,
    /// The payload's wire type did not match what the field's declared kind
    /// requires.
    TypeMismatch { message: String },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Truncated => write!(f, "buffer ended before the encoded value did"),
            DecodeError::InvalidTag => write!(f, "tag used an unrecognized wire type"),
            DecodeError::InvalidVarint => write!(f, "varint did not terminate within 10 bytes"),
            DecodeError::LengthOverflow => write!(f, "length-delimited payload length overflowed"),
            DecodeError::Utf8Invalid => write!(f, "string field was not valid UTF-8"),
            DecodeError::TypeMismatch { message } => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for DecodeError {}

fn classify(err: prost::DecodeError) -> DecodeError {
    let msg = err.to_string();
    if msg.contains("buffer underflow") || msg.contains("unexpected end") {
        DecodeError::Truncated
    } else if msg.contains("invalid wire type") || msg.contains("illegal wire type") {
        DecodeError::InvalidTag
    } else if msg.contains("invalid varint") {
        DecodeError::InvalidVarint
    } else if msg.contains("too long") || msg.contains("overflow") {
        DecodeError::LengthOverflow
    } else if msg.contains("invalid string") || msg.contains("utf-8") || msg.contains("UTF-8") {
        DecodeError::Utf8Invalid
    } else {
        DecodeError::TypeMismatch { message: msg }
    }
}

/// Encodes `message` using the protobuf binary wire format.
pub fn encode(message: &DynamicMessage) -> Vec<u8> {
    prost::Message::encode_to_vec(message)
}

/// Decodes a message of the given type from `buf`.
pub fn decode(desc: MessageDescriptor, buf: impl Buf) -> Result<DynamicMessage, DecodeError> {
    let mut message = DynamicMessage::new(desc);
    merge(&mut message, buf)?;
    Ok(message)
}

/// Merges the wire-format bytes in `buf` into an existing message, the way a
/// repeated `merge`/`parse_merge` call would for a generated type.
pub fn merge(message: &mut DynamicMessage, buf: impl Buf) -> Result<(), DecodeError> {
    prost::Message::merge(message, buf).map_err(classify)
}

macro_rules! numeric_kinds {
    ($mac:ident) => {
        $mac!(Double, double, F64);
        $mac!(Float, float, F32);
        $mac!(Int32, int32, I32);
        $mac!(Int64, int64, I64);
        $mac!(Uint32, uint32, U32);
        $mac!(Uint64, uint64, U64);
        $mac!(Sint32, sint32, I32);
        $mac!(Sint64, sint64, I64);
        $mac!(Fixed32, fixed32, U32);
        $mac!(Fixed64, fixed64, U64);
        $mac!(Sfixed32, sfixed32, I32);
        $mac!(Sfixed64, sfixed64, I64);
    };
}

fn encode_singular_scalar(kind: &Kind, tag: u32, value: &Value, buf: &mut impl BufMut) {
    macro_rules! arm {
        ($variant:ident, $module:ident, $value_variant:ident) => {
            if let Kind::$variant = kind {
                if let Value::$value_variant(v) = value {
                    prost::encoding::$module::encode(tag, v, buf);
                    return;
                }
            }
        };
    }
    numeric_kinds!(arm);
    match kind {
        Kind::Bool => {
            if let Value::Bool(v) = value {
                prost::encoding::bool::encode(tag, v, buf);
            }
        }
        Kind::String => {
            if let Value::String(v) = value {
                prost::encoding::string::encode(tag, v, buf);
            }
        }
        Kind::Bytes => {
            if let Value::Bytes(v) = value {
                prost::encoding::bytes::encode(tag, v, buf);
            }
        }
        Kind::Enum(_) => {
            if let Value::EnumNumber(v) = value {
                prost::encoding::int32::encode(tag, v, buf);
            }
        }
        Kind::Message(_) => {
            if let Value::Message(v) = value {
                prost::encoding::message::encode(tag, v, buf);
            }
        }
        _ => {}
    }
}

fn encoded_len_singular_scalar(kind: &Kind, tag: u32, value: &Value) -> usize {
    macro_rules! arm {
        ($variant:ident, $module:ident, $value_variant:ident) => {
            if let Kind::$variant = kind {
                if let Value::$value_variant(v) = value {
                    return prost::encoding::$module::encoded_len(tag, v);
                }
            }
        };
    }
    numeric_kinds!(arm);
    match kind {
        Kind::Bool => match value {
            Value::Bool(v) => prost::encoding::bool::encoded_len(tag, v),
            _ => 0,
        },
        Kind::String => match value {
            Value::String(v) => prost::encoding::string::encoded_len(tag, v),
            _ => 0,
        },
        Kind::Bytes => match value {
            Value::Bytes(v) => prost::encoding::bytes::encoded_len(tag, v),
            _ => 0,
        },
        Kind::Enum(_) => match value {
            Value::EnumNumber(v) => prost::encoding::int32::encoded_len(tag, v),
            _ => 0,
        },
        Kind::Message(_) => match value {
            Value::Message(v) => prost::encoding::message::encoded_len(tag, v),
            _ => 0,
        },
        _ => 0,
    }
}

fn encode_repeated_scalar(kind: &Kind, tag: u32, values: &[Value], buf: &mut impl BufMut) {
    macro_rules! arm {
        ($variant:ident, $module:ident, $value_variant:ident) => {
            if let Kind::$variant = kind {
                let typed: Vec<_> = values
                    .iter()
                    .filter_map(|v| match v {
                        Value::$value_variant(x) => Some(*x),
                        _ => None,
                    })
                    .collect();
                prost::encoding::$module::encode_packed(tag, &typed, buf);
                return;
            }
        };
    }
    numeric_kinds!(arm);
    match kind {
        Kind::Bool => {
            let typed: Vec<_> = values.iter().filter_map(|v| v.as_bool()).collect();
            prost::encoding::bool::encode_packed(tag, &typed, buf);
        }
        Kind::String => {
            for v in values {
                if let Value::String(s) = v {
                    prost::encoding::string::encode(tag, s, buf);
                }
            }
        }
        Kind::Bytes => {
            for v in values {
                if let Value::Bytes(b) = v {
                    prost::encoding::bytes::encode(tag, b, buf);
                }
            }
        }
        Kind::Enum(_) => {
            let typed: Vec<_> = values.iter().filter_map(|v| v.as_enum_number()).collect();
            prost::encoding::int32::encode_packed(tag, &typed, buf);
        }
        Kind::Message(_) => {
            for v in values {
                if let Value::Message(m) = v {
                    prost::encoding::message::encode(tag, m, buf);
                }
            }
        }
        _ => {}
    }
}

fn encoded_len_repeated_scalar(kind: &Kind, tag: u32, values: &[Value]) -> usize {
    macro_rules! arm {
        ($variant:ident, $module:ident, $value_variant:ident) => {
            if let Kind::$variant = kind {
                let typed: Vec<_> = values
                    .iter()
                    .filter_map(|v| match v {
                        Value::$value_variant(x) => Some(*x),
                        _ => None,
                    })
                    .collect();
                return prost::encoding::$module::encoded_len_packed(tag, &typed);
            }
        };
    }
    numeric_kinds!(arm);
    match kind {
        Kind::Bool => {
            let typed: Vec<_> = values.iter().filter_map(|v| v.as_bool()).collect();
            prost::encoding::bool::encoded_len_packed(tag, &typed)
        }
        Kind::String => values
            .iter()
            .filter_map(|v| v.as_str())
            .map(|s| prost::encoding::string::encoded_len(tag, &s.to_string()))
            .sum(),
        Kind::Bytes => values
            .iter()
            .filter_map(|v| v.as_bytes())
            .map(|b| prost::encoding::bytes::encoded_len(tag, &b.to_vec()))
            .sum(),
        Kind::Enum(_) => {
            let typed: Vec<_> = values.iter().filter_map(|v| v.as_enum_number()).collect();
            prost::encoding::int32::encoded_len_packed(tag, &typed)
        }
        Kind::Message(_) => values
            .iter()
            .filter_map(|v| v.as_message())
            .map(|m| prost::encoding::message::encoded_len(tag, m))
            .sum(),
        _ => 0,
    }
}

fn encode_map_entry(
    entry_desc: &MessageDescriptor,
    tag: u32,
    key: &MapKey,
    value: &Value,
    buf: &mut impl BufMut,
) {
    let mut entry = DynamicMessage::new(entry_desc.clone());
    let key_field = entry_desc.map_entry_key_field().expect("map entry key field");
    let value_field = entry_desc
        .map_entry_value_field()
        .expect("map entry value field");
    let _ = entry.set(key_field.number(), map_key_to_value(key));
    let _ = entry.set(value_field.number(), value.clone());
    prost::encoding::message::encode(tag, &entry, buf);
}

fn map_key_to_value(key: &MapKey) -> Value {
    match key {
        MapKey::Bool(v) => Value::Bool(*v),
        MapKey::I32(v) => Value::I32(*v),
        MapKey::I64(v) => Value::I64(*v),
        MapKey::U32(v) => Value::U32(*v),
        MapKey::U64(v) => Value::U64(*v),
        MapKey::String(v) => Value::String(v.clone()),
    }
}

fn value_to_map_key(value: &Value) -> Option<MapKey> {
    match value {
        Value::Bool(v) => Some(MapKey::Bool(*v)),
        Value::I32(v) => Some(MapKey::I32(*v)),
        Value::I64(v) => Some(MapKey::I64(*v)),
        Value::U32(v) => Some(MapKey::U32(*v)),
        Value::U64(v) => Some(MapKey::U64(*v)),
        Value::String(v) => Some(MapKey::String(v.clone())),
        _ => None,
    }
}

impl prost::Message for DynamicMessage {
    fn encode_raw(&self, buf: &mut impl BufMut)
    where
        Self: Sized,
    {
        let mut numbers: std::collections::BTreeSet<u32> = std::collections::BTreeSet::new();
        for (field, _) in self.fields() {
            numbers.insert(field.number());
        }
        numbers.extend(self.store.unknown.numbers());

        for number in numbers {
            if let Some(field) = self.desc.get_field(number) {
                if self.store.has(&field) {
                    let kind = field.kind();
                    if field.is_map() {
                        if let Some(Value::Map(map)) = self.store.get(&field).map(|c| c.into_owned()) {
                            let entry_desc = kind.as_message().unwrap();
                            for (k, v) in &map {
                                encode_map_entry(entry_desc, number, k, v, buf);
                            }
                        }
                    } else if field.is_list() {
                        if let Some(Value::List(list)) = self.store.get(&field).map(|c| c.into_owned()) {
                            encode_repeated_scalar(&kind, number, &list, buf);
                        }
                    } else if let Some(value) = self.store.get(&field) {
                        encode_singular_scalar(&kind, number, &value, buf);
                    }
                }
            }
            self.store.unknown.encode_number(number, buf);
        }
    }

    fn merge_field(
        &mut self,
        tag: u32,
        wire_type: WireType,
        buf: &mut impl Buf,
        ctx: DecodeContext,
    ) -> Result<(), prost::DecodeError>
    where
        Self: Sized,
    {
        let Some(field) = self.desc.get_field(tag) else {
            return self.store.unknown.merge_field(tag, wire_type, buf);
        };
        let kind = field.kind();

        if field.is_map() {
            let entry_desc = kind.as_message().unwrap().clone();
            let mut entry = DynamicMessage::new(entry_desc.clone());
            prost::encoding::message::merge(wire_type, &mut entry, buf, ctx)?;
            let key_field = entry_desc.map_entry_key_field().unwrap();
            let value_field = entry_desc.map_entry_value_field().unwrap();
            let key_value = entry
                .get(key_field.number())
                .ok()
                .flatten()
                .map(|c| c.into_owned())
                .unwrap_or_else(|| default_value_for_kind(&key_field.kind()));
            let value_value = entry
                .get(value_field.number())
                .ok()
                .flatten()
                .map(|c| c.into_owned())
                .unwrap_or_else(|| default_value_for_kind(&value_field.kind()));
            let key = value_to_map_key(&key_value)
                .ok_or_else(|| prost::DecodeError::new("invalid map key type"))?;
            self.store
                .set_map_entry(&field, key, value_value)
                .map_err(|_| prost::DecodeError::new("map value type mismatch"))?;
            return Ok(());
        }

        if field.is_list() {
            return self.merge_repeated_field(&field, &kind, wire_type, buf, ctx);
        }

        match &kind {
            Kind::Message(inner_desc) => {
                let mut inner = match self.store.get(&field) {
                    Some(v) => match v.into_owned() {
                        Value::Message(m) => m,
                        _ => DynamicMessage::new(inner_desc.clone()),
                    },
                    None => DynamicMessage::new(inner_desc.clone()),
                };
                prost::encoding::message::merge(wire_type, &mut inner, buf, ctx)?;
                self.store
                    .set(&field, Value::Message(inner))
                    .map_err(|_| prost::DecodeError::new("message field type mismatch"))?;
            }
            _ => {
                self.merge_singular_scalar(&field, &kind, wire_type, buf, ctx)?;
            }
        }
        Ok(())
    }

    fn encoded_len(&self) -> usize {
        let mut len = 0;
        for (field, value) in self.fields() {
            let number = field.number();
            let kind = field.kind();
            if field.is_map() {
                if let Value::Map(map) = value.as_ref() {
                    for (k, v) in map {
                        let entry_desc = kind.as_message().unwrap();
                        let mut entry = DynamicMessage::new(entry_desc.clone());
                        let key_field = entry_desc.map_entry_key_field().unwrap();
                        let value_field = entry_desc.map_entry_value_field().unwrap();
                        let _ = entry.set(key_field.number(), map_key_to_value(k));
                        let _ = entry.set(value_field.number(), v.clone());
                        len += prost::encoding::message::encoded_len(number, &entry);
                    }
                }
            } else if field.is_list() {
                if let Value::List(list) = value.as_ref() {
                    len += encoded_len_repeated_scalar(&kind, number, list);
                }
            } else {
                len += encoded_len_singular_scalar(&kind, number, &value);
            }
        }
        len + self.store.unknown.encoded_len()
    }

    fn clear(&mut self) {
        self.store = super::fields::FieldStore::default();
    }
}

impl DynamicMessage {
    fn current_list(&self, field: &crate::descriptor::FieldDescriptor) -> Vec<Value> {
        match self.store.get(field).map(|c| c.into_owned()) {
            Some(Value::List(items)) => items,
            _ => Vec::new(),
        }
    }

    fn merge_repeated_field(
        &mut self,
        field: &crate::descriptor::FieldDescriptor,
        kind: &Kind,
        wire_type: WireType,
        buf: &mut impl Buf,
        ctx: DecodeContext,
    ) -> Result<(), prost::DecodeError> {
        macro_rules! arm {
            ($variant:ident, $module:ident, $value_variant:ident) => {
                if let Kind::$variant = kind {
                    let mut typed: Vec<_> = match self.store.get(field) {
                        Some(v) => match v.into_owned() {
                            Value::List(items) => items
                                .into_iter()
                                .filter_map(|i| match i {
                                    Value::$value_variant(x) => Some(x),
                                    _ => None,
                                })
                                .collect(),
                            _ => Vec::new(),
                        },
                        None => Vec::new(),
                    };
                    prost::encoding::$module::merge_repeated(wire_type, &mut typed, buf, ctx)?;
                    let values = typed.into_iter().map(Value::$value_variant).collect();
                    self.store
                        .set(field, Value::List(values))
                        .map_err(|_| prost::DecodeError::new("repeated field type mismatch"))?;
                    return Ok(());
                }
            };
        }
        numeric_kinds!(arm);

        match kind {
            Kind::Bool => {
                let mut typed: Vec<bool> = self
                    .current_list(field)
                    .into_iter()
                    .filter_map(|v| v.as_bool())
                    .collect();
                prost::encoding::bool::merge_repeated(wire_type, &mut typed, buf, ctx)?;
                let values = typed.into_iter().map(Value::Bool).collect();
                self.store
                    .set(field, Value::List(values))
                    .map_err(|_| prost::DecodeError::new("repeated field type mismatch"))?;
            }
            Kind::String => {
                let mut s = String::new();
                prost::encoding::string::merge(wire_type, &mut s, buf, ctx)?;
                self.store
                    .add_repeated(field, Value::String(s))
                    .map_err(|_| prost::DecodeError::new("repeated field type mismatch"))?;
            }
            Kind::Bytes => {
                let mut b = Vec::new();
                prost::encoding::bytes::merge(wire_type, &mut b, buf, ctx)?;
                self.store
                    .add_repeated(field, Value::Bytes(b))
                    .map_err(|_| prost::DecodeError::new("repeated field type mismatch"))?;
            }
            Kind::Enum(_) => {
                let mut typed: Vec<i32> = self
                    .current_list(field)
                    .into_iter()
                    .filter_map(|v| v.as_enum_number())
                    .collect();
                prost::encoding::int32::merge_repeated(wire_type, &mut typed, buf, ctx)?;
                let values = typed.into_iter().map(Value::EnumNumber).collect();
                self.store
                    .set(field, Value::List(values))
                    .map_err(|_| prost::DecodeError::new("repeated field type mismatch"))?;
            }
            Kind::Message(inner_desc) => {
                let mut inner = DynamicMessage::new(inner_desc.clone());
                prost::encoding::message::merge(wire_type, &mut inner, buf, ctx)?;
                self.store
                    .add_repeated(field, Value::Message(inner))
                    .map_err(|_| prost::DecodeError::new("repeated field type mismatch"))?;
            }
            _ => unreachable!("numeric kinds handled above"),
        }
        Ok(())
    }

    fn merge_singular_scalar(
        &mut self,
        field: &crate::descriptor::FieldDescriptor,
        kind: &Kind,
        wire_type: WireType,
        buf: &mut impl Buf,
        ctx: DecodeContext,
    ) -> Result<(), prost::DecodeError> {
        macro_rules! arm {
            ($variant:ident, $module:ident, $value_variant:ident) => {
                if let Kind::$variant = kind {
                    let mut v = Default::default();
                    prost::encoding::$module::merge(wire_type, &mut v, buf, ctx)?;
                    self.store
                        .set(field, Value::$value_variant(v))
                        .map_err(|_| prost::DecodeError::new("field type mismatch"))?;
                    return Ok(());
                }
            };
        }
        numeric_kinds!(arm);

        match kind {
            Kind::Bool => {
                let mut v = false;
                prost::encoding::bool::merge(wire_type, &mut v, buf, ctx)?;
                self.store
                    .set(field, Value::Bool(v))
                    .map_err(|_| prost::DecodeError::new("field type mismatch"))?;
            }
            Kind::String => {
                let mut v = String::new();
                prost::encoding::string::merge(wire_type, &mut v, buf, ctx)?;
                self.store
                    .set(field, Value::String(v))
                    .map_err(|_| prost::DecodeError::new("field type mismatch"))?;
            }
            Kind::Bytes => {
                let mut v = Vec::new();
                prost::encoding::bytes::merge(wire_type, &mut v, buf, ctx)?;
                self.store
                    .set(field, Value::Bytes(v))
                    .map_err(|_| prost::DecodeError::new("field type mismatch"))?;
            }
            Kind::Enum(_) => {
                let mut v: i32 = 0;
                prost::encoding::int32::merge(wire_type, &mut v, buf, ctx)?;
                self.store
                    .set(field, Value::EnumNumber(v))
                    .map_err(|_| prost::DecodeError::new("field type mismatch"))?;
            }
            Kind::Message(_) => unreachable!("message kind handled by caller"),
            _ => unreachable!("numeric kinds handled above"),
        }
        Ok(())
    }
}

