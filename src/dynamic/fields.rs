use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};

use crate::descriptor::{FieldDescriptor, Kind};

use super::unknown::UnknownFieldSet;
use super::{MapKey, MessageError, Value};

/// The storage behind a [`DynamicMessage`][crate::DynamicMessage], split by
/// field shape so that "is this field set" never depends on comparing a
/// value to its zero value: presence is simply key membership.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct FieldStore {
    singular: BTreeMap<u32, Value>,
    repeated: BTreeMap<u32, Vec<Value>>,
    maps: BTreeMap<u32, HashMap<MapKey, Value>>,
    oneofs: HashMap<usize, u32>,
    pub unknown: UnknownFieldSet,
}

pub(crate) fn default_value_for_kind(kind: &Kind) -> Value {
    match kind {
        Kind::Double => Value::F64(0.0),
        Kind::Float => Value::F32(0.0),
        Kind::Int32 | Kind::Sint32 | Kind::Sfixed32 => Value::I32(0),
        Kind::Int64 | Kind::Sint64 | Kind::Sfixed64 => Value::I64(0),
        Kind::Uint32 | Kind::Fixed32 => Value::U32(0),
        Kind::Uint64 | Kind::Fixed64 => Value::U64(0),
        Kind::Bool => Value::Bool(false),
        Kind::String => Value::String(String::new()),
        Kind::Bytes => Value::Bytes(Vec::new()),
        Kind::Enum(e) => Value::EnumNumber(e.default_value().number()),
        Kind::Message(_) => panic!("message fields have no scalar default value"),
    }
}

fn coerce_scalar(value: Value, kind: &Kind) -> Result<Value, Value> {
    match kind {
        Kind::Double => match value {
            Value::F64(_) => Ok(value),
            _ => Err(value),
        },
        Kind::Float => match value {
            Value::F32(_) => Ok(value),
            _ => Err(value),
        },
        Kind::Bool => match value {
            Value::Bool(_) => Ok(value),
            _ => Err(value),
        },
        Kind::String => match value {
            Value::String(_) => Ok(value),
            _ => Err(value),
        },
        Kind::Bytes => match value {
            Value::Bytes(_) => Ok(value),
            _ => Err(value),
        },
        Kind::Int32 | Kind::Sint32 | Kind::Sfixed32 => match value {
            Value::I32(_) => Ok(value),
            Value::I64(v) => i32::try_from(v).map(Value::I32).map_err(|_| Value::I64(v)),
            _ => Err(value),
        },
        Kind::Int64 | Kind::Sint64 | Kind::Sfixed64 => match value {
            Value::I64(_) => Ok(value),
            Value::I32(v) => Ok(Value::I64(v as i64)),
            _ => Err(value),
        },
        Kind::Uint32 | Kind::Fixed32 => match value {
            Value::U32(_) => Ok(value),
            Value::U64(v) => u32::try_from(v).map(Value::U32).map_err(|_| Value::U64(v)),
            _ => Err(value),
        },
        Kind::Uint64 | Kind::Fixed64 => match value {
            Value::U64(_) => Ok(value),
            Value::U32(v) => Ok(Value::U64(v as u64)),
            _ => Err(value),
        },
        Kind::Enum(e) => match value {
            Value::EnumNumber(_) => Ok(value),
            Value::String(ref name) => match e.get_value_by_name(name) {
                Some(v) => Ok(Value::EnumNumber(v.number())),
                None => Err(value),
            },
            _ => Err(value),
        },
        Kind::Message(m) => match value {
            Value::Message(ref dm) if dm.descriptor() == *m => Ok(value),
            _ => Err(value),
        },
    }
}

fn coerce_map_key(key: MapKey, kind: &Kind) -> Result<MapKey, MapKey> {
    match kind {
        Kind::Bool => match key {
            MapKey::Bool(_) => Ok(key),
            _ => Err(key),
        },
        Kind::String => match key {
            MapKey::String(_) => Ok(key),
            _ => Err(key),
        },
        Kind::Int32 | Kind::Sint32 | Kind::Sfixed32 => match key {
            MapKey::I32(_) => Ok(key),
            MapKey::I64(v) => i32::try_from(v).map(MapKey::I32).map_err(|_| MapKey::I64(v)),
            _ => Err(key),
        },
        Kind::Int64 | Kind::Sint64 | Kind::Sfixed64 => match key {
            MapKey::I64(_) => Ok(key),
            MapKey::I32(v) => Ok(MapKey::I64(v as i64)),
            _ => Err(key),
        },
        Kind::Uint32 | Kind::Fixed32 => match key {
            MapKey::U32(_) => Ok(key),
            MapKey::U64(v) => u32::try_from(v).map(MapKey::U32).map_err(|_| MapKey::U64(v)),
            _ => Err(key),
        },
        Kind::Uint64 | Kind::Fixed64 => match key {
            MapKey::U64(_) => Ok(key),
            MapKey::U32(v) => Ok(MapKey::U64(v as u64)),
            _ => Err(key),
        },
        _ => Err(key),
    }
}

impl FieldStore {
    pub fn has(&self, field: &FieldDescriptor) -> bool {
        if field.is_map() {
            self.maps.contains_key(&field.number())
        } else if field.is_list() {
            self.repeated.contains_key(&field.number())
        } else {
            self.singular.contains_key(&field.number())
        }
    }

    pub fn get(&self, field: &FieldDescriptor) -> Option<Cow<'_, Value>> {
        if field.is_map() {
            self.maps
                .get(&field.number())
                .map(|m| Cow::Owned(Value::Map(m.clone())))
        } else if field.is_list() {
            self.repeated
                .get(&field.number())
                .map(|l| Cow::Owned(Value::List(l.clone())))
        } else if field.kind().is_message() {
            self.singular.get(&field.number()).map(Cow::Borrowed)
        } else {
            match self.singular.get(&field.number()) {
                Some(v) => Some(Cow::Borrowed(v)),
                None => {
                    if let Some(oneof) = field.containing_oneof() {
                        if self.oneofs.get(&oneof_key(&oneof)) != Some(&field.number()) {
                            return None;
                        }
                    }
                    Some(Cow::Owned(default_value_for_kind(&field.kind())))
                }
            }
        }
    }

    pub fn set(&mut self, field: &FieldDescriptor, value: Value) -> Result<(), MessageError> {
        if field.is_map() {
            return match value {
                Value::Map(map) => {
                    if map.is_empty() {
                        self.maps.remove(&field.number());
                    } else {
                        self.maps.insert(field.number(), map);
                    }
                    Ok(())
                }
                other => Err(MessageError::TypeMismatch {
                    field: field.clone(),
                    value: other,
                }),
            };
        }
        if field.is_list() {
            return match value {
                Value::List(list) => {
                    if list.is_empty() {
                        self.repeated.remove(&field.number());
                    } else {
                        self.repeated.insert(field.number(), list);
                    }
                    Ok(())
                }
                other => Err(MessageError::TypeMismatch {
                    field: field.clone(),
                    value: other,
                }),
            };
        }

        let value = coerce_scalar(value, &field.kind())
            .map_err(|value| MessageError::TypeMismatch {
                field: field.clone(),
                value,
            })?;

        if let Some(oneof) = field.containing_oneof() {
            for sibling in oneof.fields() {
                if sibling.number() != field.number() {
                    self.singular.remove(&sibling.number());
                }
            }
            self.oneofs.insert(oneof_key(&oneof), field.number());
        }
        self.singular.insert(field.number(), value);
        Ok(())
    }

    pub fn add_repeated(&mut self, field: &FieldDescriptor, value: Value) -> Result<(), MessageError> {
        if !field.is_list() {
            return Err(MessageError::NotRepeated {
                field: field.clone(),
            });
        }
        let value = coerce_scalar(value, &field.kind())
            .map_err(|value| MessageError::TypeMismatch {
                field: field.clone(),
                value,
            })?;
        self.repeated.entry(field.number()).or_default().push(value);
        Ok(())
    }

    pub fn set_map_entry(
        &mut self,
        field: &FieldDescriptor,
        key: MapKey,
        value: Value,
    ) -> Result<(), MessageError> {
        if !field.is_map() {
            return Err(MessageError::NotMap {
                field: field.clone(),
            });
        }
        let entry_ty = field.kind();
        let entry = entry_ty.as_message().expect("map field is a message kind");
        let key_field = entry.map_entry_key_field().expect("map entry has a key field");
        let value_field = entry
            .map_entry_value_field()
            .expect("map entry has a value field");

        let key = coerce_map_key(key, &key_field.kind()).map_err(|key| MessageError::MapKeyTypeInvalid {
            field: field.clone(),
            key,
        })?;
        let value = coerce_scalar(value, &value_field.kind())
            .map_err(|value| MessageError::TypeMismatch {
                field: field.clone(),
                value,
            })?;

        self.maps.entry(field.number()).or_default().insert(key, value);
        Ok(())
    }

    pub fn remove_map_entry(
        &mut self,
        field: &FieldDescriptor,
        key: &MapKey,
    ) -> Result<bool, MessageError> {
        if !field.is_map() {
            return Err(MessageError::NotMap {
                field: field.clone(),
            });
        }
        let Some(map) = self.maps.get_mut(&field.number()) else {
            return Ok(false);
        };
        let removed = map.remove(key).is_some();
        if map.is_empty() {
            self.maps.remove(&field.number());
        }
        Ok(removed)
    }

    pub fn clear(&mut self, field: &FieldDescriptor) {
        if field.is_map() {
            self.maps.remove(&field.number());
        } else if field.is_list() {
            self.repeated.remove(&field.number());
        } else {
            self.singular.remove(&field.number());
            if let Some(oneof) = field.containing_oneof() {
                if self.oneofs.get(&oneof_key(&oneof)) == Some(&field.number()) {
                    self.oneofs.remove(&oneof_key(&oneof));
                }
            }
        }
    }

    pub fn which_oneof(&self, oneof: &crate::descriptor::OneofDescriptor) -> Option<u32> {
        self.oneofs.get(&oneof_key(oneof)).copied()
    }

    pub fn iter_set_fields<'a>(
        &'a self,
        desc: &'a crate::descriptor::MessageDescriptor,
    ) -> impl Iterator<Item = (FieldDescriptor, Cow<'a, Value>)> + 'a {
        desc.fields().filter_map(move |field| {
            if self.has(&field) {
                let value = self.get(&field).expect("field reported has() == true");
                Some((field, value))
            } else {
                None
            }
        })
    }
}

fn oneof_key(oneof: &crate::descriptor::OneofDescriptor) -> usize {
    oneof.index()
}
