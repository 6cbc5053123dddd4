use std::collections::HashSet;
use std::sync::Arc;

use super::pool::DescriptorPool;
use super::{Cardinality, FieldData, Kind, MessageData, OneofData, TypeRef};

/// A message type registered in a [`DescriptorPool`].
///
/// Two handles compare equal iff they point at the same underlying message
/// data, which for messages obtained from the same pool means the same
/// fully-qualified name; handles from different pools are never equal even
/// if the name matches.
#[derive(Clone)]
pub struct MessageDescriptor {
    pub(crate) pool: DescriptorPool,
    pub(crate) data: Arc<MessageData>,
}

impl PartialEq for MessageDescriptor {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}
impl Eq for MessageDescriptor {}

impl std::fmt::Debug for MessageDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageDescriptor")
            .field("full_name", &self.data.full_name)
            .finish()
    }
}

impl MessageDescriptor {
    pub fn pool(&self) -> &DescriptorPool {
        &self.pool
    }

    pub fn name(&self) -> &str {
        &self.data.name
    }

    pub fn full_name(&self) -> &str {
        &self.data.full_name
    }

    pub fn is_map_entry(&self) -> bool {
        self.data.is_map_entry
    }

    pub fn fields(&self) -> impl Iterator<Item = FieldDescriptor> + '_ {
        (0..self.data.fields.len()).map(move |index| FieldDescriptor {
            message: self.clone(),
            index,
        })
    }

    pub fn get_field(&self, number: u32) -> Option<FieldDescriptor> {
        self.data
            .field_by_number
            .get(&number)
            .map(|&index| FieldDescriptor {
                message: self.clone(),
                index,
            })
    }

    pub fn get_field_by_name(&self, name: &str) -> Option<FieldDescriptor> {
        self.data
            .field_by_name
            .get(name)
            .map(|&index| FieldDescriptor {
                message: self.clone(),
                index,
            })
    }

    pub fn get_field_by_json_name(&self, name: &str) -> Option<FieldDescriptor> {
        self.data
            .field_by_json_name
            .get(name)
            .map(|&index| FieldDescriptor {
                message: self.clone(),
                index,
            })
    }

    pub fn map_entry_key_field(&self) -> Option<FieldDescriptor> {
        if !self.data.is_map_entry {
            return None;
        }
        self.get_field(super::MAP_ENTRY_KEY_NUMBER)
    }

    pub fn map_entry_value_field(&self) -> Option<FieldDescriptor> {
        if !self.data.is_map_entry {
            return None;
        }
        self.get_field(super::MAP_ENTRY_VALUE_NUMBER)
    }

    pub fn oneofs(&self) -> impl Iterator<Item = OneofDescriptor> + '_ {
        (0..self.data.oneofs.len()).map(move |index| OneofDescriptor {
            message: self.clone(),
            index,
        })
    }

    pub fn nested_messages(&self) -> impl Iterator<Item = MessageDescriptor> + '_ {
        self.data.nested_messages.iter().map(move |data| MessageDescriptor {
            pool: self.pool.clone(),
            data: data.clone(),
        })
    }

    pub fn nested_enums(&self) -> impl Iterator<Item = super::EnumDescriptor> + '_ {
        self.data.nested_enums.iter().map(move |data| super::EnumDescriptor {
            pool: self.pool.clone(),
            data: data.clone(),
        })
    }

    pub fn parent_file(&self) -> super::FileDescriptor {
        self.pool
            .get_file_by_name(&self.data.file)
            .expect("message descriptor's owning file is always registered")
    }

    /// The set of message types directly or transitively reachable from this
    /// message's fields (field types and map value types), not including
    /// `self`.
    pub fn dependencies(&self) -> Vec<MessageDescriptor> {
        let mut visited = HashSet::new();
        let mut out = Vec::new();
        self.collect_dependencies(&mut visited, &mut out);
        out
    }

    fn collect_dependencies(&self, visited: &mut HashSet<String>, out: &mut Vec<MessageDescriptor>) {
        for field in self.fields() {
            if let Kind::Message(dep) = field.kind() {
                if visited.insert(dep.full_name().to_string()) {
                    out.push(dep.clone());
                    dep.collect_dependencies(visited, out);
                }
            }
        }
    }
}

/// A field of a [`MessageDescriptor`].
#[derive(Clone)]
pub struct FieldDescriptor {
    pub(crate) message: MessageDescriptor,
    pub(crate) index: usize,
}

impl PartialEq for FieldDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.message == other.message && self.index == other.index
    }
}
impl Eq for FieldDescriptor {}

impl std::fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("message", &self.message.full_name())
            .field("name", &self.data().name)
            .finish()
    }
}

impl FieldDescriptor {
    fn data(&self) -> &FieldData {
        &self.message.data.fields[self.index]
    }

    pub fn containing_message(&self) -> &MessageDescriptor {
        &self.message
    }

    pub fn name(&self) -> &str {
        &self.data().name
    }

    pub fn json_name(&self) -> &str {
        &self.data().json_name
    }

    pub fn number(&self) -> u32 {
        self.data().number
    }

    pub fn full_name(&self) -> String {
        format!("{}.{}", self.message.full_name(), self.data().name)
    }

    pub fn cardinality(&self) -> Cardinality {
        self.data().cardinality
    }

    pub fn is_list(&self) -> bool {
        matches!(self.data().cardinality, Cardinality::Repeated) && !self.is_map()
    }

    pub fn is_map(&self) -> bool {
        matches!(self.data().cardinality, Cardinality::Repeated)
            && matches!(&self.data().ty, TypeRef::Message(_))
            && self.kind().as_message().is_some_and(|m| m.is_map_entry())
    }

    pub fn is_group(&self) -> bool {
        matches!(self.data().ty, TypeRef::Group(_))
    }

    pub fn supports_presence(&self) -> bool {
        self.data().has_explicit_presence
    }

    pub fn containing_oneof(&self) -> Option<OneofDescriptor> {
        self.data().oneof_index.map(|index| OneofDescriptor {
            message: self.message.clone(),
            index,
        })
    }

    /// Resolves this field's declared type against the owning pool.
    ///
    /// By the time a [`FieldDescriptor`] is reachable at all, the pool has
    /// already verified (at registration time) that `Message`/`Enum`/`Group`
    /// references resolve, so this never fails.
    pub fn kind(&self) -> Kind {
        match &self.data().ty {
            TypeRef::Double => Kind::Double,
            TypeRef::Float => Kind::Float,
            TypeRef::Int32 => Kind::Int32,
            TypeRef::Int64 => Kind::Int64,
            TypeRef::Uint32 => Kind::Uint32,
            TypeRef::Uint64 => Kind::Uint64,
            TypeRef::Sint32 => Kind::Sint32,
            TypeRef::Sint64 => Kind::Sint64,
            TypeRef::Fixed32 => Kind::Fixed32,
            TypeRef::Fixed64 => Kind::Fixed64,
            TypeRef::Sfixed32 => Kind::Sfixed32,
            TypeRef::Sfixed64 => Kind::Sfixed64,
            TypeRef::Bool => Kind::Bool,
            TypeRef::String => Kind::String,
            TypeRef::Bytes => Kind::Bytes,
            TypeRef::Message(name) | TypeRef::Group(name) => {
                Kind::Message(self.message.pool.resolve_message(name))
            }
            TypeRef::Enum(name) => Kind::Enum(self.message.pool.resolve_enum(name)),
        }
    }
}

/// A oneof declared on a [`MessageDescriptor`].
#[derive(Clone)]
pub struct OneofDescriptor {
    pub(crate) message: MessageDescriptor,
    pub(crate) index: usize,
}

impl PartialEq for OneofDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.message == other.message && self.index == other.index
    }
}
impl Eq for OneofDescriptor {}

impl OneofDescriptor {
    fn data(&self) -> &OneofData {
        &self.message.data.oneofs[self.index]
    }

    pub(crate) fn index(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.data().name
    }

    pub fn containing_message(&self) -> &MessageDescriptor {
        &self.message
    }

    pub fn fields(&self) -> impl Iterator<Item = FieldDescriptor> + '_ {
        self.data()
            .fields
            .iter()
            .filter_map(move |&number| self.message.get_field(number))
    }
}
