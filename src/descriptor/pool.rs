use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use once_cell::sync::Lazy;
use prost_types::{FileDescriptorProto, FileDescriptorSet};

use super::build::{self, BuiltFile};
use super::enum_ty::EnumDescriptor;
use super::error::RegistryError;
use super::file::FileDescriptor;
use super::message::MessageDescriptor;
use super::service::ServiceDescriptor;
use super::{EnumData, FileData, MessageData, ServiceData};
use crate::dynamic::DynamicMessage;

#[derive(Clone)]
pub(crate) enum Symbol {
    Message(Arc<MessageData>),
    Enum(Arc<EnumData>),
    Service(Arc<ServiceData>),
}

pub(crate) struct PoolInner {
    pub files: Vec<Arc<FileData>>,
    pub file_names: HashMap<String, usize>,
    pub file_protos: HashMap<String, FileDescriptorProto>,
    pub symbols: HashMap<String, Symbol>,
}

/// A registry of descriptors, shared by reference.
///
/// Cloning a `DescriptorPool` is cheap: all clones refer to the same
/// underlying registry, so a file registered through one handle is
/// immediately visible through every other handle. Reads (symbol and field
/// lookups performed while building or inspecting descriptors) take a shared
/// lock; registering a new file takes an exclusive lock for the span of
/// validating and inserting it, so that lookups never observe a partially
/// registered file.
#[derive(Clone)]
pub struct DescriptorPool {
    pub(crate) inner: Arc<RwLock<PoolInner>>,
}

static GLOBAL_POOL: Lazy<DescriptorPool> = Lazy::new(|| {
    let pool = DescriptorPool::new();
    crate::wkt::register_well_known_types(&pool).expect("well-known types are always valid");
    pool
});

impl Default for DescriptorPool {
    fn default() -> Self {
        Self::new()
    }
}

impl DescriptorPool {
    /// An empty pool, with no well-known types preloaded.
    pub fn new() -> Self {
        DescriptorPool {
            inner: Arc::new(RwLock::new(PoolInner {
                files: Vec::new(),
                file_names: HashMap::new(),
                file_protos: HashMap::new(),
                symbols: HashMap::new(),
            })),
        }
    }

    /// The process-wide default pool, preloaded with the well-known types
    /// (`google.protobuf.Timestamp`, `Duration`, `Any`, the wrapper types,
    /// `Struct`, `Value`, `ListValue`, `Empty`).
    pub fn global() -> DescriptorPool {
        GLOBAL_POOL.clone()
    }

    /// Registers a single file, along with every message, enum and service
    /// it declares. Its dependencies must already be registered.
    pub fn add_file(&self, proto: FileDescriptorProto) -> Result<FileDescriptor, RegistryError> {
        let results = self.add_file_set(FileDescriptorSet {
            file: vec![proto],
        })?;
        Ok(results.into_iter().next().expect("exactly one file added"))
    }

    /// Registers a batch of files as a single atomic transaction: either every
    /// file in the set is validated, resolved and installed, or the pool is
    /// left completely unchanged.
    pub fn add_file_set(
        &self,
        set: FileDescriptorSet,
    ) -> Result<Vec<FileDescriptor>, RegistryError> {
        let mut inner = self.inner.write().expect("descriptor pool lock poisoned");

        // Phase 1: structural build + validation, no mutation yet.
        let mut built: Vec<BuiltFile> = Vec::with_capacity(set.file.len());
        let mut pending_symbols: HashMap<String, ()> = HashMap::new();
        let mut already_present_names = Vec::new();

        for proto in &set.file {
            let name = proto.name.clone().unwrap_or_default();
            if let Some(&idx) = inner.file_names.get(&name) {
                let existing = &inner.files[idx];
                if inner.file_protos.get(&name) == Some(proto) {
                    already_present_names.push(name);
                    continue;
                }
                let _ = existing;
                return Err(RegistryError::DuplicateFile { name });
            }
            for dep in &proto.dependency {
                if !inner.file_names.contains_key(dep)
                    && !set.file.iter().any(|f| f.name.as_deref() == Some(dep))
                {
                    return Err(RegistryError::MissingDependency {
                        file: name.clone(),
                        dependency: dep.clone(),
                    });
                }
            }

            let b = build::build_file(proto)?;
            for m in &b.messages {
                if inner.symbols.contains_key(&m.full_name)
                    || pending_symbols.contains_key(&m.full_name)
                {
                    return Err(RegistryError::DuplicateSymbol {
                        name: m.full_name.clone(),
                    });
                }
                pending_symbols.insert(m.full_name.clone(), ());
            }
            for e in &b.enums {
                if inner.symbols.contains_key(&e.full_name)
                    || pending_symbols.contains_key(&e.full_name)
                {
                    return Err(RegistryError::DuplicateSymbol {
                        name: e.full_name.clone(),
                    });
                }
                pending_symbols.insert(e.full_name.clone(), ());
            }
            for s in &b.services {
                if inner.symbols.contains_key(&s.full_name)
                    || pending_symbols.contains_key(&s.full_name)
                {
                    return Err(RegistryError::DuplicateSymbol {
                        name: s.full_name.clone(),
                    });
                }
                pending_symbols.insert(s.full_name.clone(), ());
            }

            built.push(b);
        }

        // Phase 2: every type reference made by a field, map key, or method
        // must resolve against the pool's existing symbols plus everything
        // in this batch.
        for b in &built {
            for m in &b.messages {
                for field in &m.fields {
                    if let Some(type_name) = field.ty.type_name() {
                        if !inner.symbols.contains_key(type_name)
                            && !pending_symbols.contains_key(type_name)
                        {
                            return Err(RegistryError::SymbolNotFound {
                                name: type_name.to_string(),
                            });
                        }
                    }
                }
            }
            for s in &b.services {
                for method in &s.methods {
                    for type_name in [&method.input_type, &method.output_type] {
                        if !inner.symbols.contains_key(type_name.as_str())
                            && !pending_symbols.contains_key(type_name.as_str())
                        {
                            return Err(RegistryError::SymbolNotFound {
                                name: type_name.clone(),
                            });
                        }
                    }
                }
            }
        }

        // Phase 3: commit. Nothing above this point mutated `inner`.
        let mut results = Vec::with_capacity(set.file.len());
        for name in &already_present_names {
            let idx = inner.file_names[name];
            results.push(FileDescriptor {
                pool: self.clone(),
                index: idx,
            });
        }
        for (proto, b) in set.file.iter().zip(built) {
            let name = proto.name.clone().unwrap_or_default();
            let index = inner.files.len();
            inner.files.push(b.file);
            inner.file_names.insert(name.clone(), index);
            inner.file_protos.insert(name, proto.clone());
            for m in b.messages {
                inner
                    .symbols
                    .insert(m.full_name.clone(), Symbol::Message(m));
            }
            for e in b.enums {
                inner.symbols.insert(e.full_name.clone(), Symbol::Enum(e));
            }
            for s in b.services {
                inner
                    .symbols
                    .insert(s.full_name.clone(), Symbol::Service(s));
            }
            results.push(FileDescriptor {
                pool: self.clone(),
                index,
            });
        }

        Ok(results)
    }

    pub fn get_file_by_name(&self, name: &str) -> Option<FileDescriptor> {
        let inner = self.inner.read().expect("descriptor pool lock poisoned");
        inner.file_names.get(name).map(|&index| FileDescriptor {
            pool: self.clone(),
            index,
        })
    }

    pub fn get_message_by_name(&self, name: &str) -> Option<MessageDescriptor> {
        let inner = self.inner.read().expect("descriptor pool lock poisoned");
        match inner.symbols.get(name) {
            Some(Symbol::Message(data)) => Some(MessageDescriptor {
                pool: self.clone(),
                data: data.clone(),
            }),
            _ => None,
        }
    }

    pub fn get_enum_by_name(&self, name: &str) -> Option<EnumDescriptor> {
        let inner = self.inner.read().expect("descriptor pool lock poisoned");
        match inner.symbols.get(name) {
            Some(Symbol::Enum(data)) => Some(EnumDescriptor {
                pool: self.clone(),
                data: data.clone(),
            }),
            _ => None,
        }
    }

    pub fn get_service_by_name(&self, name: &str) -> Option<ServiceDescriptor> {
        let inner = self.inner.read().expect("descriptor pool lock poisoned");
        match inner.symbols.get(name) {
            Some(Symbol::Service(data)) => Some(ServiceDescriptor {
                pool: self.clone(),
                data: data.clone(),
            }),
            _ => None,
        }
    }

    /// Convenience constructor: looks up `full_name` and returns an empty
    /// [`DynamicMessage`] for it, or `None` if no such message is registered.
    pub fn create_message(&self, full_name: &str) -> Option<DynamicMessage> {
        self.get_message_by_name(full_name).map(DynamicMessage::new)
    }

    pub fn files(&self) -> Vec<FileDescriptor> {
        let inner = self.inner.read().expect("descriptor pool lock poisoned");
        (0..inner.files.len())
            .map(|index| FileDescriptor {
                pool: self.clone(),
                index,
            })
            .collect()
    }

    pub(crate) fn resolve_message(&self, name: &str) -> MessageDescriptor {
        self.get_message_by_name(name)
            .unwrap_or_else(|| panic!("descriptor pool: dangling message reference '{}'", name))
    }

    pub(crate) fn resolve_enum(&self, name: &str) -> EnumDescriptor {
        self.get_enum_by_name(name)
            .unwrap_or_else(|| panic!("descriptor pool: dangling enum reference '{}'", name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost_types::field_descriptor_proto::{Label, Type};
    use prost_types::{DescriptorProto, FieldDescriptorProto};

    fn person_file() -> FileDescriptorProto {
        FileDescriptorProto {
            name: Some("person.proto".to_string()),
            package: Some("test".to_string()),
            syntax: Some("proto3".to_string()),
            message_type: vec![DescriptorProto {
                name: Some("Person".to_string()),
                field: vec![
                    FieldDescriptorProto {
                        name: Some("name".to_string()),
                        number: Some(1),
                        label: Some(Label::Optional as i32),
                        r#type: Some(Type::String as i32),
                        ..Default::default()
                    },
                    FieldDescriptorProto {
                        name: Some("id".to_string()),
                        number: Some(2),
                        label: Some(Label::Optional as i32),
                        r#type: Some(Type::Int32 as i32),
                        ..Default::default()
                    },
                ],
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn add_file_then_lookup() {
        let pool = DescriptorPool::new();
        pool.add_file(person_file()).unwrap();
        let message = pool.get_message_by_name("test.Person").unwrap();
        assert_eq!(message.full_name(), "test.Person");
        assert_eq!(message.fields().count(), 2);
    }

    #[test]
    fn duplicate_identical_file_is_idempotent() {
        let pool = DescriptorPool::new();
        pool.add_file(person_file()).unwrap();
        pool.add_file(person_file()).unwrap();
        assert_eq!(pool.files().len(), 1);
    }

    #[test]
    fn duplicate_symbol_rejected_atomically() {
        let pool = DescriptorPool::new();
        pool.add_file(person_file()).unwrap();

        let mut other = person_file();
        other.name = Some("other.proto".to_string());
        other.message_type[0].field.push(FieldDescriptorProto {
            name: Some("extra".to_string()),
            number: Some(3),
            label: Some(Label::Optional as i32),
            r#type: Some(Type::Bool as i32),
            ..Default::default()
        });

        let err = pool.add_file(other).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateSymbol { .. }));
        // the conflicting file must not have been partially installed
        assert!(pool.get_file_by_name("other.proto").is_none());
        let message = pool.get_message_by_name("test.Person").unwrap();
        assert_eq!(message.fields().count(), 2);
    }

    #[test]
    fn unresolved_type_reference_rejected() {
        let pool = DescriptorPool::new();
        let mut file = person_file();
        file.message_type[0].field.push(FieldDescriptorProto {
            name: Some("address".to_string()),
            number: Some(3),
            label: Some(Label::Optional as i32),
            r#type: Some(Type::Message as i32),
            type_name: Some("test.Address".to_string()),
            ..Default::default()
        });
        let err = pool.add_file(file).unwrap_err();
        assert!(matches!(err, RegistryError::SymbolNotFound { .. }));
    }
}
