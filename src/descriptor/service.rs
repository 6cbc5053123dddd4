use std::sync::Arc;

use super::pool::DescriptorPool;
use super::{MethodData, ServiceData};

/// An RPC service declaration.
///
/// Methods are exposed only as descriptors naming their input/output message
/// types; this crate does not dispatch RPCs.
#[derive(Clone)]
pub struct ServiceDescriptor {
    pub(crate) pool: DescriptorPool,
    pub(crate) data: Arc<ServiceData>,
}

impl PartialEq for ServiceDescriptor {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}
impl Eq for ServiceDescriptor {}

impl ServiceDescriptor {
    pub fn name(&self) -> &str {
        &self.data.name
    }

    pub fn full_name(&self) -> &str {
        &self.data.full_name
    }

    pub fn methods(&self) -> impl Iterator<Item = MethodDescriptor> + '_ {
        (0..self.data.methods.len()).map(move |index| MethodDescriptor {
            service: self.clone(),
            index,
        })
    }

    pub fn parent_file(&self) -> super::FileDescriptor {
        self.pool
            .get_file_by_name(&self.data.file)
            .expect("service descriptor's owning file is always registered")
    }
}

#[derive(Clone)]
pub struct MethodDescriptor {
    service: ServiceDescriptor,
    index: usize,
}

impl PartialEq for MethodDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.service == other.service && self.index == other.index
    }
}
impl Eq for MethodDescriptor {}

impl MethodDescriptor {
    fn data(&self) -> &MethodData {
        &self.service.data.methods[self.index]
    }

    pub fn name(&self) -> &str {
        &self.data().name
    }

    pub fn parent_service(&self) -> &ServiceDescriptor {
        &self.service
    }

    pub fn input(&self) -> crate::MessageDescriptor {
        self.service.pool.resolve_message(&self.data().input_type)
    }

    pub fn output(&self) -> crate::MessageDescriptor {
        self.service.pool.resolve_message(&self.data().output_type)
    }

    pub fn is_client_streaming(&self) -> bool {
        self.data().client_streaming
    }

    pub fn is_server_streaming(&self) -> bool {
        self.data().server_streaming
    }
}
