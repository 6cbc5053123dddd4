use super::enum_ty::EnumDescriptor;
use super::message::MessageDescriptor;
use super::pool::DescriptorPool;
use super::service::ServiceDescriptor;
use super::Syntax;

/// A single registered `.proto` file's worth of declarations.
#[derive(Clone)]
pub struct FileDescriptor {
    pub(crate) pool: DescriptorPool,
    pub(crate) index: usize,
}

impl PartialEq for FileDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name()
    }
}
impl Eq for FileDescriptor {}

impl std::fmt::Debug for FileDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileDescriptor")
            .field("name", &self.name())
            .finish()
    }
}

impl FileDescriptor {
    fn with_data<R>(&self, f: impl FnOnce(&super::FileData) -> R) -> R {
        let inner = self.pool.inner.read().expect("descriptor pool lock poisoned");
        f(&inner.files[self.index])
    }

    pub fn pool(&self) -> &DescriptorPool {
        &self.pool
    }

    pub fn name(&self) -> String {
        self.with_data(|data| data.name.clone())
    }

    pub fn package(&self) -> String {
        self.with_data(|data| data.package.clone())
    }

    pub fn syntax(&self) -> Syntax {
        self.with_data(|data| data.syntax)
    }

    pub fn dependencies(&self) -> Vec<FileDescriptor> {
        let names = self.with_data(|data| data.dependencies.clone());
        names
            .into_iter()
            .filter_map(|name| self.pool.get_file_by_name(&name))
            .collect()
    }

    pub fn messages(&self) -> Vec<MessageDescriptor> {
        self.with_data(|data| {
            data.top_level_messages
                .iter()
                .map(|d| MessageDescriptor {
                    pool: self.pool.clone(),
                    data: d.clone(),
                })
                .collect()
        })
    }

    pub fn enums(&self) -> Vec<EnumDescriptor> {
        self.with_data(|data| {
            data.top_level_enums
                .iter()
                .map(|d| EnumDescriptor {
                    pool: self.pool.clone(),
                    data: d.clone(),
                })
                .collect()
        })
    }

    pub fn services(&self) -> Vec<ServiceDescriptor> {
        self.with_data(|data| {
            data.services
                .iter()
                .map(|d| ServiceDescriptor {
                    pool: self.pool.clone(),
                    data: d.clone(),
                })
                .collect()
        })
    }
}
