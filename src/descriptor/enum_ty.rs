use std::sync::Arc;

use super::pool::DescriptorPool;
use super::EnumData;

/// An enum type registered in a [`DescriptorPool`].
#[derive(Clone)]
pub struct EnumDescriptor {
    pub(crate) pool: DescriptorPool,
    pub(crate) data: Arc<EnumData>,
}

impl PartialEq for EnumDescriptor {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}
impl Eq for EnumDescriptor {}

impl std::fmt::Debug for EnumDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnumDescriptor")
            .field("full_name", &self.data.full_name)
            .finish()
    }
}

impl EnumDescriptor {
    pub fn pool(&self) -> &DescriptorPool {
        &self.pool
    }

    pub fn name(&self) -> &str {
        &self.data.name
    }

    pub fn full_name(&self) -> &str {
        &self.data.full_name
    }

    /// The value numbered zero, which every proto3 enum is guaranteed to
    /// declare and which every unset enum field defaults to.
    pub fn default_value(&self) -> EnumValueDescriptor {
        self.get_value_by_number(0).unwrap_or_else(|| EnumValueDescriptor {
            parent: self.clone(),
            index: 0,
        })
    }

    pub fn values(&self) -> impl Iterator<Item = EnumValueDescriptor> + '_ {
        (0..self.data.values.len()).map(move |index| EnumValueDescriptor {
            parent: self.clone(),
            index,
        })
    }

    pub fn get_value_by_number(&self, number: i32) -> Option<EnumValueDescriptor> {
        self.data
            .value_by_number
            .get(&number)
            .map(|&index| EnumValueDescriptor {
                parent: self.clone(),
                index,
            })
    }

    pub fn get_value_by_name(&self, name: &str) -> Option<EnumValueDescriptor> {
        self.data
            .value_by_name
            .get(name)
            .map(|&index| EnumValueDescriptor {
                parent: self.clone(),
                index,
            })
    }

    pub fn parent_file(&self) -> super::FileDescriptor {
        self.pool
            .get_file_by_name(&self.data.file)
            .expect("enum descriptor's owning file is always registered")
    }
}

/// A single named value of an [`EnumDescriptor`].
#[derive(Clone)]
pub struct EnumValueDescriptor {
    parent: EnumDescriptor,
    index: usize,
}

impl PartialEq for EnumValueDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.parent == other.parent && self.index == other.index
    }
}
impl Eq for EnumValueDescriptor {}

impl EnumValueDescriptor {
    pub fn parent_enum(&self) -> &EnumDescriptor {
        &self.parent
    }

    pub fn name(&self) -> &str {
        &self.parent.data.values[self.index].0
    }

    pub fn number(&self) -> i32 {
        self.parent.data.values[self.index].1
    }
}
