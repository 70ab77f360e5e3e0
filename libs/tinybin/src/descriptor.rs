use std::any::{TypeId, type_name};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::builder::Builder;
use crate::de::Decode;
use crate::error::Result;
use crate::strategy::ErasedStrategy;

type CompileFn = fn(&mut Builder<'_>) -> Result<ErasedStrategy>;

/// Identifies a decodable type.
///
/// Descriptors compare and hash by type identity only. Besides naming the type,
/// a descriptor knows how to compile the type's strategy, so strategies can be
/// requested without having a value of the type at hand.
#[derive(Clone, Copy)]
pub struct TypeDescriptor {
    id: TypeId,
    name: &'static str,
    compile: CompileFn,
}

impl TypeDescriptor {
    /// Gets the descriptor for `T`.
    pub fn of<T: Decode>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
            compile: compile::<T>,
        }
    }

    /// The [`TypeId`] of the described type.
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// The name of the described type, as given by [`type_name`].
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn compile(&self, builder: &mut Builder<'_>) -> Result<ErasedStrategy> {
        (self.compile)(builder)
    }
}

fn compile<T: Decode>(builder: &mut Builder<'_>) -> Result<ErasedStrategy> {
    builder.resolve::<T>().map(ErasedStrategy::new)
}

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeDescriptor {}

impl Hash for TypeDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypeDescriptor").field(&self.name).finish()
    }
}
