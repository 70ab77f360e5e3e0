//! Names for the concrete types stored in [`Dynamic`](crate::Dynamic) values.

use std::any::{TypeId, type_name};
use std::sync::Arc;

use dashmap::DashMap;

use crate::de::Decode;
use crate::descriptor::TypeDescriptor;
use crate::dynamic::DynamicValue;
use crate::error::{Error, Result};

/// A registered dynamic type.
#[derive(Debug, Clone)]
pub struct DynamicType {
    name: Arc<str>,
    descriptor: TypeDescriptor,
    zero: fn() -> Box<dyn DynamicValue>,
}

impl DynamicType {
    /// The name written to the wire.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The descriptor of the concrete type.
    pub fn descriptor(&self) -> TypeDescriptor {
        self.descriptor
    }

    /// Creates a new zero value of the concrete type.
    pub fn zero_value(&self) -> Box<dyn DynamicValue> {
        (self.zero)()
    }
}

fn boxed_zero<T: Decode + DynamicValue>() -> Box<dyn DynamicValue> {
    Box::new(T::zero())
}

/// Maps names to types and back.
///
/// A name always refers to the same type. A type may be registered under
/// multiple names, in which case it is encoded with the most recent one.
#[derive(Debug, Default)]
pub struct Registry {
    by_name: DashMap<Arc<str>, DynamicType>,
    by_type: DashMap<TypeId, Arc<str>>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `T` under `name`.
    ///
    /// Registering the same type under the same name again does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateName`] if `name` is already registered for a
    /// different type.
    pub fn register<T: Decode + DynamicValue>(&self, name: &str) -> Result<()> {
        use dashmap::mapref::entry::Entry;

        let descriptor = TypeDescriptor::of::<T>();
        match self.by_name.entry(Arc::from(name)) {
            Entry::Occupied(entry) => {
                let existing = entry.get().descriptor;
                if existing != descriptor {
                    return Err(Error::DuplicateName {
                        name: name.to_owned(),
                        existing: existing.name(),
                    });
                }
            },
            Entry::Vacant(entry) => {
                let name = Arc::clone(entry.key());
                entry.insert(DynamicType {
                    name: Arc::clone(&name),
                    descriptor,
                    zero: boxed_zero::<T>,
                });

                log::debug!("Registered dynamic type `{}` as \"{name}\".", descriptor.name());
                self.by_type.insert(descriptor.id(), name);
            },
        }

        Ok(())
    }

    /// Registers `T` under its Rust type name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateName`] if the name is already registered for a
    /// different type.
    pub fn register_default<T: Decode + DynamicValue>(&self) -> Result<()> {
        self.register::<T>(type_name::<T>())
    }

    /// Finds the type registered under `name`.
    pub fn lookup(&self, name: &str) -> Option<DynamicType> {
        self.by_name.get(name).map(|entry| entry.value().clone())
    }

    /// Finds the name a type is encoded with.
    pub fn name_of(&self, id: TypeId) -> Option<Arc<str>> {
        self.by_type.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    /// The amount of registered names.
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Whether no names are registered.
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
