//! Values whose concrete type is only known at runtime.
//!
//! A [`Dynamic`] is written as a presence bit, the registered name of the
//! concrete type and then the value itself. Decoding looks the name up in the
//! engine's [`Registry`](crate::Registry).

use std::any::{Any, TypeId, type_name};
use std::fmt;

use crate::builder::Builder;
use crate::de::{Decode, Reader};
use crate::error::{Error, Result};
use crate::ser::{Encode, Writer};
use crate::strategy::Plan;

/// Object-safe view of a value that can be stored in a [`Dynamic`].
///
/// Implemented for every type that is [`Encode`], [`Clone`], [`PartialEq`] and
/// [`Debug`](fmt::Debug).
pub trait DynamicValue: Any + fmt::Debug + Send + Sync {
    /// Encodes the concrete value.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the value cannot be encoded.
    fn encode_dyn(&self, writer: &mut Writer<'_>) -> Result<()>;

    /// Whether `other` is of the same type and equal.
    fn eq_dyn(&self, other: &dyn DynamicValue) -> bool;

    /// Clones the value into a new box.
    fn clone_dyn(&self) -> Box<dyn DynamicValue>;

    /// The name of the concrete type, as given by [`type_name`].
    fn type_name(&self) -> &'static str;
}

impl<T> DynamicValue for T
where
    T: Encode + Clone + PartialEq + fmt::Debug + Send + Sync + 'static,
{
    fn encode_dyn(&self, writer: &mut Writer<'_>) -> Result<()> {
        self.encode(writer)
    }

    fn eq_dyn(&self, other: &dyn DynamicValue) -> bool {
        let other: &dyn Any = other;
        other.downcast_ref::<T>().is_some_and(|other| self == other)
    }

    fn clone_dyn(&self) -> Box<dyn DynamicValue> {
        Box::new(self.clone())
    }

    fn type_name(&self) -> &'static str {
        type_name::<T>()
    }
}

fn value_id(value: &dyn DynamicValue) -> TypeId {
    let value: &dyn Any = value;
    value.type_id()
}

/// Either nothing or an owned value of some registered type.
#[derive(Debug, Default)]
pub struct Dynamic(Option<Box<dyn DynamicValue>>);

impl Dynamic {
    /// Creates an empty value.
    pub const fn empty() -> Self {
        Self(None)
    }

    /// Wraps `value`.
    pub fn new<T: DynamicValue>(value: T) -> Self {
        Self(Some(Box::new(value)))
    }

    /// Whether there is no value.
    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    /// Gets the held value.
    pub fn get(&self) -> Option<&dyn DynamicValue> {
        self.0.as_deref()
    }

    /// The [`TypeId`] of the held value.
    pub fn value_type_id(&self) -> Option<TypeId> {
        self.get().map(value_id)
    }

    /// Gets the held value if it is a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        let value: &dyn Any = self.0.as_deref()?;
        value.downcast_ref()
    }

    /// Gets the held value mutably if it is a `T`.
    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        let value: &mut dyn Any = self.0.as_deref_mut()?;
        value.downcast_mut()
    }

    /// Replaces the held value.
    pub fn set<T: DynamicValue>(&mut self, value: T) {
        self.0 = Some(Box::new(value));
    }

    /// Takes the held value, leaving nothing.
    pub fn take(&mut self) -> Option<Box<dyn DynamicValue>> {
        self.0.take()
    }

    /// Drops the held value.
    pub fn clear(&mut self) {
        self.0 = None;
    }
}

impl Clone for Dynamic {
    fn clone(&self) -> Self {
        Self(self.0.as_deref().map(DynamicValue::clone_dyn))
    }
}

impl PartialEq for Dynamic {
    fn eq(&self, other: &Self) -> bool {
        match (self.get(), other.get()) {
            (Some(a), Some(b)) => a.eq_dyn(b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl From<Box<dyn DynamicValue>> for Dynamic {
    fn from(value: Box<dyn DynamicValue>) -> Self {
        Self(Some(value))
    }
}

impl Decode for Dynamic {
    fn zero() -> Self {
        Self::empty()
    }

    fn structure(_builder: &mut Builder<'_>) -> Result<Plan<Self>> {
        Ok(Plan::new(decode_dynamic))
    }
}

fn decode_dynamic(reader: &mut Reader<'_>, dest: &mut Dynamic) -> Result<()> {
    if !reader.read_packed_bool()? {
        dest.clear();
        return Ok(());
    }

    let name = reader.read_str()?;
    let engine = reader.engine();
    let ty = engine
        .registry()
        .lookup(name)
        .ok_or_else(|| Error::UnknownDynamicType(name.to_owned()))?;

    let strategy = engine.erased_strategy(ty.descriptor())?;

    if let Some(current) = dest.0.as_deref_mut()
        && value_id(current) == ty.descriptor().id()
    {
        return strategy.decode(reader, current as &mut dyn Any);
    }

    let mut value = ty.zero_value();
    strategy.decode(reader, &mut *value as &mut dyn Any)?;
    dest.0 = Some(value);
    Ok(())
}

impl Encode for Dynamic {
    fn encode(&self, writer: &mut Writer<'_>) -> Result<()> {
        writer.write_packed_bool(self.0.is_some());
        let Some(value) = self.get() else {
            return Ok(());
        };

        let name = writer
            .engine()
            .registry()
            .name_of(value_id(value))
            .ok_or_else(|| Error::UnregisteredType(value.type_name()))?;

        writer.write_str(&name);
        value.encode_dyn(writer)
    }
}
