//! Exposes the [`Decode`] trait and the [`Decoder`].

use std::any::Any;

use crate::builder::Builder;
use crate::descriptor::TypeDescriptor;
use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::overrides::Overrides;
use crate::strategy::{ErasedStrategy, Plan};

mod read;

pub use read::Reader;

/// A type whose decode strategy can be compiled by a [`Builder`].
///
/// Usually derived. Implementations pick the builder method matching their
/// structural shape in [`structure`](Self::structure); the builder takes care
/// of caching and recursion.
pub trait Decode: Sized + 'static {
    /// The value freshly allocated storage is initialized to before decoding
    /// into it.
    fn zero() -> Self;

    /// Custom wire formats provided by the type itself.
    ///
    /// If any capability is present, [`structure`](Self::structure) is never
    /// called.
    fn overrides() -> Overrides<Self> {
        Overrides::none()
    }

    /// Builds the plan that decodes this type from its structure.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the type, or any type it contains, cannot be decoded.
    fn structure(builder: &mut Builder<'_>) -> Result<Plan<Self>>;
}

/// Decodes a batch of values with strategies compiled once.
///
/// Building a decoder compiles (or fetches from the cache) one strategy per
/// target. Decoding only creates fresh cursors, so a decoder is meant to be
/// reused across many buffers.
#[derive(Debug, Clone)]
pub struct Decoder {
    engine: Engine,
    strategies: Vec<ErasedStrategy>,
}

impl Decoder {
    /// Creates a decoder for the given targets, in order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoTargets`] if `targets` is empty, or `Err` if a
    /// strategy could not be compiled.
    pub fn new(engine: &Engine, targets: &[TypeDescriptor]) -> Result<Self> {
        if targets.is_empty() {
            return Err(Error::NoTargets);
        }

        let strategies = targets
            .iter()
            .map(|&target| engine.erased_strategy(target))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            engine: engine.clone(),
            strategies,
        })
    }

    /// Creates a decoder for the types referenced by `D`.
    ///
    /// # Errors
    ///
    /// Returns `Err` if a strategy could not be compiled.
    pub fn for_targets<D: Destinations>(engine: &Engine) -> Result<Self> {
        Self::new(engine, &D::descriptors())
    }

    /// The names of the target types, in order.
    pub fn targets(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.strategies.iter().map(ErasedStrategy::type_name)
    }

    /// Decodes `buf` into the destinations.
    ///
    /// Returns the amount of bytes consumed from the start of `buf`.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the destinations don't match the targets or the data is
    /// malformed. The destinations may be partially overwritten in that case.
    pub fn decode<D: Destinations>(&self, buf: &[u8], dests: D) -> Result<usize> {
        dests.with_targets(|dests| self.decode_values(buf, dests))
    }

    /// Decodes `buf` into type-erased destinations.
    ///
    /// Returns the amount of bytes consumed from the start of `buf`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TargetCount`] or [`Error::TargetMismatch`] if the
    /// destinations don't match the targets, or `Err` if the data is malformed.
    pub fn decode_values(&self, buf: &[u8], dests: &mut [&mut dyn Any]) -> Result<usize> {
        if dests.len() != self.strategies.len() {
            return Err(Error::TargetCount {
                expected: self.strategies.len(),
                actual: dests.len(),
            });
        }

        let mut reader = Reader::new(buf, &self.engine);
        for (strategy, dest) in self.strategies.iter().zip(dests) {
            strategy.decode(&mut reader, &mut **dest)?;
        }

        Ok(reader.position())
    }
}

/// A set of mutable references to decode into.
///
/// Implemented for `&mut T` and tuples of up to 8 `&mut T`.
pub trait Destinations {
    /// The descriptors of the referenced types, in order.
    fn descriptors() -> Vec<TypeDescriptor>;

    /// Calls `f` with the references as type-erased destinations.
    fn with_targets<R>(self, f: impl FnOnce(&mut [&mut dyn Any]) -> R) -> R;
}

impl<T: Decode> Destinations for &mut T {
    fn descriptors() -> Vec<TypeDescriptor> {
        vec![TypeDescriptor::of::<T>()]
    }

    fn with_targets<R>(self, f: impl FnOnce(&mut [&mut dyn Any]) -> R) -> R {
        f(&mut [self as &mut dyn Any])
    }
}

macro_rules! impl_destinations {
    ($($T:ident $idx:tt),*) => {
        impl<$($T: Decode),*> Destinations for ($(&mut $T,)*) {
            fn descriptors() -> Vec<TypeDescriptor> {
                vec![$(TypeDescriptor::of::<$T>()),*]
            }

            fn with_targets<R>(self, f: impl FnOnce(&mut [&mut dyn Any]) -> R) -> R {
                f(&mut [$(self.$idx as &mut dyn Any),*])
            }
        }
    };
}

impl_destinations!(A 0);
impl_destinations!(A 0, B 1);
impl_destinations!(A 0, B 1, C 2);
impl_destinations!(A 0, B 1, C 2, D 3);
impl_destinations!(A 0, B 1, C 2, D 3, E 4);
impl_destinations!(A 0, B 1, C 2, D 3, E 4, F 5);
impl_destinations!(A 0, B 1, C 2, D 3, E 4, F 5, G 6);
impl_destinations!(A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7);
