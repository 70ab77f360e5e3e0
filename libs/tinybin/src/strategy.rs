//! Compiled decode logic and the handles that share it.
//!
//! A [`Plan`] is the closure that reads one type. Plans live in slots which
//! are shared through [`Strategy`] handles. Recursive types refer back to a
//! slot that is still being built through a weak, deferred handle, so the
//! graph of strategies never contains an ownership cycle.

use std::any::{Any, type_name};
use std::fmt;
use std::sync::{Arc, OnceLock, Weak};

use crate::de::Reader;
use crate::error::{Error, Result};

type DecodeFn<T> = dyn Fn(&mut Reader<'_>, &mut T) -> Result<()> + Send + Sync;

/// The decode logic for values of `T`.
///
/// A plan reads the value at the reader's cursors and writes it into the
/// destination, reusing whatever the destination already owns where the shape
/// allows it.
pub struct Plan<T>(Box<DecodeFn<T>>);

impl<T> Plan<T> {
    /// Wraps a closure as a plan.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut Reader<'_>, &mut T) -> Result<()> + Send + Sync + 'static,
    {
        Self(Box::new(f))
    }

    /// A plan that reads nothing and leaves the destination untouched.
    pub fn discard() -> Self {
        Self::new(|_, _| Ok(()))
    }

    /// Runs the plan.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the input is malformed for `T`.
    pub fn run(&self, reader: &mut Reader<'_>, dest: &mut T) -> Result<()> {
        (self.0)(reader, dest)
    }
}

impl<T> fmt::Debug for Plan<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Plan<{}>", type_name::<T>())
    }
}

/// Holds the plan of one type once it has been built.
pub(crate) struct Slot<T> {
    plan: OnceLock<Plan<T>>,
}

impl<T> Slot<T> {
    pub fn pending() -> Self {
        Self {
            plan: OnceLock::new(),
        }
    }

    pub fn bind(&self, plan: Plan<T>) {
        // a slot is only bound by the transaction that created it
        _ = self.plan.set(plan);
    }

    fn run(&self, reader: &mut Reader<'_>, dest: &mut T) -> Result<()> {
        match self.plan.get() {
            Some(plan) => plan.run(reader, dest),
            None => Err(Error::Unbound(type_name::<T>())),
        }
    }
}

enum Link<T> {
    Bound(Arc<Slot<T>>),
    Deferred(Weak<Slot<T>>),
}

/// A shared handle to the compiled decode logic for `T`.
///
/// Handles are cheap to clone. They are obtained from an
/// [`Engine`](crate::Engine) or, inside [`Decode::structure`], from the
/// [`Builder`](crate::Builder).
///
/// [`Decode::structure`]: crate::Decode::structure
pub struct Strategy<T>(Link<T>);

impl<T: 'static> Strategy<T> {
    pub(crate) fn bound(slot: Arc<Slot<T>>) -> Self {
        Self(Link::Bound(slot))
    }

    pub(crate) fn deferred(slot: &Arc<Slot<T>>) -> Self {
        Self(Link::Deferred(Arc::downgrade(slot)))
    }

    /// Whether this handle points back to a strategy that was still being built
    /// when the handle was created.
    pub fn is_deferred(&self) -> bool {
        matches!(self.0, Link::Deferred(_))
    }

    /// Decodes a value into `dest`.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the input is malformed for `T`.
    pub fn decode(&self, reader: &mut Reader<'_>, dest: &mut T) -> Result<()> {
        match &self.0 {
            Link::Bound(slot) => slot.run(reader, dest),
            Link::Deferred(slot) => match slot.upgrade() {
                Some(slot) => slot.run(reader, dest),
                None => Err(Error::Unbound(type_name::<T>())),
            },
        }
    }
}

impl<T> Clone for Strategy<T> {
    fn clone(&self) -> Self {
        Self(match &self.0 {
            Link::Bound(slot) => Link::Bound(Arc::clone(slot)),
            Link::Deferred(slot) => Link::Deferred(Weak::clone(slot)),
        })
    }
}

impl<T> fmt::Debug for Strategy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.0 {
            Link::Bound(_) => "bound",
            Link::Deferred(_) => "deferred",
        };
        write!(f, "Strategy<{}>({state})", type_name::<T>())
    }
}

trait DecodeAny: Send + Sync {
    fn decode_any(&self, reader: &mut Reader<'_>, dest: &mut dyn Any) -> Result<()>;
    fn type_name(&self) -> &'static str;
}

impl<T: 'static> DecodeAny for Strategy<T> {
    fn decode_any(&self, reader: &mut Reader<'_>, dest: &mut dyn Any) -> Result<()> {
        let dest = dest.downcast_mut::<T>().ok_or(Error::TargetMismatch {
            expected: type_name::<T>(),
        })?;
        self.decode(reader, dest)
    }

    fn type_name(&self) -> &'static str {
        type_name::<T>()
    }
}

/// A [`Strategy`] with its type erased.
///
/// Decodes into a `&mut dyn Any` after checking that it is the expected type.
#[derive(Clone)]
pub struct ErasedStrategy(Arc<dyn DecodeAny>);

impl ErasedStrategy {
    pub(crate) fn new<T: 'static>(strategy: Strategy<T>) -> Self {
        Self(Arc::new(strategy))
    }

    /// The name of the type this strategy decodes.
    pub fn type_name(&self) -> &'static str {
        self.0.type_name()
    }

    /// Decodes a value into `dest`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TargetMismatch`] if `dest` is not of the expected type,
    /// or any data error the plan reports.
    pub fn decode(&self, reader: &mut Reader<'_>, dest: &mut dyn Any) -> Result<()> {
        self.0.decode_any(reader, dest)
    }
}

impl fmt::Debug for ErasedStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ErasedStrategy<{}>", self.type_name())
    }
}
