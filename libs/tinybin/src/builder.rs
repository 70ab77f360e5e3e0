//! The recursive strategy compiler.
//!
//! One [`Builder`] runs per cache miss. It sees the strategies already
//! published by the engine and keeps the ones it is constructing to itself
//! until the whole transaction succeeded.

use std::any::{Any, type_name};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;

use crate::cache::{Entry, downcast_slot};
use crate::de::Decode;
use crate::descriptor::TypeDescriptor;
use crate::error::{Error, Result};
use crate::overrides;
use crate::strategy::{Plan, Slot, Strategy};

/// Compiles and links decode strategies.
///
/// Passed to [`Decode::structure`]. Implementations use the method matching
/// their shape, which resolves the strategies of the contained types and
/// returns the finished plan.
pub struct Builder<'a> {
    published: &'a HashMap<TypeDescriptor, Entry>,
    pending: HashMap<TypeDescriptor, Arc<dyn Any + Send + Sync>>,
    finished: HashMap<TypeDescriptor, Entry>,
}

impl<'a> Builder<'a> {
    pub(crate) fn new(published: &'a HashMap<TypeDescriptor, Entry>) -> Self {
        Self {
            published,
            pending: HashMap::new(),
            finished: HashMap::new(),
        }
    }

    pub(crate) fn into_finished(self) -> HashMap<TypeDescriptor, Entry> {
        self.finished
    }

    /// Gets the strategy for `T`, compiling it if needed.
    ///
    /// If `T` is still being compiled further up the stack, that is, `T`
    /// contains itself, the returned handle is deferred and becomes usable once
    /// the outer compilation finishes.
    ///
    /// # Errors
    ///
    /// Returns `Err` if `T` or a type it contains cannot be decoded.
    pub fn resolve<T: Decode>(&mut self) -> Result<Strategy<T>> {
        let key = TypeDescriptor::of::<T>();
        let known = self
            .published
            .get(&key)
            .or_else(|| self.finished.get(&key))
            .and_then(Entry::strategy::<T>);

        if let Some(strategy) = known {
            return Ok(strategy);
        }

        if let Some(slot) = self.pending.get(&key).and_then(downcast_slot::<T>) {
            log::trace!("Deferring recursive strategy for `{}`.", key.name());
            return Ok(Strategy::deferred(&slot));
        }

        let slot = Arc::new(Slot::<T>::pending());
        self.pending.insert(key, Arc::clone(&slot) as Arc<dyn Any + Send + Sync>);

        let plan = match overrides::resolve::<T>() {
            Some(plan) => plan,
            None => T::structure(self)?,
        };

        self.pending.remove(&key);
        slot.bind(plan);
        log::trace!("Compiled strategy for `{}`.", key.name());

        let strategy = Strategy::bound(Arc::clone(&slot));
        self.finished.insert(key, Entry::new(slot));
        Ok(strategy)
    }

    /// Builds the plan of an optional value, prefixed by one presence bit.
    ///
    /// An absent value clears the destination. A present value is decoded into
    /// the existing one, or into a new zero value if there was none.
    ///
    /// # Errors
    ///
    /// Returns `Err` if `E` cannot be decoded.
    pub fn optional<E: Decode>(&mut self) -> Result<Plan<Option<E>>> {
        let elem = self.resolve::<E>()?;
        Ok(Plan::new(move |reader, dest: &mut Option<E>| {
            if reader.read_packed_bool()? {
                elem.decode(reader, dest.get_or_insert_with(E::zero))
            } else {
                *dest = None;
                Ok(())
            }
        }))
    }

    /// Builds the plan of an owning indirection. The pointee is encoded
    /// directly.
    ///
    /// # Errors
    ///
    /// Returns `Err` if `E` cannot be decoded.
    pub fn boxed<E: Decode>(&mut self) -> Result<Plan<Box<E>>> {
        let elem = self.resolve::<E>()?;
        Ok(Plan::new(move |reader, dest: &mut Box<E>| {
            elem.decode(reader, &mut **dest)
        }))
    }

    /// Builds the plan of a fixed-size array.
    ///
    /// # Errors
    ///
    /// Returns `Err` if `E` cannot be decoded.
    pub fn array<E: Decode, const N: usize>(&mut self) -> Result<Plan<[E; N]>> {
        if N == 0 {
            return Ok(Plan::discard());
        }

        let elem = self.resolve::<E>()?;
        Ok(Plan::new(move |reader, dest: &mut [E; N]| {
            for slot in dest {
                elem.decode(reader, slot)?;
            }

            Ok(())
        }))
    }

    /// Builds the plan of a growable sequence, prefixed by one presence bit.
    ///
    /// When the destination's capacity suffices its storage is kept and the
    /// elements it still holds are decoded into. Otherwise fresh storage is
    /// allocated for the decoded length, capped by what the remaining input
    /// could hold, and elements are appended as they are decoded.
    ///
    /// # Errors
    ///
    /// Returns `Err` if `E` cannot be decoded.
    pub fn sequence<E: Decode>(&mut self) -> Result<Plan<Vec<E>>> {
        let elem = self.resolve::<E>()?;
        Ok(Plan::new(move |reader, dest: &mut Vec<E>| {
            if !reader.read_packed_bool()? {
                dest.clear();
                return Ok(());
            }

            let len = reader.read_length()?;
            if dest.capacity() >= len {
                dest.truncate(len);
                dest.resize_with(len, E::zero);
                for slot in dest {
                    elem.decode(reader, slot)?;
                }

                return Ok(());
            }

            // the length prefix is untrusted until the elements are there
            let capacity = if size_of::<E>() == 0 {
                len
            } else {
                len.min(reader.max_items())
            };

            *dest = Vec::with_capacity(capacity);
            for _ in 0..len {
                let mut value = E::zero();
                elem.decode(reader, &mut value)?;
                dest.push(value);
            }

            Ok(())
        }))
    }

    /// Builds the plan of an associative map, prefixed by one presence bit.
    ///
    /// The destination is always cleared before entries are inserted, so only
    /// the decoded entries remain. Space is reserved only for as many entries
    /// as the remaining input could hold.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the key or value type cannot be decoded.
    pub fn map<M: MapStorage>(&mut self) -> Result<Plan<M>> {
        let key = self.resolve::<M::Key>()?;
        let value = self.resolve::<M::Value>()?;
        Ok(Plan::new(move |reader, dest: &mut M| {
            dest.clear();
            if !reader.read_packed_bool()? {
                return Ok(());
            }

            let len = reader.read_length()?;
            dest.reserve(len.min(reader.max_items()));
            for _ in 0..len {
                let mut k = M::Key::zero();
                let mut v = M::Value::zero();
                key.decode(reader, &mut k)?;
                value.decode(reader, &mut v)?;
                dest.insert(k, v);
            }

            Ok(())
        }))
    }

    /// Starts building the plan of an aggregate whose fields are decoded in
    /// the order they are added.
    pub fn aggregate<T: Decode>(&mut self) -> Aggregate<'_, 'a, T> {
        Aggregate {
            builder: self,
            fields: Vec::new(),
        }
    }

    /// Fails the compilation of `T`, which has no data to decode.
    ///
    /// # Errors
    ///
    /// Always returns [`Error::Unsupported`].
    pub fn unsupported<T: Decode>(&self, kind: &'static str) -> Result<Plan<T>> {
        log::trace!("Rejecting `{}`: {kind}.", type_name::<T>());
        Err(Error::unsupported::<T>(kind))
    }
}

impl fmt::Debug for Builder<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builder")
            .field("published", &self.published.len())
            .field("pending", &self.pending.keys())
            .field("finished", &self.finished.keys())
            .finish()
    }
}

/// Collects the field plans of an aggregate.
///
/// Created by [`Builder::aggregate`].
#[must_use = "call `finish` to get the plan"]
pub struct Aggregate<'b, 'a, T> {
    builder: &'b mut Builder<'a>,
    fields: Vec<Plan<T>>,
}

impl<T: Decode> Aggregate<'_, '_, T> {
    /// Adds the next field, reached through `access`.
    ///
    /// # Errors
    ///
    /// Returns `Err` if `F` cannot be decoded.
    pub fn field<F: Decode>(mut self, access: fn(&mut T) -> &mut F) -> Result<Self> {
        let strategy = self.builder.resolve::<F>()?;
        self.fields.push(Plan::new(move |reader, dest: &mut T| {
            strategy.decode(reader, access(dest))
        }));
        Ok(self)
    }

    /// Finishes the plan. An aggregate without fields reads nothing.
    ///
    /// # Errors
    ///
    /// Does not currently fail, but returns a [`Result`] so it can end a chain
    /// of [`field`](Self::field) calls.
    pub fn finish(self) -> Result<Plan<T>> {
        let fields = self.fields;
        if fields.is_empty() {
            return Ok(Plan::discard());
        }

        Ok(Plan::new(move |reader, dest: &mut T| {
            for field in &fields {
                field.run(reader, dest)?;
            }

            Ok(())
        }))
    }
}

impl<T> fmt::Debug for Aggregate<'_, '_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Aggregate")
            .field("type", &type_name::<T>())
            .field("fields", &self.fields.len())
            .finish()
    }
}

/// Map types the builder can decode into.
pub trait MapStorage: Decode {
    type Key: Decode;
    type Value: Decode;

    fn clear(&mut self);
    fn reserve(&mut self, additional: usize);
    fn insert(&mut self, key: Self::Key, value: Self::Value);
}

impl<K, V, S> MapStorage for HashMap<K, V, S>
where
    K: Decode + Eq + Hash,
    V: Decode,
    S: BuildHasher + Default + 'static,
{
    type Key = K;
    type Value = V;

    fn clear(&mut self) {
        Self::clear(self);
    }

    fn reserve(&mut self, additional: usize) {
        Self::reserve(self, additional);
    }

    fn insert(&mut self, key: K, value: V) {
        Self::insert(self, key, value);
    }
}

impl<K, V> MapStorage for BTreeMap<K, V>
where
    K: Decode + Ord,
    V: Decode,
{
    type Key = K;
    type Value = V;

    fn clear(&mut self) {
        Self::clear(self);
    }

    fn reserve(&mut self, _additional: usize) {}

    fn insert(&mut self, key: K, value: V) {
        Self::insert(self, key, value);
    }
}
