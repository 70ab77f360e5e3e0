use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::builder::Builder;
use crate::de::Decode;
use crate::descriptor::TypeDescriptor;
use crate::error::Result;
use crate::strategy::{ErasedStrategy, Slot, Strategy};

/// A compiled strategy, kept both typed and erased.
pub(crate) struct Entry {
    slot: Arc<dyn Any + Send + Sync>,
    erased: ErasedStrategy,
}

impl Entry {
    pub fn new<T: 'static>(slot: Arc<Slot<T>>) -> Self {
        let erased = ErasedStrategy::new(Strategy::bound(Arc::clone(&slot)));
        Self { slot, erased }
    }

    pub fn strategy<T: 'static>(&self) -> Option<Strategy<T>> {
        downcast_slot(&self.slot).map(Strategy::bound)
    }

    pub fn erased(&self) -> ErasedStrategy {
        self.erased.clone()
    }
}

pub(crate) fn downcast_slot<T: 'static>(
    slot: &Arc<dyn Any + Send + Sync>,
) -> Option<Arc<Slot<T>>> {
    Arc::clone(slot).downcast::<Slot<T>>().ok()
}

/// Maps type descriptors to their compiled strategies.
///
/// Entries are only ever added, and only as a complete set of strategies
/// produced by one successful construction transaction.
#[derive(Default)]
pub(crate) struct StrategyCache {
    map: RwLock<HashMap<TypeDescriptor, Entry>>,
}

impl StrategyCache {
    pub fn get<T: Decode>(&self) -> Result<Strategy<T>> {
        let key = TypeDescriptor::of::<T>();
        if let Some(strategy) = self.read().get(&key).and_then(Entry::strategy::<T>) {
            return Ok(strategy);
        }

        let mut map = self.write();
        if let Some(strategy) = map.get(&key).and_then(Entry::strategy::<T>) {
            return Ok(strategy);
        }

        let mut builder = Builder::new(&map);
        let strategy = builder.resolve::<T>()?;
        let finished = builder.into_finished();
        publish(&mut map, key, finished);
        Ok(strategy)
    }

    pub fn get_erased(&self, key: TypeDescriptor) -> Result<ErasedStrategy> {
        if let Some(entry) = self.read().get(&key) {
            return Ok(entry.erased());
        }

        let mut map = self.write();
        if let Some(entry) = map.get(&key) {
            return Ok(entry.erased());
        }

        let mut builder = Builder::new(&map);
        let strategy = key.compile(&mut builder)?;
        let finished = builder.into_finished();
        publish(&mut map, key, finished);
        Ok(strategy)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    // the map is only ever extended with complete entries, so a panic while a
    // lock was held cannot have left it inconsistent
    fn read(&self) -> RwLockReadGuard<'_, HashMap<TypeDescriptor, Entry>> {
        self.map.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<TypeDescriptor, Entry>> {
        self.map.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn publish(
    map: &mut HashMap<TypeDescriptor, Entry>,
    root: TypeDescriptor,
    finished: HashMap<TypeDescriptor, Entry>,
) {
    log::debug!(
        "Publishing {} decode strategies for `{}`.",
        finished.len(),
        root.name()
    );

    for (key, entry) in finished {
        map.entry(key).or_insert(entry);
    }
}
