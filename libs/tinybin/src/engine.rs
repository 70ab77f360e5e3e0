use std::fmt;
use std::sync::{Arc, LazyLock};

use crate::cache::StrategyCache;
use crate::config::EngineConfig;
use crate::de::{Decode, Decoder, Destinations};
use crate::descriptor::TypeDescriptor;
use crate::dynamic::DynamicValue;
use crate::error::Result;
use crate::registry::Registry;
use crate::ser::{Sources, Writer};
use crate::strategy::{ErasedStrategy, Strategy};

struct Inner {
    cache: StrategyCache,
    registry: Registry,
    config: EngineConfig,
}

/// Owns the strategy cache, the dynamic-type registry and the configuration.
///
/// Cloning an engine is cheap and shares all of its state. Most applications
/// only need the [global](Self::global) engine, which backs the crate-level
/// functions.
#[derive(Clone)]
pub struct Engine(Arc<Inner>);

impl Engine {
    /// Creates an engine with the default configuration.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Creates an engine with the given configuration.
    pub fn with_config(config: EngineConfig) -> Self {
        Self(Arc::new(Inner {
            cache: StrategyCache::default(),
            registry: Registry::new(),
            config,
        }))
    }

    /// Gets the process-wide engine.
    pub fn global() -> &'static Self {
        static GLOBAL: LazyLock<Engine> = LazyLock::new(Engine::new);
        &GLOBAL
    }

    /// The configuration this engine was created with.
    pub fn config(&self) -> &EngineConfig {
        &self.0.config
    }

    /// The dynamic-type registry.
    pub fn registry(&self) -> &Registry {
        &self.0.registry
    }

    /// Gets the strategy for `T`, compiling and caching it on first use.
    ///
    /// # Errors
    ///
    /// Returns `Err` if `T` or a type it contains cannot be decoded. Nothing is
    /// cached in that case.
    pub fn strategy<T: Decode>(&self) -> Result<Strategy<T>> {
        self.0.cache.get::<T>()
    }

    /// Gets the type-erased strategy for the described type.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the type or a type it contains cannot be decoded.
    pub fn erased_strategy(&self, descriptor: TypeDescriptor) -> Result<ErasedStrategy> {
        self.0.cache.get_erased(descriptor)
    }

    /// Compiles the strategies of the described types ahead of their first
    /// use.
    ///
    /// # Errors
    ///
    /// Returns the first compilation error.
    pub fn prewarm(&self, descriptors: &[TypeDescriptor]) -> Result<()> {
        for &descriptor in descriptors {
            self.erased_strategy(descriptor)?;
        }

        Ok(())
    }

    /// Creates a reusable decoder for the types referenced by `D`.
    ///
    /// # Errors
    ///
    /// Returns `Err` if a strategy could not be compiled.
    pub fn decoder<D: Destinations>(&self) -> Result<Decoder> {
        Decoder::for_targets::<D>(self)
    }

    /// Decodes `buf` into the destinations.
    ///
    /// Returns the amount of bytes consumed.
    ///
    /// # Errors
    ///
    /// Returns `Err` if a strategy could not be compiled or the data is
    /// malformed.
    pub fn decode<D: Destinations>(&self, buf: &[u8], dests: D) -> Result<usize> {
        self.decoder::<D>()?.decode(buf, dests)
    }

    /// Decodes a single value from the start of `buf`.
    ///
    /// Returns the value and the amount of bytes consumed.
    ///
    /// # Errors
    ///
    /// Returns `Err` if a strategy could not be compiled or the data is
    /// malformed.
    pub fn decode_value<T: Decode>(&self, buf: &[u8]) -> Result<(T, usize)> {
        let mut value = T::zero();
        let read = self.decode(buf, &mut value)?;
        Ok((value, read))
    }

    /// Encodes the values, in order, into a new buffer.
    ///
    /// # Errors
    ///
    /// Returns `Err` if any value cannot be encoded.
    pub fn encode<S: Sources>(&self, values: S) -> Result<Vec<u8>> {
        let mut writer = Writer::new(self);
        values.encode_all(&mut writer)?;
        Ok(writer.into_inner())
    }

    /// Registers `T` for use in [`Dynamic`](crate::Dynamic) values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateName`](crate::Error::DuplicateName) if `name`
    /// is already registered for a different type.
    pub fn register<T: Decode + DynamicValue>(&self, name: &str) -> Result<()> {
        self.registry().register::<T>(name)
    }

    /// The amount of cached strategies.
    pub fn cache_len(&self) -> usize {
        self.0.cache.len()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("cached", &self.cache_len())
            .field("registered", &self.registry().len())
            .field("config", self.config())
            .finish()
    }
}
