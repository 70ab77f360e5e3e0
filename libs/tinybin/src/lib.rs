//! # tinybin
//!
//! Compact binary serialization driven by compiled, cached decode plans.
//!
//! The format is not self-describing: the decoding side must use types of the
//! same shape the encoding side used. For every type, the [`Engine`] compiles a
//! [`Strategy`] once and reuses it for every following decode.
//!
//! Rust types map to the wire as follows:
//!
//! - packed bit: [`bool`]. Eight booleans share one byte, least significant bit
//!   first. The byte is claimed where the first of them is read.
//! - raw byte: [`u8`], [`i8`]
//! - unsigned LEB128: [`u16`], [`u32`], [`u64`], [`u128`], [`usize`], [`char`]
//! - signed LEB128: [`i16`], [`i32`], [`i64`], [`i128`], [`isize`]
//! - little-endian bytes: [`f32`], [`f64`], and [`Complex`] as two of them
//! - length-prefixed: [`String`] and [`str`]
//! - presence bit, then length-prefixed: [`Vec`], slices, [`Bytes`](bytes::Bytes),
//!   [`HashMap`](std::collections::HashMap) and
//!   [`BTreeMap`](std::collections::BTreeMap). Empty ones are written as absent.
//! - presence bit, then the value: [`Option`]
//! - presence bit, registered name, then the value: [`Dynamic`]
//! - the fields in order: arrays, tuples and derived structs. [`Box`] is
//!   written as its content.
//! - nothing: `()`, [`PhantomData`](std::marker::PhantomData) and structs
//!   without fields
//!
//! Types may instead provide their own format through the traits in
//! [`overrides`].
//!
//! ```
//! use tinybin::{Decode, Encode};
//!
//! #[derive(Debug, PartialEq, Decode, Encode)]
//! struct Point {
//!     x: i32,
//!     y: i32,
//!     label: String,
//! }
//!
//! let point = Point { x: 3, y: -4, label: "home".to_owned() };
//! let buf = tinybin::encode(&point).expect("point can be encoded");
//!
//! let mut out = Point { x: 0, y: 0, label: String::new() };
//! let read = tinybin::decode(&buf, &mut out).expect("point can be decoded");
//! assert_eq!(read, buf.len(), "must consume the whole buffer");
//! assert_eq!(point, out, "must round trip");
//! ```

// for benchmarks
#[cfg(test)]
use criterion as _;

extern crate self as tinybin;

mod builder;
mod cache;
pub mod config;
pub mod de;
mod descriptor;
mod dynamic;
mod engine;
pub mod error;
mod impls;
mod leb128;
pub mod overrides;
mod primitive;
mod registry;
pub mod ser;
mod strategy;

#[cfg(test)]
mod tests;

pub use ::tinybin_macros::{Decode, Encode};
pub use builder::{Aggregate, Builder, MapStorage};
pub use config::EngineConfig;
pub use de::{Decode, Decoder, Destinations, Reader};
pub use descriptor::TypeDescriptor;
pub use dynamic::{Dynamic, DynamicValue};
pub use engine::Engine;
pub use error::{Error, Result};
pub use primitive::{Complex, Complex32, Complex64};
pub use registry::{DynamicType, Registry};
pub use ser::{Encode, Sources, Writer};
pub use strategy::{ErasedStrategy, Plan, Strategy};

/// Decodes `buf` into the destinations with the [global](Engine::global)
/// engine.
///
/// `dests` is either a `&mut T` or a tuple of up to 8 of them. Returns the
/// amount of bytes consumed.
///
/// # Errors
///
/// Returns `Err` if a strategy could not be compiled or the data is malformed.
pub fn decode<D: Destinations>(buf: &[u8], dests: D) -> Result<usize> {
    Engine::global().decode(buf, dests)
}

/// Encodes the values with the [global](Engine::global) engine.
///
/// `values` is either a `&T` or a tuple of up to 8 of them.
///
/// # Errors
///
/// Returns `Err` if any value cannot be encoded.
pub fn encode<S: Sources>(values: S) -> Result<Vec<u8>> {
    Engine::global().encode(values)
}

/// Registers `T` under `name` with the [global](Engine::global) engine.
///
/// # Errors
///
/// Returns [`Error::DuplicateName`] if `name` is already registered for a
/// different type.
pub fn register<T: Decode + DynamicValue>(name: &str) -> Result<()> {
    Engine::global().register::<T>(name)
}
