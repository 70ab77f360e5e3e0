//! Custom wire formats a type can provide for itself.
//!
//! A type opts into one or more capabilities by implementing the trait and
//! listing it in [`Decode::overrides`]. When several are listed, the first
//! of native, binary and record is used, and the encoder makes the same
//! choice.

use std::any::type_name;
use std::fmt;

use crate::de::Decode;
use crate::error::{BoxError, Error};
use crate::strategy::Plan;

/// A self-describing record format, stored length-prefixed.
pub trait Record {
    /// Serializes `self` into a standalone record.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the value cannot be represented.
    fn encode_record(&self) -> Result<Vec<u8>, BoxError>;

    /// Replaces `self` with the contents of a record.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the record is invalid.
    fn decode_record(&mut self, data: &[u8]) -> Result<(), BoxError>;
}

/// A standard binary marshaling format, stored length-prefixed.
pub trait BinaryMarshal {
    /// Marshals `self` into bytes.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the value cannot be represented.
    fn marshal_binary(&self) -> Result<Vec<u8>, BoxError>;

    /// Replaces `self` with the unmarshaled bytes.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the bytes are invalid.
    fn unmarshal_binary(&mut self, data: &[u8]) -> Result<(), BoxError>;
}

/// A codec that writes directly into the output and knows its own length.
pub trait NativeCodec {
    /// Appends the encoded value to `out`.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the value cannot be represented.
    fn encode_native(&self, out: &mut Vec<u8>) -> Result<(), BoxError>;

    /// Decodes from the start of `data`, returning the amount of bytes used.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the data is invalid.
    fn decode_native(&mut self, data: &[u8]) -> Result<usize, BoxError>;
}

type DecodeSliceFn<T> = fn(&mut T, &[u8]) -> Result<(), BoxError>;
type DecodeNativeFn<T> = fn(&mut T, &[u8]) -> Result<usize, BoxError>;

/// The capabilities of a type, as returned by [`Decode::overrides`].
#[must_use]
pub struct Overrides<T> {
    record: Option<DecodeSliceFn<T>>,
    binary: Option<DecodeSliceFn<T>>,
    native: Option<DecodeNativeFn<T>>,
}

impl<T> Overrides<T> {
    /// No capabilities. The type is decoded by its structure.
    pub const fn none() -> Self {
        Self {
            record: None,
            binary: None,
            native: None,
        }
    }

    /// Adds the [`Record`] capability.
    pub fn with_record(mut self) -> Self
    where
        T: Record,
    {
        self.record = Some(T::decode_record);
        self
    }

    /// Adds the [`BinaryMarshal`] capability.
    pub fn with_binary(mut self) -> Self
    where
        T: BinaryMarshal,
    {
        self.binary = Some(T::unmarshal_binary);
        self
    }

    /// Adds the [`NativeCodec`] capability.
    pub fn with_native(mut self) -> Self
    where
        T: NativeCodec,
    {
        self.native = Some(T::decode_native);
        self
    }

    /// Whether no capability was added.
    pub fn is_empty(&self) -> bool {
        self.record.is_none() && self.binary.is_none() && self.native.is_none()
    }
}

impl<T> Default for Overrides<T> {
    fn default() -> Self {
        Self::none()
    }
}

impl<T> fmt::Debug for Overrides<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Overrides")
            .field("record", &self.record.is_some())
            .field("binary", &self.binary.is_some())
            .field("native", &self.native.is_some())
            .finish()
    }
}

/// Builds the plan for `T` from its highest-priority capability, if it has any.
pub(crate) fn resolve<T: Decode>() -> Option<Plan<T>> {
    let overrides = T::overrides();

    if let Some(decode) = overrides.native {
        log::trace!("Using native codec of `{}`.", type_name::<T>());
        return Some(Plan::new(move |reader, dest: &mut T| {
            let used = decode(dest, reader.remainder()).map_err(Error::capability::<T>)?;
            reader.skip(used)
        }));
    }

    if let Some(decode) = overrides.binary {
        log::trace!("Using binary marshaling of `{}`.", type_name::<T>());
        return Some(length_prefixed(decode));
    }

    if let Some(decode) = overrides.record {
        log::trace!("Using record format of `{}`.", type_name::<T>());
        return Some(length_prefixed(decode));
    }

    None
}

fn length_prefixed<T: 'static>(decode: DecodeSliceFn<T>) -> Plan<T> {
    Plan::new(move |reader, dest: &mut T| {
        let len = reader.read_length()?;
        let data = reader.read_slice(len)?;
        decode(dest, data).map_err(Error::capability::<T>)
    })
}
