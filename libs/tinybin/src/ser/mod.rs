//! Exposes the [`Encode`] trait.
//!
//! Encoding needs no compiled plans: every type writes itself, mirroring the
//! layout its decode strategy reads.

use crate::error::Result;

mod write;

pub use write::Writer;

/// A type that can be written in the format its [`Decode`](crate::Decode)
/// strategy reads.
pub trait Encode {
    /// Writes `self`.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the value, or a value it contains, cannot be encoded.
    fn encode(&self, writer: &mut Writer<'_>) -> Result<()>;
}

impl<T: Encode + ?Sized> Encode for &T {
    fn encode(&self, writer: &mut Writer<'_>) -> Result<()> {
        T::encode(self, writer)
    }
}

/// A set of references to encode, in order.
///
/// Implemented for `&T` and tuples of up to 8 `&T`.
pub trait Sources {
    /// Writes every value.
    ///
    /// # Errors
    ///
    /// Returns `Err` if any value cannot be encoded.
    fn encode_all(self, writer: &mut Writer<'_>) -> Result<()>;
}

impl<T: Encode + ?Sized> Sources for &T {
    fn encode_all(self, writer: &mut Writer<'_>) -> Result<()> {
        self.encode(writer)
    }
}

macro_rules! impl_sources {
    ($($T:ident $idx:tt),*) => {
        impl<$($T: Encode + ?Sized),*> Sources for ($(&$T,)*) {
            fn encode_all(self, writer: &mut Writer<'_>) -> Result<()> {
                $( self.$idx.encode(writer)?; )*
                Ok(())
            }
        }
    };
}

impl_sources!(A 0);
impl_sources!(A 0, B 1);
impl_sources!(A 0, B 1, C 2);
impl_sources!(A 0, B 1, C 2, D 3);
impl_sources!(A 0, B 1, C 2, D 3, E 4);
impl_sources!(A 0, B 1, C 2, D 3, E 4, F 5);
impl_sources!(A 0, B 1, C 2, D 3, E 4, F 5, G 6);
impl_sources!(A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7);
