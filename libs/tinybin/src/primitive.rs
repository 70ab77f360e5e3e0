//! Scalars, text and raw bytes.

use std::marker::PhantomData;

use bytes::Bytes;

use crate::builder::Builder;
use crate::de::Decode;
use crate::error::{Error, Result};
use crate::ser::{Encode, Writer};
use crate::strategy::Plan;

/// A complex number, stored as its real part followed by its imaginary part.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Complex<F> {
    pub re: F,
    pub im: F,
}

impl<F> Complex<F> {
    /// Creates a complex number from its parts.
    pub const fn new(re: F, im: F) -> Self {
        Self { re, im }
    }
}

/// A complex number made of two [`f32`].
pub type Complex32 = Complex<f32>;
/// A complex number made of two [`f64`].
pub type Complex64 = Complex<f64>;

impl Decode for bool {
    fn zero() -> Self {
        false
    }

    fn structure(_builder: &mut Builder<'_>) -> Result<Plan<Self>> {
        Ok(Plan::new(|reader, dest: &mut Self| {
            *dest = reader.read_packed_bool()?;
            Ok(())
        }))
    }
}

impl Encode for bool {
    fn encode(&self, writer: &mut Writer<'_>) -> Result<()> {
        writer.write_packed_bool(*self);
        Ok(())
    }
}

macro_rules! impl_le_bytes {
    ($($Ty:ty = $zero:expr),* $(,)?) => { $(
        impl Decode for $Ty {
            fn zero() -> Self {
                $zero
            }

            fn structure(_builder: &mut Builder<'_>) -> Result<Plan<Self>> {
                Ok(Plan::new(|reader, dest: &mut Self| {
                    *dest = <$Ty>::from_le_bytes(reader.read_bytes()?);
                    Ok(())
                }))
            }
        }

        impl Encode for $Ty {
            fn encode(&self, writer: &mut Writer<'_>) -> Result<()> {
                writer.write_bytes(&self.to_le_bytes());
                Ok(())
            }
        }
    )* };
}

macro_rules! impl_leb128 {
    ($($Ty:ty)*) => { $(
        impl Decode for $Ty {
            fn zero() -> Self {
                0
            }

            fn structure(_builder: &mut Builder<'_>) -> Result<Plan<Self>> {
                Ok(Plan::new(|reader, dest: &mut Self| {
                    *dest = reader.read_leb128()?;
                    Ok(())
                }))
            }
        }

        impl Encode for $Ty {
            fn encode(&self, writer: &mut Writer<'_>) -> Result<()> {
                writer.write_leb128(*self);
                Ok(())
            }
        }
    )* };
}

macro_rules! impl_byte {
    ($($Ty:ty),*) => { $(
        impl Decode for $Ty {
            fn zero() -> Self {
                0
            }

            fn structure(_builder: &mut Builder<'_>) -> Result<Plan<Self>> {
                Ok(Plan::new(|reader, dest: &mut Self| {
                    *dest = <$Ty>::from_le_bytes(reader.read_bytes()?);
                    Ok(())
                }))
            }
        }

        impl Encode for $Ty {
            fn encode(&self, writer: &mut Writer<'_>) -> Result<()> {
                let [byte] = self.to_le_bytes();
                writer.write_byte(byte);
                Ok(())
            }
        }
    )* };
}

impl_byte!(u8, i8);
impl_le_bytes!(f32 = 0.0, f64 = 0.0);
impl_leb128!(u16 u32 u64 u128 usize i16 i32 i64 i128 isize);

impl Decode for char {
    fn zero() -> Self {
        '\0'
    }

    fn structure(_builder: &mut Builder<'_>) -> Result<Plan<Self>> {
        Ok(Plan::new(|reader, dest: &mut Self| {
            let code: u32 = reader.read_leb128()?;
            *dest = Self::from_u32(code).ok_or(Error::InvalidChar)?;
            Ok(())
        }))
    }
}

impl Encode for char {
    fn encode(&self, writer: &mut Writer<'_>) -> Result<()> {
        writer.write_leb128(u32::from(*self));
        Ok(())
    }
}

macro_rules! impl_complex {
    ($($Ty:ty),*) => { $(
        impl Decode for Complex<$Ty> {
            fn zero() -> Self {
                Self::default()
            }

            fn structure(_builder: &mut Builder<'_>) -> Result<Plan<Self>> {
                Ok(Plan::new(|reader, dest: &mut Self| {
                    dest.re = <$Ty>::from_le_bytes(reader.read_bytes()?);
                    dest.im = <$Ty>::from_le_bytes(reader.read_bytes()?);
                    Ok(())
                }))
            }
        }

        impl Encode for Complex<$Ty> {
            fn encode(&self, writer: &mut Writer<'_>) -> Result<()> {
                writer.write_bytes(&self.re.to_le_bytes());
                writer.write_bytes(&self.im.to_le_bytes());
                Ok(())
            }
        }
    )* };
}

impl_complex!(f32, f64);

impl Decode for String {
    fn zero() -> Self {
        Self::new()
    }

    fn structure(_builder: &mut Builder<'_>) -> Result<Plan<Self>> {
        Ok(Plan::new(|reader, dest: &mut Self| {
            let value = reader.read_str()?;
            dest.clear();
            dest.push_str(value);
            Ok(())
        }))
    }
}

impl Encode for str {
    fn encode(&self, writer: &mut Writer<'_>) -> Result<()> {
        writer.write_str(self);
        Ok(())
    }
}

impl Encode for String {
    fn encode(&self, writer: &mut Writer<'_>) -> Result<()> {
        writer.write_str(self);
        Ok(())
    }
}

impl Decode for Bytes {
    fn zero() -> Self {
        Self::new()
    }

    fn structure(_builder: &mut Builder<'_>) -> Result<Plan<Self>> {
        Ok(Plan::new(|reader, dest: &mut Self| {
            if !reader.read_packed_bool()? {
                dest.clear();
                return Ok(());
            }

            let len = reader.read_length()?;
            *dest = Self::copy_from_slice(reader.read_slice(len)?);
            Ok(())
        }))
    }
}

impl Encode for Bytes {
    fn encode(&self, writer: &mut Writer<'_>) -> Result<()> {
        writer.write_packed_bool(!self.is_empty());
        if !self.is_empty() {
            writer.write_length(self.len());
            writer.write_bytes(self);
        }

        Ok(())
    }
}

impl Decode for () {
    fn zero() -> Self {}

    fn structure(_builder: &mut Builder<'_>) -> Result<Plan<Self>> {
        Ok(Plan::discard())
    }
}

impl Encode for () {
    fn encode(&self, _writer: &mut Writer<'_>) -> Result<()> {
        Ok(())
    }
}

impl<T: ?Sized + 'static> Decode for PhantomData<T> {
    fn zero() -> Self {
        Self
    }

    fn structure(_builder: &mut Builder<'_>) -> Result<Plan<Self>> {
        Ok(Plan::discard())
    }
}

impl<T: ?Sized> Encode for PhantomData<T> {
    fn encode(&self, _writer: &mut Writer<'_>) -> Result<()> {
        Ok(())
    }
}
