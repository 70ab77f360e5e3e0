//! Generic LEB128 variable-length encoding/decoding.
//!
//! Used for lengths and every integer wider than a byte. [`u8`] and [`i8`] are
//! written as single raw bytes instead.
//!
//! See also: <https://en.wikipedia.org/wiki/LEB128>

use std::ops::{BitOrAssign, Shl, Shr, ShrAssign};

use crate::error::{Error, Result, eof};

/// Supports the en-/decoding functions.
///
/// Implemented for unsigned integers.
pub trait Unsigned:
    Sized
    + Default
    + Copy
    + PartialOrd
    + Shr<usize, Output = Self>
    + Shl<usize, Output = Self>
    + ShrAssign<usize>
    + BitOrAssign
    + From<u8>
{
    fn trunc_u8(self) -> u8;
}

/// Declares a type as supporting being encoded in LEB128.
///
/// Signed integers map onto their unsigned counterpart by shifting the value
/// left by one and inverting all bits for negative values, so small magnitudes
/// of either sign stay short.
pub trait Leb128: Sized + Copy {
    type Unsigned: Unsigned;

    fn into_unsigned(self) -> Self::Unsigned;
    fn from_unsigned(value: Self::Unsigned) -> Self;
}

impl<T: Unsigned> Leb128 for T {
    type Unsigned = Self;

    fn into_unsigned(self) -> Self::Unsigned {
        self
    }

    fn from_unsigned(value: Self::Unsigned) -> Self {
        value
    }
}

const fn bitness<T>() -> usize {
    size_of::<T>() * 8
}

/// Appends `x` to `out`.
pub fn write<T: Leb128>(out: &mut Vec<u8>, x: T) {
    let mut x = x.into_unsigned();
    while x >= T::Unsigned::from(0x80) {
        out.push(x.trunc_u8() | 0x80);
        x >>= 7;
    }

    out.push(x.trunc_u8());
}

/// Reads a value from the start of `buf`.
///
/// Returns the value and the amount of bytes it occupied.
pub fn read<T: Leb128>(buf: &[u8]) -> Result<(T, usize)> {
    let mut x = T::Unsigned::default();
    let mut s = 0usize;
    for (i, &b) in buf.iter().enumerate() {
        // ensure the shift isn't greater than the bit-count of `T`
        if s >= bitness::<T::Unsigned>() {
            return Err(Error::IntegerOverflow);
        }

        // ensure that all bits fit into `T`
        let tb = T::Unsigned::from(b & 0x7F);
        let ts = tb << s;
        if ts >> s != tb {
            return Err(Error::IntegerOverflow);
        }

        x |= ts;
        s += 7;

        if b < 0x80 {
            return Ok((T::from_unsigned(x), i + 1));
        }
    }

    Err(eof())
}

macro_rules! impl_unsigned {
    ($($Ty:ty)*) => { $(
        impl Unsigned for $Ty {
            #[allow(clippy::cast_possible_truncation)]
            fn trunc_u8(self) -> u8 {
                self as u8
            }
        }
    )* };
}

macro_rules! impl_signed {
    ($($Ty:ty as $Unsigned:ty),* $(,)?) => { $(
        impl Leb128 for $Ty {
            type Unsigned = $Unsigned;

            #[allow(clippy::cast_sign_loss)]
            fn into_unsigned(self) -> Self::Unsigned {
                let x = (self as $Unsigned) << 1;
                if self < 0 { !x } else { x }
            }

            #[allow(clippy::cast_possible_wrap)]
            fn from_unsigned(value: Self::Unsigned) -> Self {
                let x = value >> 1;
                (if value & 1 != 0 { !x } else { x }) as $Ty
            }
        }
    )* };
}

impl_unsigned!(u16 u32 u64 u128 usize);
impl_signed!(
    i16 as u16,
    i32 as u32,
    i64 as u64,
    i128 as u128,
    isize as usize,
);

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip<T: Leb128 + PartialEq + std::fmt::Debug>(values: &[T]) {
        let mut buf = Vec::new();
        for &v in values {
            buf.clear();
            write(&mut buf, v);

            let (r, len) = read::<T>(&buf).expect("decoding worked");
            assert_eq!(v, r, "must be equal");
            assert_eq!(len, buf.len(), "must consume the whole encoding");
        }
    }

    #[test]
    fn round_trip_unsigned() {
        round_trip(&[500u16, 5000, 0, u16::MAX]);
        round_trip(&[500u32, 500_000_000, 0, u32::MAX]);
        round_trip(&[500u64, 5_000_000_000_000_000_000, 0, u64::MAX]);
        round_trip(&[0u128, 50_000_000_000_000_000_000_000_000_000_000_000_000, u128::MAX]);
        round_trip(&[500usize, 0, usize::MAX]);
    }

    #[test]
    fn round_trip_signed() {
        round_trip(&[500i16, -5000, i16::MIN, i16::MAX]);
        round_trip(&[-500_000_000i32, 500_000, i32::MIN, i32::MAX]);
        round_trip(&[-5_000_000_000_000_000_000i64, 500, i64::MIN, i64::MAX]);
        round_trip(&[-1i128, i128::MIN, i128::MAX]);
        round_trip(&[-5000isize, isize::MIN, isize::MAX]);
    }

    #[test]
    fn small_values_are_one_byte() {
        let mut buf = Vec::new();
        write(&mut buf, 5i32);
        write(&mut buf, -3i32);
        write(&mut buf, 127u32);
        assert_eq!(buf, [0x0A, 0x05, 0x7F], "expected single byte encodings");
    }

    #[test]
    fn overflow() {
        // 3 full groups of 7 bits don't fit into a u16
        let res = read::<u16>(&[0xFF, 0xFF, 0x7F]);
        assert!(
            matches!(res, Err(Error::IntegerOverflow)),
            "expected overflow: {res:?}"
        );
    }

    #[test]
    fn truncated() {
        let res = read::<u32>(&[0x80, 0x80]);
        assert!(
            matches!(res, Err(Error::Io(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof),
            "expected eof"
        );
    }
}
