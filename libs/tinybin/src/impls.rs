//! Containers, tuples and types without data.

use std::collections::{BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};
use std::sync::mpsc;

use crate::builder::Builder;
use crate::de::Decode;
use crate::error::{Error, Result};
use crate::ser::{Encode, Writer};
use crate::strategy::Plan;

impl<E: Decode> Decode for Option<E> {
    fn zero() -> Self {
        None
    }

    fn structure(builder: &mut Builder<'_>) -> Result<Plan<Self>> {
        builder.optional::<E>()
    }
}

impl<E: Encode> Encode for Option<E> {
    fn encode(&self, writer: &mut Writer<'_>) -> Result<()> {
        writer.write_packed_bool(self.is_some());
        match self {
            Some(value) => value.encode(writer),
            None => Ok(()),
        }
    }
}

impl<E: Decode> Decode for Box<E> {
    fn zero() -> Self {
        Self::new(E::zero())
    }

    fn structure(builder: &mut Builder<'_>) -> Result<Plan<Self>> {
        builder.boxed::<E>()
    }
}

impl<E: Encode + ?Sized> Encode for Box<E> {
    fn encode(&self, writer: &mut Writer<'_>) -> Result<()> {
        (**self).encode(writer)
    }
}

impl<E: Decode, const N: usize> Decode for [E; N] {
    fn zero() -> Self {
        std::array::from_fn(|_| E::zero())
    }

    fn structure(builder: &mut Builder<'_>) -> Result<Plan<Self>> {
        builder.array::<E, N>()
    }
}

impl<E: Encode, const N: usize> Encode for [E; N] {
    fn encode(&self, writer: &mut Writer<'_>) -> Result<()> {
        for item in self {
            item.encode(writer)?;
        }

        Ok(())
    }
}

impl<E: Decode> Decode for Vec<E> {
    fn zero() -> Self {
        Self::new()
    }

    fn structure(builder: &mut Builder<'_>) -> Result<Plan<Self>> {
        builder.sequence::<E>()
    }
}

impl<E: Encode> Encode for Vec<E> {
    fn encode(&self, writer: &mut Writer<'_>) -> Result<()> {
        self.as_slice().encode(writer)
    }
}

/// Encoded like [`Vec`]. An empty slice is written as absent.
impl<E: Encode> Encode for [E] {
    fn encode(&self, writer: &mut Writer<'_>) -> Result<()> {
        writer.write_packed_bool(!self.is_empty());
        if self.is_empty() {
            return Ok(());
        }

        writer.write_length(self.len());
        for item in self {
            item.encode(writer)?;
        }

        Ok(())
    }
}

impl<K, V, S> Decode for HashMap<K, V, S>
where
    K: Decode + Eq + Hash,
    V: Decode,
    S: BuildHasher + Default + 'static,
{
    fn zero() -> Self {
        Self::default()
    }

    fn structure(builder: &mut Builder<'_>) -> Result<Plan<Self>> {
        builder.map::<Self>()
    }
}

impl<K: Encode, V: Encode, S> Encode for HashMap<K, V, S> {
    fn encode(&self, writer: &mut Writer<'_>) -> Result<()> {
        encode_map(writer, self.len(), self.iter())
    }
}

impl<K: Decode + Ord, V: Decode> Decode for BTreeMap<K, V> {
    fn zero() -> Self {
        Self::new()
    }

    fn structure(builder: &mut Builder<'_>) -> Result<Plan<Self>> {
        builder.map::<Self>()
    }
}

impl<K: Encode, V: Encode> Encode for BTreeMap<K, V> {
    fn encode(&self, writer: &mut Writer<'_>) -> Result<()> {
        encode_map(writer, self.len(), self.iter())
    }
}

fn encode_map<'a, K, V>(
    writer: &mut Writer<'_>,
    len: usize,
    entries: impl Iterator<Item = (&'a K, &'a V)>,
) -> Result<()>
where
    K: Encode + 'a,
    V: Encode + 'a,
{
    writer.write_packed_bool(len != 0);
    if len == 0 {
        return Ok(());
    }

    writer.write_length(len);
    for (key, value) in entries {
        key.encode(writer)?;
        value.encode(writer)?;
    }

    Ok(())
}

macro_rules! impl_tuple {
    ($($T:ident $idx:tt),*) => {
        impl<$($T: Decode),*> Decode for ($($T,)*) {
            fn zero() -> Self {
                ($($T::zero(),)*)
            }

            fn structure(builder: &mut Builder<'_>) -> Result<Plan<Self>> {
                builder
                    .aggregate::<Self>()
                    $( .field::<$T>(|value| &mut value.$idx)? )*
                    .finish()
            }
        }

        impl<$($T: Encode),*> Encode for ($($T,)*) {
            fn encode(&self, writer: &mut Writer<'_>) -> Result<()> {
                $( self.$idx.encode(writer)?; )*
                Ok(())
            }
        }
    };
}

impl_tuple!(A 0);
impl_tuple!(A 0, B 1);
impl_tuple!(A 0, B 1, C 2);
impl_tuple!(A 0, B 1, C 2, D 3);
impl_tuple!(A 0, B 1, C 2, D 3, E 4);
impl_tuple!(A 0, B 1, C 2, D 3, E 4, F 5);
impl_tuple!(A 0, B 1, C 2, D 3, E 4, F 5, G 6);
impl_tuple!(A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7);

const CHANNEL: &str = "channel";

macro_rules! impl_channel {
    ($($Ty:ident => $zero:expr),* $(,)?) => { $(
        impl<T: 'static> Decode for mpsc::$Ty<T> {
            fn zero() -> Self {
                $zero
            }

            fn structure(builder: &mut Builder<'_>) -> Result<Plan<Self>> {
                builder.unsupported(CHANNEL)
            }
        }

        impl<T> Encode for mpsc::$Ty<T> {
            fn encode(&self, _writer: &mut Writer<'_>) -> Result<()> {
                Err(Error::unsupported::<Self>(CHANNEL))
            }
        }
    )* };
}

impl_channel!(
    Sender => mpsc::channel().0,
    Receiver => mpsc::channel().1,
    SyncSender => mpsc::sync_channel(0).0,
);
