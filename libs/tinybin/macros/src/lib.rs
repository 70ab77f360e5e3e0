//! Derive macros for the `tinybin` crate.

use proc_macro::TokenStream as StdTokenStream;
use syn::DeriveInput;

mod args;
mod derive_impl;

/// Implements `tinybin::Decode` for a struct.
///
/// Fields are decoded in declaration order. Every type parameter must
/// implement `Decode` as well.
///
/// # Attributes
///
/// On the struct:
///
/// - `#[tinybin(crate = "path")]`: the path to the `tinybin` crate.
/// - `#[tinybin(record)]`, `#[tinybin(binary)]`, `#[tinybin(native)]`: use the
///   type's implementation of `Record`, `BinaryMarshal` or `NativeCodec`
///   instead of its fields. The type must implement [`Default`].
///
/// On fields:
///
/// - `#[tinybin(skip)]`: neither encoded nor decoded. Starts out as
///   [`Default::default`].
#[proc_macro_derive(Decode, attributes(tinybin))]
pub fn derive_decode(input: StdTokenStream) -> StdTokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);
    derive_impl::entry_point_decode(&input)
        .unwrap_or_else(|e| e.write_errors())
        .into()
}

/// Implements `tinybin::Encode` for a struct.
///
/// Accepts the same attributes as [`Decode`](derive@Decode) and writes exactly
/// what it reads.
#[proc_macro_derive(Encode, attributes(tinybin))]
pub fn derive_encode(input: StdTokenStream) -> StdTokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);
    derive_impl::entry_point_encode(&input)
        .unwrap_or_else(|e| e.write_errors())
        .into()
}
