#![allow(unused_crate_dependencies)]
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

use tinybin::{Decode, Encode, Engine};

fn round_trip<T>(value: &T) -> Vec<u8>
where
    T: Decode + Encode + PartialEq + fmt::Debug,
{
    let engine = Engine::new();
    let buf = engine.encode(value).expect("encoding must work");
    let (rev, read) = engine
        .decode_value::<T>(&buf)
        .expect("decoding must work");
    assert_eq!(*value, rev, "round trip messed up data");
    assert_eq!(read, buf.len(), "must consume the whole buffer");
    buf
}

#[derive(Debug, PartialEq, Decode, Encode)]
struct Unit;

#[derive(Debug, PartialEq, Decode, Encode)]
struct Wrapper(u64);

#[derive(Debug, PartialEq, Decode, Encode)]
struct Pair(i32, String);

#[derive(Debug, PartialEq, Decode, Encode)]
struct Account {
    id: u32,
    name: String,
    verified: bool,
    balances: HashMap<String, i64>,
    friends: Vec<u32>,
}

#[derive(Debug, PartialEq, Decode, Encode)]
struct Generic<T, U> {
    first: T,
    rest: Vec<U>,
    #[tinybin(skip)]
    marker: PhantomData<fn() -> U>,
}

#[derive(Debug, Default, PartialEq)]
struct Scratch(Vec<u8>);

#[derive(Debug, PartialEq, Decode, Encode)]
struct Cached {
    key: String,
    #[tinybin(skip)]
    scratch: Scratch,
    value: u8,
}

#[derive(Debug, PartialEq, Decode, Encode)]
#[tinybin(crate = "tinybin")]
struct CratePath {
    inner: Pair,
}

#[test]
fn unit_and_newtype() {
    assert!(round_trip(&Unit).is_empty(), "unit struct has no data");
    assert_eq!(round_trip(&Wrapper(300)), [0xAC, 0x02], "newtype is its field");
}

#[test]
fn tuple_struct_matches_tuple() {
    let pair = round_trip(&Pair(-2, "x".to_owned()));
    let tuple = round_trip(&(-2i32, "x".to_owned()));
    assert_eq!(pair, tuple, "tuple structs are written like tuples");
}

#[test]
fn named_struct() {
    let account = Account {
        id: 17,
        name: "steph".to_owned(),
        verified: true,
        balances: HashMap::from([("coins".to_owned(), -40), ("gems".to_owned(), 9)]),
        friends: vec![3, 5, 8],
    };

    round_trip(&account);
}

#[test]
fn generic_struct() {
    let value = Generic {
        first: 'q',
        rest: vec![Some(1u8), None],
        marker: PhantomData,
    };

    round_trip(&value);
}

#[test]
fn skipped_fields() {
    let value = Cached {
        key: "k".to_owned(),
        scratch: Scratch::default(),
        value: 9,
    };

    let buf = round_trip(&value);
    assert_eq!(buf, [0x01, b'k', 0x09], "skipped field must not be written");

    let engine = Engine::new();
    let mut dest = Cached {
        key: String::new(),
        scratch: Scratch(vec![1, 2, 3]),
        value: 0,
    };
    engine.decode(&buf, &mut dest).expect("decoding must work");
    assert_eq!(dest.scratch, Scratch(vec![1, 2, 3]), "skipped field must be untouched");
    assert_eq!(Cached::zero().scratch, Scratch::default(), "zero must use the default");
}

#[test]
fn crate_path() {
    round_trip(&CratePath {
        inner: Pair(1, "a".to_owned()),
    });
}
