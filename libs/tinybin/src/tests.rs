// round trips for every shape, plus the layout and reuse guarantees the
// decoder makes about destinations it is handed
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::marker::PhantomData;
use std::sync::mpsc;

use bytes::Bytes;

use super::*;
use crate::overrides::{BinaryMarshal, NativeCodec, Record};

fn round_trip<T>(engine: &Engine, value: &T) -> Vec<u8>
where
    T: Decode + Encode + PartialEq + fmt::Debug,
{
    let buf = engine.encode(value).expect("encoding must work");
    let (rev, read) = engine
        .decode_value::<T>(&buf)
        .expect("decoding must work");
    assert_eq!(*value, rev, "round trip messed up data");
    assert_eq!(read, buf.len(), "must consume the whole buffer");
    buf
}

#[derive(Debug, Clone, PartialEq, Decode, Encode)]
struct Simple {
    a: i32,
    b: String,
}

#[derive(Debug, Clone, PartialEq, Decode, Encode)]
struct Point {
    x: i64,
    y: i64,
    label: String,
}

#[derive(Debug, Clone, PartialEq, Decode, Encode)]
struct Node {
    value: u32,
    next: Option<Box<Node>>,
}

#[derive(Debug, Clone, PartialEq, Decode, Encode)]
struct Tree {
    label: String,
    children: Vec<Tree>,
}

#[derive(Debug, Clone, PartialEq, Decode, Encode)]
struct Left {
    right: Option<Box<Right>>,
}

#[derive(Debug, Clone, PartialEq, Decode, Encode)]
struct Right {
    lefts: Vec<Left>,
    id: u8,
}

#[derive(Debug, Clone, PartialEq, Decode, Encode)]
struct Empty {}

fn chain(depth: u32) -> Node {
    let mut node = Node {
        value: 0,
        next: None,
    };

    for value in 1..=depth {
        node = Node {
            value,
            next: Some(Box::new(node)),
        };
    }

    node
}

fn chain_len(node: &Node) -> u32 {
    let mut len = 0;
    let mut next = node.next.as_deref();
    while let Some(node) = next {
        len += 1;
        next = node.next.as_deref();
    }
    len
}

fn sample_tree() -> Tree {
    let leaf = |label: &str| Tree {
        label: label.to_owned(),
        children: Vec::new(),
    };

    Tree {
        label: "root".to_owned(),
        children: vec![
            leaf("a"),
            Tree {
                label: "b".to_owned(),
                children: vec![leaf("b1"), leaf("b2")],
            },
        ],
    }
}

#[test]
fn simple_struct_layout() {
    let engine = Engine::new();
    let value = Simple {
        a: 5,
        b: "hi".to_owned(),
    };

    let buf = round_trip(&engine, &value);
    assert_eq!(buf, [0x0A, 0x02, b'h', b'i'], "unexpected layout");
}

#[test]
fn round_trip_scalars() {
    let engine = Engine::new();

    round_trip(&engine, &true);
    round_trip(&engine, &0xABu8);
    round_trip(&engine, &-100i8);
    round_trip(&engine, &u16::MAX);
    round_trip(&engine, &i32::MIN);
    round_trip(&engine, &u64::MAX);
    round_trip(&engine, &i128::MIN);
    round_trip(&engine, &usize::MAX);
    round_trip(&engine, &-1isize);
    round_trip(&engine, &1.5f32);
    round_trip(&engine, &-0.25f64);
    round_trip(&engine, &'ß');
    round_trip(&engine, &Complex64::new(1.0, -2.0));
    round_trip(&engine, &Complex32::new(0.5, 4.0));
    round_trip(&engine, &"text".to_owned());
    round_trip(&engine, &());
    round_trip(&engine, &PhantomData::<String>);
    round_trip(&engine, &Empty {});
}

#[test]
fn scalar_layout() {
    let engine = Engine::new();

    assert_eq!(round_trip(&engine, &0xABu8), [0xAB], "u8 is a raw byte");
    assert_eq!(round_trip(&engine, &-1i8), [0xFF], "i8 is a raw byte");
    assert_eq!(round_trip(&engine, &300u16), [0xAC, 0x02], "u16 is leb128");
    assert_eq!(round_trip(&engine, &-3i32), [0x05], "i32 is zigzag leb128");
    assert_eq!(
        round_trip(&engine, &1.0f32),
        1.0f32.to_le_bytes(),
        "f32 is little-endian"
    );
    assert_eq!(round_trip(&engine, &()), [0u8; 0], "unit has no data");
    assert_eq!(round_trip(&engine, &Empty {}), [0u8; 0], "empty struct has no data");
}

#[test]
fn packed_bools_share_bytes() {
    let engine = Engine::new();

    // the first bool claims the byte at the cursor, the u8 follows it, and the
    // last bool reuses the claimed byte
    let value = (true, false, true, 7u8, true);
    let buf = round_trip(&engine, &value);
    assert_eq!(buf, [0b1101, 0x07], "unexpected bool packing");

    let buf = round_trip(&engine, &[true; 9]);
    assert_eq!(buf, [0xFF, 0x01], "ninth bool must claim a new byte");
}

#[test]
fn round_trip_containers() {
    let engine = Engine::new();

    round_trip(&engine, &Some(42u32));
    round_trip(&engine, &None::<u32>);
    round_trip(&engine, &Box::new(-7i16));
    round_trip(&engine, &[1u16, 2, 3]);
    round_trip(&engine, &vec!["a".to_owned(), "bc".to_owned()]);
    round_trip(&engine, &Vec::<u8>::new());
    round_trip(&engine, &Bytes::from_static(b"\x00\x01\x02"));
    round_trip(&engine, &Bytes::new());
    round_trip(&engine, &(1u8, "two".to_owned(), 3.0f64));
    round_trip(
        &engine,
        &HashMap::from([(1u32, "one".to_owned()), (2, "two".to_owned())]),
    );
    round_trip(&engine, &BTreeMap::from([('a', vec![1i64]), ('b', vec![])]));
    round_trip(&engine, &HashMap::<String, u8>::new());
}

#[test]
fn absence_clears_destination() {
    let engine = Engine::new();

    let buf = engine.encode(&None::<Vec<u32>>).expect("encoding must work");
    let mut dest = Some(vec![1u32, 2, 3]);
    engine.decode(&buf, &mut dest).expect("decoding must work");
    assert_eq!(dest, None, "absent option must clear");

    let buf = engine.encode(&Vec::<u32>::new()).expect("encoding must work");
    assert_eq!(buf, [0x00], "empty sequence is written as absent");
    let mut dest = vec![1u32, 2, 3];
    engine.decode(&buf, &mut dest).expect("decoding must work");
    assert!(dest.is_empty(), "absent sequence must clear");

    let buf = engine
        .encode(&HashMap::<u8, u8>::new())
        .expect("encoding must work");
    let mut dest = HashMap::from([(1u8, 1u8)]);
    engine.decode(&buf, &mut dest).expect("decoding must work");
    assert!(dest.is_empty(), "absent map must clear");

    let buf = engine.encode(&Bytes::new()).expect("encoding must work");
    let mut dest = Bytes::from_static(b"stale");
    engine.decode(&buf, &mut dest).expect("decoding must work");
    assert!(dest.is_empty(), "absent bytes must clear");

    let buf = engine.encode(&Dynamic::empty()).expect("encoding must work");
    let mut dest = Dynamic::new(5u32);
    engine.decode(&buf, &mut dest).expect("decoding must work");
    assert!(dest.is_empty(), "absent dynamic value must clear");
}

#[test]
fn length_prefix_does_not_drive_allocation() {
    // present, then a length of exactly the default limit, then nothing
    const BUF: [u8; 5] = [0x01, 0x80, 0x80, 0x80, 0x08];

    fn is_eof(err: &Error) -> bool {
        matches!(err, Error::Io(e) if e.kind() == std::io::ErrorKind::UnexpectedEof)
    }

    let engine = Engine::new();

    let mut dest = Vec::<u64>::new();
    let err = engine
        .decode(&BUF, &mut dest)
        .expect_err("missing elements must fail");
    assert!(is_eof(&err), "wrong error: {err:?}");
    assert!(dest.capacity() <= 8, "allocation must be bounded by the input");

    let err = engine
        .decode_value::<Vec<[u64; 1024]>>(&BUF)
        .expect_err("missing elements must fail");
    assert!(is_eof(&err), "wrong error: {err:?}");

    let mut dest = HashMap::<u64, u64>::new();
    let err = engine
        .decode(&BUF, &mut dest)
        .expect_err("missing entries must fail");
    assert!(is_eof(&err), "wrong error: {err:?}");
    assert!(dest.capacity() < 1024, "reservation must be bounded by the input");

    let err = engine
        .decode_value::<HashMap<u32, [u64; 1024]>>(&BUF)
        .expect_err("missing entries must fail");
    assert!(is_eof(&err), "wrong error: {err:?}");

    // a valid sequence of zero-sized elements still decodes in full
    let buf = engine
        .encode(&vec![(); 100])
        .expect("encoding must work");
    let (rev, _) = engine
        .decode_value::<Vec<()>>(&buf)
        .expect("decoding must work");
    assert_eq!(rev.len(), 100, "wrong length");
}

#[test]
fn present_option_reuses_value() {
    let engine = Engine::new();

    let buf = engine
        .encode(&Some("ab".to_owned()))
        .expect("encoding must work");

    let mut dest = Some(String::with_capacity(64));
    engine.decode(&buf, &mut dest).expect("decoding must work");
    let inner = dest.expect("must be present");
    assert_eq!(inner, "ab", "wrong value");
    assert_eq!(inner.capacity(), 64, "existing string must be reused");
}

#[test]
fn sequence_reuses_storage() {
    let engine = Engine::new();
    let buf = engine.encode(&vec![1u32, 2]).expect("encoding must work");

    let mut dest = Vec::with_capacity(16);
    dest.extend([9u32, 9, 9]);
    let ptr = dest.as_ptr();

    engine.decode(&buf, &mut dest).expect("decoding must work");
    assert_eq!(dest, [1, 2], "wrong elements");
    assert_eq!(dest.as_ptr(), ptr, "storage must be kept");
    assert_eq!(dest.capacity(), 16, "capacity must be kept");
}

#[test]
fn sequence_grows_storage() {
    let engine = Engine::new();
    let buf = engine
        .encode(&vec![1u32, 2, 3, 4, 5])
        .expect("encoding must work");

    let mut dest = vec![9u32];
    engine.decode(&buf, &mut dest).expect("decoding must work");
    assert_eq!(dest, [1, 2, 3, 4, 5], "wrong elements");
    assert!(dest.capacity() >= 5, "storage must fit all elements");
}

#[test]
fn map_drops_stale_entries() {
    let engine = Engine::new();
    let buf = engine
        .encode(&HashMap::from([(1u8, 10u8), (2, 20)]))
        .expect("encoding must work");

    let mut dest = HashMap::from([(2u8, 0u8), (3, 30)]);
    engine.decode(&buf, &mut dest).expect("decoding must work");
    assert_eq!(
        dest,
        HashMap::from([(1, 10), (2, 20)]),
        "only decoded entries may remain"
    );
}

#[test]
fn recursive_chains() {
    let engine = Engine::new();

    for depth in [0, 1, 10] {
        let node = chain(depth);
        round_trip(&engine, &node);
        assert_eq!(chain_len(&node), depth, "chain built wrong");
    }

    // deep recursion needs more stack than test threads get by default
    let deep = std::thread::Builder::new()
        .stack_size(32 << 20)
        .spawn(move || {
            let node = chain(1000);
            let buf = round_trip(&engine, &node);
            let (rev, _) = engine
                .decode_value::<Node>(&buf)
                .expect("decoding must work");
            chain_len(&rev)
        })
        .expect("thread can be spawned")
        .join()
        .expect("thread must not panic");

    assert_eq!(deep, 1000, "all nodes must be decoded");
}

#[test]
fn recursive_types() {
    let engine = Engine::new();
    round_trip(&engine, &sample_tree());

    let value = Left {
        right: Some(Box::new(Right {
            lefts: vec![
                Left { right: None },
                Left {
                    right: Some(Box::new(Right {
                        lefts: Vec::new(),
                        id: 2,
                    })),
                },
            ],
            id: 1,
        })),
    };
    round_trip(&engine, &value);
}

#[test]
fn recursive_strategy_is_usable_alone() {
    let engine = Engine::new();
    let strategy = engine.strategy::<Node>().expect("node is decodable");
    assert!(!strategy.is_deferred(), "top-level strategies are bound");

    // the inner option was compiled as part of the node and refers back to it
    let inner = engine
        .strategy::<Option<Box<Node>>>()
        .expect("inner option is decodable");

    let buf = engine
        .encode(&Some(Box::new(chain(3))))
        .expect("encoding must work");
    let mut reader = Reader::new(&buf, &engine);
    let mut dest = None;
    inner.decode(&mut reader, &mut dest).expect("decoding must work");
    assert_eq!(dest.as_deref(), Some(&chain(3)), "wrong value");
    assert_eq!(reader.position(), buf.len(), "must consume the whole buffer");
}

#[test]
fn concurrent_compilation_is_idempotent() {
    let reference = Engine::new();
    reference.strategy::<Tree>().expect("tree is decodable");
    let expected = reference.cache_len();

    let engine = Engine::new();
    let tree = sample_tree();
    let buf = engine.encode(&tree).expect("encoding must work");

    std::thread::scope(|s| {
        for _ in 0..8 {
            s.spawn(|| {
                let (rev, read) = engine
                    .decode_value::<Tree>(&buf)
                    .expect("decoding must work");
                assert_eq!(rev, tree, "concurrent decode messed up data");
                assert_eq!(read, buf.len(), "must consume the whole buffer");
            });
        }
    });

    assert_eq!(engine.cache_len(), expected, "strategies must be cached once");

    engine.strategy::<Tree>().expect("tree is decodable");
    assert_eq!(engine.cache_len(), expected, "cache hits must not add entries");
}

#[test]
fn decoder_is_reusable() {
    let engine = Engine::new();
    let decoder = engine
        .decoder::<(&mut u32, &mut String, &mut bool)>()
        .expect("targets are decodable");

    assert_eq!(
        decoder.targets().collect::<Vec<_>>(),
        ["u32", "alloc::string::String", "bool"],
        "wrong target names"
    );

    for (n, s, b) in [(1u32, "x", true), (300, "yz", false)] {
        let mut buf = engine
            .encode((&n, &s.to_owned(), &b))
            .expect("encoding must work");
        let len = buf.len();
        buf.extend_from_slice(b"trailing");

        let (mut rn, mut rs, mut rb) = (0u32, String::new(), false);
        let read = decoder
            .decode(&buf, (&mut rn, &mut rs, &mut rb))
            .expect("decoding must work");

        assert_eq!((rn, rs.as_str(), rb), (n, s, b), "wrong values");
        assert_eq!(read, len, "must not consume trailing data");
    }
}

#[test]
fn decoder_usage_errors() {
    let engine = Engine::new();

    let err = Decoder::new(&engine, &[]).expect_err("no targets must fail");
    assert!(matches!(err, Error::NoTargets), "wrong error: {err:?}");
    assert!(err.is_usage(), "must be a usage error");

    let decoder = Decoder::new(
        &engine,
        &[TypeDescriptor::of::<u32>(), TypeDescriptor::of::<String>()],
    )
    .expect("targets are decodable");

    let buf = engine
        .encode((&5u32, &"s".to_owned()))
        .expect("encoding must work");

    let mut n = 0u32;
    let err = decoder
        .decode_values(&buf, &mut [&mut n])
        .expect_err("missing target must fail");
    assert!(
        matches!(err, Error::TargetCount { expected: 2, actual: 1 }),
        "wrong error: {err:?}"
    );

    let mut wrong = 0u64;
    let mut s = String::new();
    let err = decoder
        .decode_values(&buf, &mut [&mut wrong, &mut s])
        .expect_err("mistyped target must fail");
    assert!(
        matches!(err, Error::TargetMismatch { expected: "u32" }),
        "wrong error: {err:?}"
    );

    let read = decoder
        .decode_values(&buf, &mut [&mut n, &mut s])
        .expect("matching targets must work");
    assert_eq!((n, s.as_str(), read), (5, "s", buf.len()), "wrong values");
}

#[test]
fn malformed_input() {
    let engine = Engine::new();

    let err = engine
        .decode_value::<String>(&[0x05, b'a'])
        .expect_err("truncated input must fail");
    assert!(
        matches!(&err, Error::Io(e) if e.kind() == std::io::ErrorKind::UnexpectedEof),
        "wrong error: {err:?}"
    );
    assert!(err.is_data(), "must be a data error");

    let err = engine
        .decode_value::<String>(&[0x02, 0xFF, 0xFE])
        .expect_err("invalid utf-8 must fail");
    assert!(matches!(err, Error::InvalidUtf8), "wrong error: {err:?}");

    let mut buf = Vec::new();
    leb128::write(&mut buf, 0xD800u32);
    let err = engine
        .decode_value::<char>(&buf)
        .expect_err("surrogate must fail");
    assert!(matches!(err, Error::InvalidChar), "wrong error: {err:?}");

    let err = engine
        .decode_value::<bool>(&[])
        .expect_err("missing bool byte must fail");
    assert!(err.is_data(), "wrong error: {err:?}");
}

#[test]
fn length_limit() {
    let engine = Engine::with_config(EngineConfig { max_length: 4 });

    let buf = engine
        .encode(&"hello".to_owned())
        .expect("encoding is not limited");
    let err = engine
        .decode_value::<String>(&buf)
        .expect_err("long string must fail");
    assert!(
        matches!(err, Error::LengthLimit { len: 5, max: 4 }),
        "wrong error: {err:?}"
    );

    round_trip(&engine, &"four".to_owned());
}

#[test]
fn unsupported_kinds_publish_nothing() {
    #[derive(Debug, Decode, Encode)]
    struct WithChannel {
        id: u32,
        tx: mpsc::Sender<u8>,
    }

    let engine = Engine::new();
    let err = engine
        .strategy::<WithChannel>()
        .expect_err("channels cannot be decoded");
    assert!(
        matches!(err, Error::Unsupported { kind: "channel", .. }),
        "wrong error: {err:?}"
    );
    assert!(err.is_usage(), "must be a usage error");
    assert_eq!(engine.cache_len(), 0, "failed compilation must not publish");

    let err = engine
        .decoder::<&mut mpsc::Receiver<u8>>()
        .expect_err("channels cannot be decoded");
    assert!(matches!(err, Error::Unsupported { .. }), "wrong error: {err:?}");

    let value = WithChannel {
        id: 1,
        tx: mpsc::channel().0,
    };
    let err = engine.encode(&value).expect_err("channels cannot be encoded");
    assert!(matches!(err, Error::Unsupported { .. }), "wrong error: {err:?}");

    // unrelated types still work afterwards
    round_trip(&engine, &5u32);
    assert_eq!(engine.cache_len(), 1, "only u32 must be cached");
}

#[test]
fn prewarm_compiles_ahead() {
    let engine = Engine::new();
    engine
        .prewarm(&[TypeDescriptor::of::<Point>(), TypeDescriptor::of::<u8>()])
        .expect("types are decodable");

    let cached = engine.cache_len();
    assert_eq!(cached, 4, "point, its two field types and u8 must be cached");

    let strategy = engine
        .erased_strategy(TypeDescriptor::of::<Point>())
        .expect("point is cached");
    assert!(
        strategy.type_name().ends_with("Point"),
        "wrong type name: {}",
        strategy.type_name()
    );

    round_trip(
        &engine,
        &Point {
            x: 1,
            y: -1,
            label: "p".to_owned(),
        },
    );
    assert_eq!(engine.cache_len(), cached, "no further compilation");
}

#[test]
fn dynamic_round_trip() {
    let engine = Engine::new();
    engine.register::<Point>("point").expect("name is free");
    engine.register::<u32>("u32").expect("name is free");

    round_trip(&engine, &Dynamic::empty());
    round_trip(&engine, &Dynamic::new(7u32));

    let buf = round_trip(
        &engine,
        &Dynamic::new(Point {
            x: 2,
            y: 3,
            label: String::new(),
        }),
    );
    assert_eq!(
        buf,
        [0x01, 0x05, b'p', b'o', b'i', b'n', b't', 0x04, 0x06, 0x00],
        "unexpected dynamic layout"
    );

    let list = vec![Dynamic::new(1u32), Dynamic::empty(), Dynamic::new(2u32)];
    round_trip(&engine, &list);
}

#[test]
fn dynamic_reuses_same_type() {
    let engine = Engine::new();
    engine.register::<Point>("point").expect("name is free");
    engine.register::<u32>("u32").expect("name is free");

    let point = Point {
        x: 4,
        y: 5,
        label: "ab".to_owned(),
    };
    let buf = engine
        .encode(&Dynamic::new(point.clone()))
        .expect("encoding must work");

    let mut dest = Dynamic::new(Point {
        x: 0,
        y: 0,
        label: String::with_capacity(64),
    });
    engine.decode(&buf, &mut dest).expect("decoding must work");
    let rev = dest.downcast_ref::<Point>().expect("must hold a point");
    assert_eq!(*rev, point, "wrong value");
    assert_eq!(rev.label.capacity(), 64, "value must be decoded in place");

    let mut dest = Dynamic::new(9u32);
    engine.decode(&buf, &mut dest).expect("decoding must work");
    assert_eq!(dest.downcast_ref::<Point>(), Some(&point), "value must be replaced");
}

#[test]
fn unknown_dynamic_name_leaves_destination() {
    let writer = Engine::new();
    writer.register::<Point>("point").expect("name is free");

    let buf = writer
        .encode(&Dynamic::new(Point {
            x: 1,
            y: 1,
            label: String::new(),
        }))
        .expect("encoding must work");

    let reader = Engine::new();
    let mut dest = Dynamic::new(5u32);
    let err = reader
        .decode(&buf, &mut dest)
        .expect_err("unknown name must fail");

    assert!(
        matches!(&err, Error::UnknownDynamicType(name) if name == "point"),
        "wrong error: {err:?}"
    );
    assert_eq!(dest.downcast_ref::<u32>(), Some(&5), "destination must be untouched");
}

#[test]
fn dynamic_registration() {
    let engine = Engine::new();
    engine.register::<Point>("point").expect("name is free");
    engine
        .register::<Point>("point")
        .expect("same registration is a no-op");

    let err = engine
        .register::<u32>("point")
        .expect_err("name is taken");
    assert!(
        matches!(&err, Error::DuplicateName { name, .. } if name == "point"),
        "wrong error: {err:?}"
    );

    engine
        .registry()
        .register_default::<u32>()
        .expect("name is free");
    let ty = engine
        .registry()
        .lookup("u32")
        .expect("default name is the type name");
    assert_eq!(ty.descriptor(), TypeDescriptor::of::<u32>(), "wrong type");
    assert_eq!(ty.zero_value().type_name(), "u32", "wrong zero value");

    let err = engine
        .encode(&Dynamic::new(1.5f32))
        .expect_err("unregistered type must fail");
    assert!(
        matches!(err, Error::UnregisteredType("f32")),
        "wrong error: {err:?}"
    );
}

#[derive(Debug, Default, Clone, PartialEq, Decode, Encode)]
#[tinybin(record, binary, native)]
struct Celsius(i16);

impl Record for Celsius {
    fn encode_record(&self) -> Result<Vec<u8>, error::BoxError> {
        Ok(self.0.to_string().into_bytes())
    }

    fn decode_record(&mut self, data: &[u8]) -> Result<(), error::BoxError> {
        self.0 = std::str::from_utf8(data)?.parse()?;
        Ok(())
    }
}

impl BinaryMarshal for Celsius {
    fn marshal_binary(&self) -> Result<Vec<u8>, error::BoxError> {
        Ok(self.0.to_be_bytes().to_vec())
    }

    fn unmarshal_binary(&mut self, data: &[u8]) -> Result<(), error::BoxError> {
        self.0 = i16::from_be_bytes(data.try_into()?);
        Ok(())
    }
}

impl NativeCodec for Celsius {
    fn encode_native(&self, out: &mut Vec<u8>) -> Result<(), error::BoxError> {
        out.push(0xC0);
        out.extend_from_slice(&self.0.to_le_bytes());
        Ok(())
    }

    fn decode_native(&mut self, data: &[u8]) -> Result<usize, error::BoxError> {
        match data {
            [0xC0, lo, hi, ..] => {
                self.0 = i16::from_le_bytes([*lo, *hi]);
                Ok(3)
            },
            _ => Err("missing native marker".into()),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Decode, Encode)]
#[tinybin(record)]
struct Version {
    major: u8,
    minor: u8,
}

impl Record for Version {
    fn encode_record(&self) -> Result<Vec<u8>, error::BoxError> {
        Ok(format!("{}.{}", self.major, self.minor).into_bytes())
    }

    fn decode_record(&mut self, data: &[u8]) -> Result<(), error::BoxError> {
        let text = std::str::from_utf8(data)?;
        let (major, minor) = text.split_once('.').ok_or("missing dot")?;
        self.major = major.parse()?;
        self.minor = minor.parse()?;
        Ok(())
    }
}

#[test]
fn capability_precedence() {
    let engine = Engine::new();

    let buf = round_trip(&engine, &Celsius(-300));
    let [lo, hi] = (-300i16).to_le_bytes();
    assert_eq!(buf, [0xC0, lo, hi], "native codec must win");

    let buf = round_trip(&engine, &Version { major: 1, minor: 2 });
    assert_eq!(buf, [0x03, b'1', b'.', b'2'], "record must be length-prefixed");

    // capabilities compose with structural decoding around them
    round_trip(
        &engine,
        &(vec![Celsius(1), Celsius(2)], Some(Version { major: 3, minor: 4 })),
    );
}

#[test]
fn capability_errors_propagate() {
    let engine = Engine::new();

    let err = engine
        .decode_value::<Celsius>(&[0x00, 0x01, 0x02])
        .expect_err("native codec must reject the data");
    assert!(
        matches!(err, Error::Capability { .. }),
        "wrong error: {err:?}"
    );
    assert!(err.is_data(), "must be a data error");

    let err = engine
        .decode_value::<Version>(&[0x02, b'1', b'2'])
        .expect_err("record must reject the data");
    assert!(
        matches!(err, Error::Capability { .. }),
        "wrong error: {err:?}"
    );

    // the native codec may not claim more than the input holds
    #[derive(Debug)]
    struct Greedy;
    impl NativeCodec for Greedy {
        fn encode_native(&self, _out: &mut Vec<u8>) -> Result<(), error::BoxError> {
            Ok(())
        }

        fn decode_native(&mut self, data: &[u8]) -> Result<usize, error::BoxError> {
            Ok(data.len() + 1)
        }
    }

    impl Decode for Greedy {
        fn zero() -> Self {
            Self
        }

        fn overrides() -> overrides::Overrides<Self> {
            overrides::Overrides::none().with_native()
        }

        fn structure(builder: &mut Builder<'_>) -> Result<Plan<Self>> {
            builder.unsupported("test type")
        }
    }

    let err = engine
        .decode_value::<Greedy>(&[0x01])
        .expect_err("overlong claim must fail");
    assert!(err.is_data(), "wrong error: {err:?}");
}

#[test]
fn global_functions() {
    #[derive(Debug, Clone, PartialEq, Decode, Encode)]
    struct GlobalOnly {
        value: u16,
    }

    register::<GlobalOnly>("tests::GlobalOnly").expect("name is free");

    let value = Dynamic::new(GlobalOnly { value: 500 });
    let buf = encode((&value, &7u8)).expect("encoding must work");

    let mut rev = Dynamic::empty();
    let mut byte = 0u8;
    let read = decode(&buf, (&mut rev, &mut byte)).expect("decoding must work");
    assert_eq!((rev, byte, read), (value, 7, buf.len()), "wrong values");
}

#[test]
fn config_from_toml() {
    let config: EngineConfig = toml::from_str("max_length = 1024").expect("valid config");
    assert_eq!(config.max_length, 1024, "wrong max length");

    let config: EngineConfig = toml::from_str("").expect("empty config is valid");
    assert_eq!(config, EngineConfig::default(), "missing fields use defaults");
    assert_eq!(config.max_length, config::DEFAULT_MAX_LENGTH, "wrong default");
}
