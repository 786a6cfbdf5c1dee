//! Codec Tests - NDR Framing Scenarios
//!
//! These tests exercise the engine end to end through public types:
//! - Conformant arrays at and beyond their declared bound
//! - Declared sizes that overrun the buffer
//! - Breadth-first pointee ordering across nested pointers
//! - The empty/absent ambiguity of nullable strings
//! - Union selector closure
//! - Context handles carried verbatim

mod common;

use std::sync::atomic::Ordering;

use bytes::Bytes;
use common::*;
use dcerpc::{Operation, Outcome, RpcClient, RpcError, Status};
use midl_ndr::{
    decode_from_bytes, encode_to_bytes, ConformantArray, ContextHandle, LpWStr, NdrDecode,
    NdrEncode, NdrError, NdrReader, NdrWString, NdrWriter, UniquePtr, Uuid,
};
use session_service::common::store_syntax;
use session_service::schema::{
    EnumValuesResponse, Name, SetValueRequest, ValueData, ValueInfo, ValueInfoBasic,
    ValueInfoFull, ValueKind,
};

const MAX_COUNTERS: u32 = 524288;

type Counters = ConformantArray<u32, 0, MAX_COUNTERS>;

#[derive(Debug, Default, PartialEq)]
struct CountersResponse {
    values: Counters,
    status: Status,
}

impl NdrEncode for CountersResponse {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> midl_ndr::Result<()> {
        self.values.ndr_encode(w)?;
        self.status.ndr_encode(w)
    }

    fn ndr_align() -> usize {
        4
    }
}

impl NdrDecode for CountersResponse {
    fn ndr_decode<'a>(&'a mut self, r: &mut NdrReader<'a>) -> midl_ndr::Result<()> {
        self.values.ndr_decode(r)?;
        self.status.ndr_decode(r)
    }

    fn ndr_align() -> usize {
        4
    }

    fn ndr_min_size() -> usize {
        8
    }
}

impl Outcome for CountersResponse {
    fn status(&self) -> Status {
        self.status
    }
}

struct ExchangeCounters;

impl Operation for ExchangeCounters {
    const OPNUM: u16 = 0;
    const NAME: &'static str = "/Counters/v1.0/Exchange";
    type Request = Counters;
    type Response = CountersResponse;
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Node {
    value: u32,
    next: UniquePtr<Node>,
}

impl NdrEncode for Node {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> midl_ndr::Result<()> {
        w.write_u32(self.value);
        self.next.ndr_encode(w)
    }

    fn ndr_align() -> usize {
        4
    }
}

impl NdrDecode for Node {
    fn ndr_decode<'a>(&'a mut self, r: &mut NdrReader<'a>) -> midl_ndr::Result<()> {
        self.value = r.read_u32()?;
        self.next.ndr_decode(r)
    }

    fn ndr_align() -> usize {
        4
    }

    fn ndr_min_size() -> usize {
        8
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
struct Pair {
    left: UniquePtr<Node>,
    right: UniquePtr<Node>,
}

impl NdrEncode for Pair {
    fn ndr_encode<'a>(&'a self, w: &mut NdrWriter<'a>) -> midl_ndr::Result<()> {
        self.left.ndr_encode(w)?;
        self.right.ndr_encode(w)
    }

    fn ndr_align() -> usize {
        4
    }
}

impl NdrDecode for Pair {
    fn ndr_decode<'a>(&'a mut self, r: &mut NdrReader<'a>) -> midl_ndr::Result<()> {
        self.left.ndr_decode(r)?;
        self.right.ndr_decode(r)
    }

    fn ndr_align() -> usize {
        4
    }

    fn ndr_min_size() -> usize {
        8
    }
}

fn words(bytes: &[u8]) -> Vec<u32> {
    bytes
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

/// Scenario A: a short array under a large bound survives intact
#[test]
fn test_small_array_under_large_bound() {
    init_logging();

    let values = Counters::bounded(vec![7, 8, 9]);
    let bytes = encode_to_bytes(&values).unwrap();
    assert_eq!(words(&bytes), [3, 7, 8, 9]);

    let decoded: Counters = decode_from_bytes(bytes).unwrap();
    assert_eq!(decoded.elements, [7, 8, 9]);
}

/// Scenario B: one element past the bound fails before anything is sent
#[tokio::test]
async fn test_array_over_bound_is_not_transmitted() {
    init_logging();

    let oversized = Counters::bounded(vec![0; MAX_COUNTERS as usize + 1]);
    let err = encode_to_bytes(&oversized).unwrap_err();
    assert!(matches!(err, NdrError::OutOfRange { len: 524289, max: 524288, .. }));
    assert!(err.is_encode_constraint());

    let transport = CannedTransport::new(Bytes::new());
    let client = RpcClient::new(transport, store_syntax());
    let err = client
        .invoke::<ExchangeCounters>(&oversized)
        .await
        .unwrap_err();
    assert!(matches!(err, RpcError::Ndr(NdrError::OutOfRange { .. })));
    assert_eq!(client.transport().calls.load(Ordering::Relaxed), 0);

    let at_bound = Counters::bounded(vec![1; MAX_COUNTERS as usize]);
    assert_eq!(encode_to_bytes(&at_bound).unwrap().len(), 4 + 4 * MAX_COUNTERS as usize);
}

/// Scenario C: a declared size of 10,000 with only the size field present
#[tokio::test]
async fn test_declared_size_overruns_response() {
    init_logging();

    let truncated = Bytes::from_static(&[0x10, 0x27, 0x00, 0x00]);
    let err = decode_from_bytes::<Counters>(truncated.clone()).unwrap_err();
    assert!(matches!(err, NdrError::BufferUnderflow { .. }));
    assert!(err.is_framing());

    let client = RpcClient::new(CannedTransport::new(truncated), store_syntax());
    let err = client
        .invoke::<ExchangeCounters>(&Counters::bounded(vec![1]))
        .await
        .unwrap_err();
    match err {
        RpcError::Ndr(e) => assert!(e.is_framing(), "unexpected {:?}", e),
        other => panic!("expected a framing error, got {:?}", other),
    }
}

#[test]
fn test_declared_size_above_bound_rejected_on_decode() {
    let mut bytes = (MAX_COUNTERS + 1).to_le_bytes().to_vec();
    bytes.resize(4 + 4 * (MAX_COUNTERS as usize + 1), 0);
    let err = decode_from_bytes::<Counters>(bytes.into()).unwrap_err();
    assert!(matches!(err, NdrError::DeclaredSizeOutOfRange { .. }));
}

#[test]
fn test_huge_count_of_structures_checked_against_remaining_bytes() {
    let mut bytes = 4_000_000u32.to_le_bytes().to_vec();
    bytes.extend_from_slice(&[0; 4]);
    let err = decode_from_bytes::<ConformantArray<Pair>>(bytes.into()).unwrap_err();
    assert!(
        matches!(err, NdrError::BufferUnderflow { needed: 32_000_000, have: 4 }),
        "unexpected {:?}",
        err
    );
}

#[test]
fn test_every_truncation_fails_cleanly() {
    let request = SetValueRequest {
        handle: ContextHandle::new(0, Uuid::from_fields(0xdead, 0xbeef, 1, [2; 8])),
        name: Name::bounded("truncation"),
        kind: ValueKind::Binary,
        data: ValueData::bounded(vec![0x5a; 37]),
    };
    let bytes = encode_to_bytes(&request).unwrap();

    for len in 0..bytes.len() {
        let result = decode_from_bytes::<SetValueRequest>(bytes.slice(..len));
        assert!(result.is_err(), "prefix of {} bytes decoded", len);
    }
    assert_eq!(decode_from_bytes::<SetValueRequest>(bytes).unwrap(), request);
}

#[test]
fn test_nested_pointees_follow_declaration_order() {
    let pair = Pair {
        left: UniquePtr::new(Node {
            value: 1,
            next: UniquePtr::new(Node {
                value: 3,
                next: UniquePtr::null(),
            }),
        }),
        right: UniquePtr::new(Node {
            value: 2,
            next: UniquePtr::null(),
        }),
    };

    let bytes = encode_to_bytes(&pair).unwrap();
    assert_eq!(
        words(&bytes),
        [0x20000, 0x20004, 1, 0x20008, 2, 0, 3, 0]
    );
    assert_eq!(decode_from_bytes::<Pair>(bytes).unwrap(), pair);
}

#[test]
fn test_null_pointer_roundtrip() {
    let pair = Pair {
        left: UniquePtr::null(),
        right: UniquePtr::new(Node::default()),
    };
    let bytes = encode_to_bytes(&pair).unwrap();
    assert_eq!(words(&bytes), [0, 0x20000, 0, 0]);

    let decoded: Pair = decode_from_bytes(bytes).unwrap();
    assert!(decoded.left.as_ref().is_none());
    assert_eq!(decoded, pair);
}

/// Empty and absent nullable strings share referent 0
#[test]
fn test_empty_and_absent_strings_are_indistinguishable() {
    let empty = encode_to_bytes(&LpWStr::from("")).unwrap();
    let absent = encode_to_bytes(&LpWStr::default()).unwrap();
    assert_eq!(empty, absent);
    assert_eq!(&empty[..], &[0, 0, 0, 0]);

    let decoded: LpWStr = decode_from_bytes(absent).unwrap();
    assert_eq!(decoded.as_str(), "");

    // a unique pointer to a string keeps the two apart
    let null = encode_to_bytes(&UniquePtr::<NdrWString>::null()).unwrap();
    let to_empty = encode_to_bytes(&UniquePtr::new(NdrWString::new(""))).unwrap();
    assert_ne!(null, to_empty);
    let decoded: UniquePtr<NdrWString> = decode_from_bytes(to_empty).unwrap();
    assert_eq!(decoded.as_ref().map(|s| s.as_str()), Some(""));
}

/// Every declared selector round-trips; anything else fails
#[test]
fn test_union_selector_closure() {
    let arms = [
        ValueInfo::Basic(ValueInfoBasic {
            name: LpWStr::from("timeout"),
            kind: ValueKind::Dword,
        }),
        ValueInfo::Full(ValueInfoFull {
            name: LpWStr::from("banner"),
            kind: ValueKind::String,
            data: UniquePtr::new(ValueData::bounded(b"welcome".to_vec())),
        }),
        ValueInfo::Full(ValueInfoFull::default()),
    ];
    for info in arms {
        let response = EnumValuesResponse {
            info,
            status: Status::SUCCESS,
        };
        let bytes = encode_to_bytes(&response).unwrap();
        assert_eq!(decode_from_bytes::<EnumValuesResponse>(bytes).unwrap(), response);
    }

    for selector in [0u32, 3, 0xFFFF_FFFF] {
        let mut bytes = selector.to_le_bytes().to_vec();
        bytes.extend_from_slice(&[0; 12]);
        let err = decode_from_bytes::<EnumValuesResponse>(bytes.into()).unwrap_err();
        assert!(matches!(err, NdrError::InvalidDiscriminant(s) if s == selector));
    }
}

/// A handle read from one message re-encodes to the same 20 bytes
#[test]
fn test_context_handle_carried_verbatim() {
    let wire: Vec<u8> = (1..=20).collect();
    let handle: ContextHandle = decode_from_bytes(Bytes::from(wire.clone())).unwrap();
    let again = encode_to_bytes(&handle).unwrap();
    assert_eq!(&again[..], &wire[..]);
    assert_eq!(handle.to_bytes().to_vec(), wire);
}

#[test]
fn test_trailing_garbage_rejected() {
    let mut bytes = encode_to_bytes(&Counters::bounded(vec![1, 2])).unwrap().to_vec();
    bytes.extend_from_slice(&[0xEE; 8]);
    let err = decode_from_bytes::<Counters>(bytes.into()).unwrap_err();
    assert!(matches!(err, NdrError::TrailingData(8)));
}
