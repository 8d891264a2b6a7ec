// ABOUTME: Byte-level scenarios for small/large containers, including the two historical defects.
// ABOUTME: Large arrays must use 4-byte fields; object key offsets are relative to their container.

mod common;

use common::{encode, Node};
use mysql_jsonb::{decode, decode_with_config, jsonb, DecoderConfig, Error, Value};

fn large_array_42_true() -> Vec<u8> {
    let mut buf = vec![0x03];
    buf.extend_from_slice(&2u32.to_le_bytes());
    buf.extend_from_slice(&18u32.to_le_bytes()); // 8 header + 2 * 5 entries
    buf.push(0x05);
    buf.extend_from_slice(&42i16.to_le_bytes());
    buf.extend_from_slice(&[0, 0]);
    buf.push(0x04);
    buf.extend_from_slice(&1u32.to_le_bytes());
    buf
}

#[test]
fn large_array_uses_wide_fields() {
    let data = large_array_42_true();
    let value = decode(&data, data.len()).unwrap();
    assert_eq!(value, Value::Array(vec![Value::Int(42), Value::Bool(true)]));
}

#[test]
fn large_array_not_read_as_small() {
    // Same bytes with the tag flipped to SMALL_ARRAY: the 2-byte count is 2 but the
    // 2-byte size is 0, so the small reading cannot hold its entries.
    let mut data = large_array_42_true();
    data[0] = 0x02;
    assert!(matches!(
        decode(&data, data.len()),
        Err(Error::InconsistentContainerSize { .. })
    ));
}

#[test]
fn large_object_key_offsets_are_container_relative() {
    let mut buf = vec![0x01];
    buf.extend_from_slice(&2u32.to_le_bytes());
    buf.extend_from_slice(&37u32.to_le_bytes());
    // key entries: offsets count from the tag byte
    buf.extend_from_slice(&31u32.to_le_bytes());
    buf.extend_from_slice(&4u16.to_le_bytes());
    buf.extend_from_slice(&35u32.to_le_bytes());
    buf.extend_from_slice(&3u16.to_le_bytes());
    // value entries
    buf.push(0x05);
    buf.extend_from_slice(&100i16.to_le_bytes());
    buf.extend_from_slice(&[0, 0]);
    buf.push(0x04);
    buf.extend_from_slice(&2u32.to_le_bytes());
    buf.extend_from_slice(b"nameage");

    let value = decode(&buf, buf.len()).unwrap();
    assert_eq!(value, jsonb!({"name": 100, "age": false}));
}

#[test]
fn nested_object_keys_resolve_against_nested_start() {
    // The nested object sits after a string; its key offsets only make sense
    // relative to its own tag byte.
    let doc = Node::Array(vec![
        Node::Str("padding before the object".into()),
        Node::Object(vec![
            ("alpha".into(), Node::Int16(1)),
            ("beta".into(), Node::Str("two".into())),
        ]),
    ]);
    for large in [false, true] {
        let data = encode(&doc, large);
        assert_eq!(
            decode(&data, data.len()).unwrap(),
            jsonb!(["padding before the object", {"alpha": 1, "beta": "two"}])
        );
    }
}

#[test]
fn moving_key_bytes_only_matters_through_offset() {
    let doc = Node::Object(vec![("k".into(), Node::Int16(7)), ("m".into(), Node::Int16(8))]);
    let mut data = encode(&doc, false);
    // Keys live at 19 ("k") and 20 ("m"); swap the bytes and the offsets together.
    assert_eq!(&data[19..21], b"km");
    data.swap(19, 20);
    data[5..7].copy_from_slice(&20u16.to_le_bytes());
    data[9..11].copy_from_slice(&19u16.to_le_bytes());
    assert_eq!(decode(&data, data.len()).unwrap(), jsonb!({"k": 7, "m": 8}));
}

#[test]
fn small_array_single_int16() {
    let data = [0x02, 0x01, 0x00, 0x07, 0x00, 0x05, 0x7b, 0x00];
    assert_eq!(decode(&data, data.len()).unwrap(), jsonb!([123]));
}

#[test]
fn empty_large_array() {
    let mut data = vec![0x03];
    data.extend_from_slice(&0u32.to_le_bytes());
    data.extend_from_slice(&8u32.to_le_bytes());
    assert_eq!(decode(&data, data.len()).unwrap(), Value::Array(vec![]));
}

#[test]
fn empty_containers_read_nothing_past_header() {
    // Trailing garbage after an empty container's header is ignored.
    let data = [0x00, 0x00, 0x00, 0x04, 0x00, 0xff, 0xff];
    assert_eq!(decode(&data, data.len()).unwrap(), jsonb!({}));
}

#[test]
fn buffer_shorter_than_header_claims() {
    let data = large_array_42_true();
    assert_eq!(decode(&data, data.len() - 3), Err(Error::TruncatedData));
    assert_eq!(decode(&data[..10], 10), Err(Error::TruncatedData));
    assert_eq!(decode(&data, 0), Err(Error::TruncatedData));
}

#[test]
fn missing_trailing_byte_is_truncation() {
    // The last byte is part of the container's declared extent even when no entry reads it.
    let data = [0x02, 0x01, 0x00, 0x08, 0x00, 0x05, 0x7b, 0x00];
    assert_eq!(decode(&data, data.len()), Err(Error::TruncatedData));

    let mut padded = data.to_vec();
    padded.push(0x00);
    assert_eq!(decode(&padded, padded.len()).unwrap(), jsonb!([123]));

    for large in [false, true] {
        let full = encode(&Node::Object(vec![("k".into(), Node::Null)]), large);
        assert!(decode(&full, full.len()).is_ok());
        assert_eq!(decode(&full, full.len() - 1), Err(Error::TruncatedData));
    }
}

#[test]
fn shared_offsets_cannot_multiply_work() {
    // Each level is a small array whose two entries both reference the next level.
    let mut data = vec![0x02, 0x00, 0x00, 0x04, 0x00];
    for _ in 0..64 {
        let size = ((10 + data.len()) as u16).to_le_bytes();
        let mut parent = vec![0x02, 0x02, 0x00, size[0], size[1]];
        parent.extend_from_slice(&[0x02, 0x0b, 0x00, 0x02, 0x0b, 0x00]);
        parent.extend(data);
        data = parent;
    }
    assert_eq!(decode(&data, data.len()), Err(Error::TooManyValues));
}

#[test]
fn declared_length_may_exceed_physical_buffer() {
    let data = large_array_42_true();
    assert_eq!(decode(&data[..12], 64), Err(Error::TruncatedData));
}

#[test]
fn mixed_scalars_in_both_size_classes() {
    let doc = Node::Object(vec![
        ("null".into(), Node::Null),
        ("i16".into(), Node::Int16(-300)),
        ("u16".into(), Node::UInt16(65000)),
        ("i32".into(), Node::Int32(-70000)),
        ("u32".into(), Node::UInt32(4_000_000_000)),
        ("i64".into(), Node::Int64(-(1 << 40))),
        ("u64".into(), Node::UInt64(u64::MAX)),
        ("f64".into(), Node::Double(-0.125)),
        ("str".into(), Node::Str("héllo".into())),
        ("list".into(), Node::Array(vec![Node::Bool(true), Node::Bool(false)])),
    ]);
    for large in [false, true] {
        let data = encode(&doc, large);
        let value = decode(&data, data.len()).unwrap();
        assert_eq!(value, doc.expected(), "large = {large}");
        assert_eq!(
            value.to_string(),
            r#"{"null": null, "i16": -300, "u16": 65000, "i32": -70000, "u32": 4000000000, "i64": -1099511627776, "u64": 18446744073709551615, "f64": -0.125, "str": "héllo", "list": [true, false]}"#
        );
    }
}

#[test]
fn long_string_uses_multi_byte_length() {
    let text = "x".repeat(300);
    let doc = Node::Array(vec![Node::Str(text.clone())]);
    let data = encode(&doc, false);
    assert_eq!(decode(&data, data.len()).unwrap(), Value::Array(vec![Value::String(text)]));
}

#[test]
fn deep_nesting_hits_depth_limit() {
    let mut doc = Node::Int16(0);
    for _ in 0..5 {
        doc = Node::Array(vec![doc]);
    }
    let data = encode(&doc, false);
    assert!(decode(&data, data.len()).is_ok());

    let config = DecoderConfig {
        max_depth: 4,
        ..DecoderConfig::default()
    };
    assert_eq!(
        decode_with_config(&data, data.len(), config),
        Err(Error::MaxDepthExceeded)
    );
}

#[test]
fn unknown_tag_inside_container() {
    let mut data = encode(&Node::Array(vec![Node::Int16(1)]), false);
    data[5] = 0x0e;
    assert_eq!(decode(&data, data.len()), Err(Error::UnknownTypeTag(0x0e)));
}

#[test]
fn invalid_literal_inside_large_container() {
    let mut data = encode(&Node::Array(vec![Node::Null]), true);
    data[10] = 0x09;
    assert_eq!(decode(&data, data.len()), Err(Error::InvalidLiteral(9)));
}

#[test]
fn invalid_utf8_string_value() {
    let mut data = encode(&Node::Array(vec![Node::Str("ab".into())]), false);
    let last = data.len() - 1;
    data[last] = 0xff;
    assert_eq!(decode(&data, data.len()), Err(Error::InvalidEncoding));
}
