//! Decoding real protobuf messages produced by prost and encoding them back.

use bytes::Bytes;
use pretty_assertions::assert_eq;
use prost::Message;
use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::{DescriptorProto, FieldDescriptorProto, FileDescriptorProto};
use wirepeek_core::{decode, decode_records, encode, DisplayValue, FieldSlot, WireType};

#[derive(Clone, PartialEq, Message)]
struct LoginKick {
    #[prost(uint64, tag = "1")]
    code: u64,
    #[prost(string, tag = "2")]
    reason: String,
}

#[derive(Clone, PartialEq, Message)]
struct Inner {
    #[prost(int64, tag = "1")]
    id: i64,
    #[prost(string, tag = "2")]
    label: String,
}

#[derive(Clone, PartialEq, Message)]
struct Telemetry {
    #[prost(uint32, tag = "1")]
    sequence: u32,
    #[prost(fixed32, tag = "2")]
    flags: u32,
    #[prost(fixed64, tag = "3")]
    timestamp: u64,
    #[prost(uint32, repeated, packed = "false", tag = "4")]
    samples: Vec<u32>,
    #[prost(message, optional, tag = "5")]
    inner: Option<Inner>,
    #[prost(bytes = "vec", tag = "6")]
    blob: Vec<u8>,
}

#[test]
fn test_login_kick_matches_reference_bytes() {
    let message = LoginKick {
        code: 12100,
        reason: "已在其他地方登录".to_owned(),
    };
    let bytes = message.encode_to_vec();
    assert_eq!(
        hex::encode(&bytes),
        "08c45e1218e5b7b2e59ca8e585b6e4bb96e59cb0e696b9e799bbe5bd95"
    );

    let mapping = decode(&bytes);
    assert_eq!(
        mapping.get_one(1),
        Some(&DisplayValue::Scalar(WireType::Varint, 12100))
    );
    assert_eq!(
        mapping.get_one(2).and_then(DisplayValue::as_text),
        Some("已在其他地方登录")
    );
    assert_eq!(encode(&mapping).unwrap(), bytes);
}

#[test]
fn test_telemetry_round_trip() {
    let message = Telemetry {
        sequence: 42,
        flags: 0x3F80_0000,
        timestamp: u64::MAX,
        samples: vec![1, 300, 2],
        inner: Some(Inner {
            id: 7,
            label: "hey".to_owned(),
        }),
        blob: vec![0xFF, 0x00, 0xFE],
    };
    let bytes = message.encode_to_vec();

    let records = decode_records(&bytes);
    assert!(records.is_complete());
    assert_eq!(records.records.len(), 8);

    let mapping = decode(&bytes);
    assert_eq!(
        mapping.get_one(2),
        Some(&DisplayValue::Scalar(WireType::Fixed32, 0x3F80_0000))
    );
    assert_eq!(
        mapping.get_one(3),
        Some(&DisplayValue::Scalar(WireType::Fixed64, u64::MAX))
    );
    assert_eq!(
        mapping.get(4),
        Some(&FieldSlot::Repeated(vec![
            DisplayValue::Scalar(WireType::Varint, 1),
            DisplayValue::Scalar(WireType::Varint, 300),
            DisplayValue::Scalar(WireType::Varint, 2),
        ]))
    );

    let inner = mapping.get_one(5).and_then(DisplayValue::as_nested).unwrap();
    assert_eq!(inner.get_one(1).and_then(DisplayValue::as_scalar), Some(7));
    assert_eq!(inner.get_one(2).and_then(DisplayValue::as_text), Some("hey"));

    assert_eq!(
        mapping.get_one(6),
        Some(&DisplayValue::RawBytes(Bytes::from_static(&[0xFF, 0x00, 0xFE])))
    );

    let encoded = encode(&mapping).unwrap();
    assert_eq!(encoded, bytes);
    assert_eq!(Telemetry::decode(encoded.as_slice()).unwrap(), message);
}

fn field(name: &str, number: i32, kind: Type) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_owned()),
        number: Some(number),
        label: Some(Label::Optional as i32),
        r#type: Some(kind as i32),
        ..Default::default()
    }
}

#[test]
fn test_file_descriptor_round_trip() {
    let descriptor = FileDescriptorProto {
        name: Some("demo.proto".to_owned()),
        package: Some("demo".to_owned()),
        message_type: vec![DescriptorProto {
            name: Some("Ping".to_owned()),
            field: vec![field("id", 1, Type::Uint64), field("name", 2, Type::String)],
            ..Default::default()
        }],
        syntax: Some("proto3".to_owned()),
        ..Default::default()
    };
    let bytes = descriptor.encode_to_vec();

    let mapping = decode(&bytes);
    assert_eq!(
        mapping.get_one(1).and_then(DisplayValue::as_text),
        Some("demo.proto")
    );
    assert_eq!(mapping.get_one(2).and_then(DisplayValue::as_text), Some("demo"));
    assert_eq!(
        mapping.get_one(12).and_then(DisplayValue::as_text),
        Some("proto3")
    );

    let message = mapping.get_one(4).and_then(DisplayValue::as_nested).unwrap();
    assert_eq!(message.get_one(1).and_then(DisplayValue::as_text), Some("Ping"));

    let fields = message.values(2);
    assert_eq!(fields.len(), 2);
    let id = fields[0].as_nested().unwrap();
    assert_eq!(id.get_one(1).and_then(DisplayValue::as_text), Some("id"));
    assert_eq!(id.get_one(3).and_then(DisplayValue::as_scalar), Some(1));
    assert_eq!(
        id.get_one(5).and_then(DisplayValue::as_scalar),
        Some(Type::Uint64 as u64)
    );

    let encoded = encode(&mapping).unwrap();
    assert_eq!(encoded, bytes);
    assert_eq!(FileDescriptorProto::decode(encoded.as_slice()).unwrap(), descriptor);
}

#[test]
fn test_truncated_message_degrades_gracefully() {
    let message = LoginKick {
        code: 12100,
        reason: "已在其他地方登录".to_owned(),
    };
    let bytes = message.encode_to_vec();

    for cut in 1..26 {
        let truncated = &bytes[..bytes.len() - cut];
        let result = decode_records(truncated);
        assert_eq!(result.records.len(), 1, "cut {}", cut);
        assert_eq!(result.leftover, &bytes[3..bytes.len() - cut], "cut {}", cut);

        let mapping = decode(truncated);
        assert_eq!(mapping.len(), 1);
    }
}
