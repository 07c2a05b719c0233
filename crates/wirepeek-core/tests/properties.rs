//! Property tests for the decode / encode pipeline.

use proptest::prelude::*;
use wirepeek_core::wire::encode_varint;
use wirepeek_core::{decode, decode_records, encode, Cursor, DisplayMapping, DisplayValue, WireType};

fn display_value() -> impl Strategy<Value = DisplayValue> {
    prop_oneof![
        any::<u64>().prop_map(|v| DisplayValue::Scalar(WireType::Varint, v)),
        any::<u32>().prop_map(|v| DisplayValue::Scalar(WireType::Fixed32, u64::from(v))),
        any::<u64>().prop_map(|v| DisplayValue::Scalar(WireType::Fixed64, v)),
        // '#' carries wire type 3, so these never decode as nested messages
        "[a-z ]{0,40}".prop_map(|s| DisplayValue::Text(format!("#{}", s))),
    ]
}

fn display_mapping() -> impl Strategy<Value = DisplayMapping> {
    proptest::collection::vec((1u64..2000, display_value()), 0..24)
        .prop_map(|fields| fields.into_iter().collect())
}

proptest! {
    #[test]
    fn varint_round_trip(value in any::<u64>()) {
        let mut buf = Vec::new();
        encode_varint(value, &mut buf);

        let mut cursor = Cursor::new(&buf);
        prop_assert_eq!(cursor.read_varint().unwrap(), value);
        prop_assert_eq!(cursor.remaining(), 0);
    }

    #[test]
    fn records_and_leftover_cover_input(data in proptest::collection::vec(any::<u8>(), 0..512)) {
        let result = decode_records(&data);

        let header = if result.frame_len.is_some() { 5 } else { 0 };
        prop_assert_eq!(result.consumed_len() + header, data.len());

        let mut expected_start = header;
        for record in &result.records {
            prop_assert_eq!(record.range.start, expected_start);
            prop_assert!(record.range.end > record.range.start);
            expected_start = record.range.end;
        }
        prop_assert_eq!(&data[expected_start..], result.leftover);

        // Classification is total as well
        let _ = decode(&data);
    }

    #[test]
    fn well_formed_buffers_round_trip(mapping in display_mapping()) {
        let bytes = encode(&mapping).unwrap();

        let result = decode_records(&bytes);
        prop_assert!(result.is_complete());

        let decoded = decode(&bytes);
        prop_assert_eq!(&decoded, &mapping);
        prop_assert_eq!(encode(&decoded).unwrap(), bytes);
    }

    #[test]
    fn truncation_keeps_complete_records(
        texts in proptest::collection::vec((1u64..16, "[a-z]{1,60}"), 1..8),
        cut_seed in any::<usize>(),
    ) {
        let mapping: DisplayMapping = texts
            .into_iter()
            .map(|(field, text)| (field, DisplayValue::Text(text)))
            .collect();
        let bytes = encode(&mapping).unwrap();
        let full = decode_records(&bytes);
        let last = full.records.last().unwrap().clone();

        let cut = 1 + cut_seed % (last.encoded_len() - 1);
        let truncated = &bytes[..bytes.len() - cut];
        let result = decode_records(truncated);

        prop_assert_eq!(&result.records[..], &full.records[..full.records.len() - 1]);
        prop_assert_eq!(result.leftover, &bytes[last.range.start..bytes.len() - cut]);
    }
}
